//! Billing event appliers

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, SessionEvent, SessionSnapshot};

/// BillTotalCorrected applier
///
/// The stored total is recomputed from the lines anyway; this event exists
/// so the correction is visible in the audit trail.
pub struct BillTotalCorrectedApplier;

impl EventApplier for BillTotalCorrectedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::BillTotalCorrected { corrected, .. } = &event.payload {
            snapshot.bill.total_amount = *corrected;
            finish(snapshot, event);
        }
    }
}

/// PaymentRecorded applier
pub struct PaymentRecordedApplier;

impl EventApplier for PaymentRecordedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::PaymentRecorded {
            transactions,
            allocations,
            ..
        } = &event.payload
        {
            for tx in transactions {
                if !snapshot
                    .transactions
                    .iter()
                    .any(|t| t.transaction_id == tx.transaction_id)
                {
                    snapshot.transactions.push(tx.clone());
                }
            }
            for alloc in allocations {
                if !snapshot
                    .allocations
                    .iter()
                    .any(|a| a.transaction_id == alloc.transaction_id)
                {
                    snapshot.allocations.push(alloc.clone());
                }
            }

            finish(snapshot, event);
        }
    }
}
