//! ProcessPayment command handler
//!
//! Validates a single or split payment against the live balance and records
//! it as immutable transactions. Emitted events, all in one transaction:
//!
//! 1. `BillTotalCorrected` when the stored total drifted from the live sum
//! 2. `PaymentRecorded` with one transaction per part
//! 3. `SessionClosed { Paid }` when the bill is now covered
//!
//! Concurrent payments on the same session are serialized by the single
//! write transaction, and the balance is re-read inside it.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::sessions::money;
use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{
    AllocationRecord, CloseReason, EventPayload, ItemStatus, MONEY_TOLERANCE, PaymentRequest,
    SessionEvent, SessionSnapshot, Transaction,
};

/// ProcessPayment action
#[derive(Debug, Clone)]
pub struct ProcessPaymentAction {
    pub session_id: String,
    pub payment: PaymentRequest,
}

impl ProcessPaymentAction {
    fn validate_allocations(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        for part in self.payment.parts() {
            for alloc in &part.allocation {
                let item = snapshot
                    .find_item(&alloc.item_id)
                    .ok_or_else(|| SessionError::ItemNotFound(alloc.item_id.clone()))?;
                if !item.status.is_billable() {
                    return Err(SessionError::InvalidOperation(format!(
                        "item {} is {} and cannot be paid for",
                        item.id, item.status
                    )));
                }
                if alloc.quantity > item.quantity {
                    return Err(SessionError::InvalidQuantity(format!(
                        "allocation of {} exceeds line quantity {}",
                        alloc.quantity, item.quantity
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for ProcessPaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        metadata.require_staff()?;
        money::validate_payment(&self.payment)?;

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;
        self.validate_allocations(&snapshot)?;

        let mut events = Vec::new();

        // 1. Stale-state: correct a drifted total before validating
        let live_total = snapshot.live_total();
        if snapshot.bill.total_amount != live_total {
            tracing::warn!(
                session_id = %self.session_id,
                stored = %snapshot.bill.total_amount,
                live = %live_total,
                "Bill total drifted, correcting before payment"
            );
            events.push(metadata.event(
                ctx.next_sequence(),
                &self.session_id,
                EventPayload::BillTotalCorrected {
                    previous: snapshot.bill.total_amount,
                    corrected: live_total,
                },
            ));
        }

        // 2. Never exceed the remaining balance
        let paid = money::sum_transactions(&snapshot);
        let remaining = (live_total - paid).max(Decimal::ZERO);
        let amount = self.payment.total();
        if amount > remaining + MONEY_TOLERANCE {
            return Err(SessionError::PaymentExceedsRemaining { amount, remaining });
        }

        // 3. Immutable transactions, one per part
        let payment_group_id = shared::util::new_id();
        let recorded_at = shared::util::now_millis();
        let mut transactions = Vec::new();
        let mut allocations = Vec::new();
        for part in self.payment.parts() {
            let transaction_id = shared::util::new_id();
            if !part.allocation.is_empty() {
                allocations.push(AllocationRecord {
                    transaction_id: transaction_id.clone(),
                    items: part.allocation.clone(),
                });
            }
            transactions.push(Transaction {
                transaction_id,
                payment_group_id: payment_group_id.clone(),
                method: part.method,
                amount: part.amount,
                recorded_by: metadata.operator_id.clone(),
                recorded_at,
            });
        }
        events.push(metadata.event(
            ctx.next_sequence(),
            &self.session_id,
            EventPayload::PaymentRecorded {
                payment_group_id,
                transactions,
                allocations,
            },
        ));

        // 4. Fully paid closes the session
        if paid + amount >= live_total - MONEY_TOLERANCE {
            let cancelled_item_ids = snapshot
                .items_with_status(ItemStatus::Draft)
                .map(|i| i.id.clone())
                .collect();
            events.push(metadata.event(
                ctx.next_sequence(),
                &self.session_id,
                EventPayload::SessionClosed {
                    reason: CloseReason::Paid,
                    cancelled_item_ids,
                    note: None,
                },
            ));
        }

        Ok(events)
    }
}
