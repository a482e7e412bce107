//! ItemVoided event applier
//!
//! A full void moves the line to `voided`; a partial void lowers the
//! quantity and accumulates `voided_quantity`. The reason is kept on the
//! line for audit either way.

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, ItemStatus, SessionEvent, SessionSnapshot};

/// ItemVoided applier
pub struct ItemVoidedApplier;

impl EventApplier for ItemVoidedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::ItemVoided {
            item_id,
            quantity,
            reason,
            full,
        } = &event.payload
        {
            if let Some(item) = snapshot.find_item_mut(item_id)
                && !item.status.is_terminal()
            {
                if *full {
                    item.status = ItemStatus::Voided;
                    item.voided_quantity += item.quantity;
                } else {
                    let quantity = (*quantity).min(item.quantity);
                    item.quantity -= quantity;
                    item.voided_quantity += quantity;
                }
                item.void_reason = Some(reason.clone());
                item.updated_at = event.timestamp;
            }

            finish(snapshot, event);
        }
    }
}
