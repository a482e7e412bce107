//! ItemQuantityChanged event applier

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, SessionEvent, SessionSnapshot};

/// ItemQuantityChanged applier
pub struct ItemQuantityChangedApplier;

impl EventApplier for ItemQuantityChangedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::ItemQuantityChanged { item_id, to, .. } = &event.payload {
            if let Some(item) = snapshot.find_item_mut(item_id)
                && !item.status.is_terminal()
            {
                item.quantity = *to;
                item.updated_at = event.timestamp;
            }

            finish(snapshot, event);
        }
    }
}
