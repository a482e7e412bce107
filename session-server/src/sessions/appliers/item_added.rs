//! ItemAdded event applier

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, SessionEvent, SessionSnapshot};

/// ItemAdded applier
pub struct ItemAddedApplier;

impl EventApplier for ItemAddedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::ItemAdded { item } = &event.payload {
            // Replay safety: never duplicate a line
            if snapshot.find_item(&item.id).is_none() {
                snapshot.items.push(item.clone());
            }

            finish(snapshot, event);
        }
    }
}
