//! ItemRemoved event applier
//!
//! Removal is only ever emitted for lines that never reached the kitchen,
//! so the row is physically dropped (there is nothing to audit).

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, SessionEvent, SessionSnapshot};

/// ItemRemoved applier
pub struct ItemRemovedApplier;

impl EventApplier for ItemRemovedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::ItemRemoved { item_id } = &event.payload {
            snapshot.items.retain(|i| &i.id != item_id);
            finish(snapshot, event);
        }
    }
}
