//! SessionOpened event applier
//!
//! Initializes snapshot state for a new session.

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{Bill, EventPayload, SessionEvent, SessionSnapshot, SessionStatus};

/// SessionOpened applier
pub struct SessionOpenedApplier;

impl EventApplier for SessionOpenedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::SessionOpened { table_id, bill_id } = &event.payload {
            // Identity comes from the event (important for replay)
            snapshot.session_id = event.session_id.clone();
            snapshot.restaurant_id = event.restaurant_id.clone();
            snapshot.table_id = table_id.clone();
            snapshot.status = SessionStatus::Active;
            snapshot.bill = Bill::new(bill_id.clone());
            snapshot.created_at = event.timestamp;

            finish(snapshot, event);
        }
    }
}
