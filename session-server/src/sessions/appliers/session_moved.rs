//! SessionMoved event applier

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, SessionEvent, SessionSnapshot};

/// SessionMoved applier
pub struct SessionMovedApplier;

impl EventApplier for SessionMovedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::SessionMoved { to_table_id, .. } = &event.payload {
            snapshot.table_id = to_table_id.clone();
            finish(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::*;
    use rust_decimal_macros::dec;
    use shared::session::ItemStatus;

    #[test]
    fn test_move_repoints_table_and_keeps_items() {
        let mut snapshot = active_session(
            "s-1",
            "A",
            vec![
                item("i-1", 1, dec!(10.00), ItemStatus::Served),
                item("i-2", 1, dec!(10.00), ItemStatus::Pending),
            ],
        );

        SessionMovedApplier.apply(
            &mut snapshot,
            &event(
                4,
                "s-1",
                EventPayload::SessionMoved {
                    from_table_id: "A".to_string(),
                    to_table_id: "B".to_string(),
                },
            ),
        );

        assert_eq!(snapshot.table_id, "B");
        assert_eq!(snapshot.items.len(), 2);
        assert!(snapshot.is_active());
    }
}
