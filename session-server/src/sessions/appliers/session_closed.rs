//! SessionClosed event applier
//!
//! Closes the session and cancels the unsent lines listed in the event.
//! Closing frees the table for a new session.

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, ItemStatus, SessionEvent, SessionSnapshot, SessionStatus};

/// SessionClosed applier
pub struct SessionClosedApplier;

impl EventApplier for SessionClosedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::SessionClosed {
            reason,
            cancelled_item_ids,
            ..
        } = &event.payload
        {
            for item in snapshot
                .items
                .iter_mut()
                .filter(|i| cancelled_item_ids.contains(&i.id))
            {
                if item.status.can_transition(ItemStatus::Cancelled) {
                    item.status = ItemStatus::Cancelled;
                    item.updated_at = event.timestamp;
                }
            }

            snapshot.status = SessionStatus::Closed;
            snapshot.close_reason = Some(*reason);
            snapshot.closed_at = Some(event.timestamp);

            finish(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::*;
    use rust_decimal_macros::dec;
    use shared::session::CloseReason;

    #[test]
    fn test_close_cancels_listed_lines_only() {
        let mut snapshot = active_session(
            "s-1",
            "T1",
            vec![
                item("d-1", 1, dec!(3.00), ItemStatus::Draft),
                item("p-1", 1, dec!(4.00), ItemStatus::Pending),
                item("sv-1", 1, dec!(5.00), ItemStatus::Served),
            ],
        );

        SessionClosedApplier.apply(
            &mut snapshot,
            &event(
                5,
                "s-1",
                EventPayload::SessionClosed {
                    reason: CloseReason::StaffOverride,
                    cancelled_item_ids: vec!["d-1".to_string(), "p-1".to_string()],
                    note: Some("walked out".to_string()),
                },
            ),
        );

        assert!(!snapshot.is_active());
        assert_eq!(snapshot.close_reason, Some(CloseReason::StaffOverride));
        assert!(snapshot.closed_at.is_some());
        assert_eq!(snapshot.items[0].status, ItemStatus::Cancelled);
        assert_eq!(snapshot.items[1].status, ItemStatus::Cancelled);
        assert_eq!(snapshot.items[2].status, ItemStatus::Served);
        // Cancelled lines leave the total, audit rows stay
        assert_eq!(snapshot.bill.total_amount, dec!(5.00));
        assert_eq!(snapshot.items.len(), 3);
    }
}
