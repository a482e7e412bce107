//! Forward status appliers: submit, confirm, start preparing, serve
//!
//! Lines only move when the transition table allows it, so replaying an
//! event on a snapshot that already moved past it changes nothing.

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, ItemStatus, SessionEvent, SessionSnapshot};

fn advance(snapshot: &mut SessionSnapshot, item_ids: &[String], to: ItemStatus, at: i64) {
    for item in snapshot
        .items
        .iter_mut()
        .filter(|i| item_ids.contains(&i.id))
    {
        if let Ok(status) = item.status.transition(to) {
            item.status = status;
            item.updated_at = at;
        }
    }
}

/// DraftsSubmitted applier (draft → pending)
pub struct DraftsSubmittedApplier;

impl EventApplier for DraftsSubmittedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::DraftsSubmitted { item_ids } = &event.payload {
            advance(snapshot, item_ids, ItemStatus::Pending, event.timestamp);
            finish(snapshot, event);
        }
    }
}

/// ItemsConfirmed applier (pending → confirmed)
pub struct ItemsConfirmedApplier;

impl EventApplier for ItemsConfirmedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::ItemsConfirmed { item_ids } = &event.payload {
            advance(snapshot, item_ids, ItemStatus::Confirmed, event.timestamp);
            finish(snapshot, event);
        }
    }
}

/// ItemsPreparing applier (pending|confirmed → preparing)
pub struct ItemsPreparingApplier;

impl EventApplier for ItemsPreparingApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::ItemsPreparing { item_ids } = &event.payload {
            advance(snapshot, item_ids, ItemStatus::Preparing, event.timestamp);
            finish(snapshot, event);
        }
    }
}

/// ItemServed applier (preparing → served)
pub struct ItemServedApplier;

impl EventApplier for ItemServedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::ItemServed { item_id } = &event.payload {
            advance(
                snapshot,
                std::slice::from_ref(item_id),
                ItemStatus::Served,
                event.timestamp,
            );
            finish(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_submit_moves_drafts_into_bill() {
        let mut snapshot = active_session(
            "s-1",
            "T1",
            vec![item("d-1", 2, dec!(10.00), ItemStatus::Draft)],
        );
        assert_eq!(snapshot.bill.total_amount, dec!(0));

        DraftsSubmittedApplier.apply(
            &mut snapshot,
            &event(
                2,
                "s-1",
                EventPayload::DraftsSubmitted {
                    item_ids: vec!["d-1".to_string()],
                },
            ),
        );
        assert_eq!(snapshot.items[0].status, ItemStatus::Pending);
        assert_eq!(snapshot.bill.total_amount, dec!(20.00));
    }

    #[test]
    fn test_full_pipeline() {
        let mut snapshot = active_session(
            "s-1",
            "T1",
            vec![item("i-1", 1, dec!(10.00), ItemStatus::Pending)],
        );
        let ids = vec!["i-1".to_string()];

        ItemsConfirmedApplier.apply(
            &mut snapshot,
            &event(2, "s-1", EventPayload::ItemsConfirmed { item_ids: ids.clone() }),
        );
        assert_eq!(snapshot.items[0].status, ItemStatus::Confirmed);

        ItemsPreparingApplier.apply(
            &mut snapshot,
            &event(3, "s-1", EventPayload::ItemsPreparing { item_ids: ids }),
        );
        assert_eq!(snapshot.items[0].status, ItemStatus::Preparing);

        ItemServedApplier.apply(
            &mut snapshot,
            &event(
                4,
                "s-1",
                EventPayload::ItemServed {
                    item_id: "i-1".to_string(),
                },
            ),
        );
        assert_eq!(snapshot.items[0].status, ItemStatus::Served);
        assert_eq!(snapshot.last_sequence, 4);
    }

    #[test]
    fn test_never_moves_backwards() {
        let mut snapshot = active_session(
            "s-1",
            "T1",
            vec![item("i-1", 1, dec!(10.00), ItemStatus::Served)],
        );
        ItemsConfirmedApplier.apply(
            &mut snapshot,
            &event(
                2,
                "s-1",
                EventPayload::ItemsConfirmed {
                    item_ids: vec!["i-1".to_string()],
                },
            ),
        );
        assert_eq!(snapshot.items[0].status, ItemStatus::Served);
    }
}
