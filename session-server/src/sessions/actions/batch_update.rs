//! BatchUpdate command handler
//!
//! Several quantity/removal changes evaluated as a whole and applied in one
//! transaction. Reductions of lines that already reached the kitchen become
//! voids, and one shared reason covers all of them: if any change needs the
//! void path and no reason is given, the whole batch is rejected.

use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::update_quantity::check_edit_permission;
use crate::sessions::money::{self, MAX_BATCH_CHANGES};
use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, ItemChange, SessionEvent};

/// BatchUpdate action
#[derive(Debug, Clone)]
pub struct BatchUpdateAction {
    pub session_id: String,
    pub changes: Vec<ItemChange>,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for BatchUpdateAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        // 1. Shape checks
        if self.changes.len() > MAX_BATCH_CHANGES {
            return Err(SessionError::BatchTooLarge(self.changes.len()));
        }
        let mut seen = HashSet::new();
        for change in &self.changes {
            if !seen.insert(change.item_id.as_str()) {
                return Err(SessionError::InvalidOperation(format!(
                    "item {} appears more than once in the batch",
                    change.item_id
                )));
            }
            if change.quantity != 0 {
                money::validate_quantity(change.quantity)?;
            }
        }

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;
        let reason = self
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        // 2. Evaluate every change before emitting anything
        let mut payloads = Vec::with_capacity(self.changes.len());
        let mut reduction = Decimal::ZERO;
        for change in &self.changes {
            let item = snapshot
                .find_item(&change.item_id)
                .ok_or_else(|| SessionError::ItemNotFound(change.item_id.clone()))?;
            check_edit_permission(item, metadata)?;

            if change.quantity == item.quantity {
                continue;
            }
            reduction += money::line_reduction(item, change.quantity);

            let reduces = change.quantity < item.quantity;
            if reduces && item.status.requires_void() {
                metadata.require_staff()?;
                let reason = reason.ok_or(SessionError::VoidReasonRequired)?;
                let quantity = item.quantity - change.quantity;
                payloads.push(EventPayload::ItemVoided {
                    item_id: item.id.clone(),
                    quantity,
                    reason: reason.to_string(),
                    full: change.quantity == 0,
                });
            } else if change.quantity == 0 {
                payloads.push(EventPayload::ItemRemoved {
                    item_id: item.id.clone(),
                });
            } else {
                payloads.push(EventPayload::ItemQuantityChanged {
                    item_id: item.id.clone(),
                    from: item.quantity,
                    to: change.quantity,
                });
            }
        }

        // The batch is judged by its net effect on the bill
        money::ensure_covers_paid(&snapshot, reduction)?;

        // 3. One event per effective change, consecutive sequences
        let events = payloads
            .into_iter()
            .map(|payload| {
                let seq = ctx.next_sequence();
                metadata.event(seq, &self.session_id, payload)
            })
            .collect();

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::storage::SessionStorage;
    use crate::sessions::test_support::*;
    use rust_decimal_macros::dec;
    use shared::session::{ItemStatus, Role};

    fn change(item_id: &str, quantity: i32) -> ItemChange {
        ItemChange {
            item_id: item_id.to_string(),
            quantity,
        }
    }

    fn storage() -> SessionStorage {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(
            &storage,
            &[active_session(
                "s-1",
                "T1",
                vec![
                    item("p-1", 2, dec!(10.00), ItemStatus::Pending),
                    item("c-1", 3, dec!(5.00), ItemStatus::Confirmed),
                    item("sv-1", 1, dec!(7.00), ItemStatus::Served),
                ],
            )],
        );
        storage
    }

    #[tokio::test]
    async fn test_pending_only_batch_needs_no_reason() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = BatchUpdateAction {
            session_id: "s-1".to_string(),
            changes: vec![change("p-1", 0)],
            reason: None,
        };
        let events = action
            .execute(&mut ctx, &metadata(Role::Waiter))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].payload, EventPayload::ItemRemoved { .. }));
    }

    #[tokio::test]
    async fn test_any_reduction_after_confirmation_rejects_whole_batch() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = BatchUpdateAction {
            session_id: "s-1".to_string(),
            changes: vec![change("p-1", 5), change("c-1", 1)],
            reason: None,
        };
        let result = action.execute(&mut ctx, &metadata(Role::Waiter)).await;
        assert!(matches!(result, Err(SessionError::VoidReasonRequired)));
        assert_eq!(ctx.current_sequence(), 0);
    }

    #[tokio::test]
    async fn test_mixed_batch_with_shared_reason() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 10);

        let action = BatchUpdateAction {
            session_id: "s-1".to_string(),
            changes: vec![change("p-1", 1), change("c-1", 1), change("sv-1", 0)],
            reason: Some("table changed order".to_string()),
        };
        let events = action
            .execute(&mut ctx, &metadata(Role::Waiter))
            .await
            .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(
            events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![11, 12, 13]
        );
        assert!(matches!(
            events[0].payload,
            EventPayload::ItemQuantityChanged { from: 2, to: 1, .. }
        ));
        assert!(matches!(
            events[1].payload,
            EventPayload::ItemVoided {
                quantity: 2,
                full: false,
                ..
            }
        ));
        assert!(matches!(
            events[2].payload,
            EventPayload::ItemVoided {
                quantity: 1,
                full: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_batch_limits() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let too_big = BatchUpdateAction {
            session_id: "s-1".to_string(),
            changes: (0..=MAX_BATCH_CHANGES)
                .map(|n| change(&format!("x-{n}"), 1))
                .collect(),
            reason: None,
        };
        let result = too_big.execute(&mut ctx, &metadata(Role::Waiter)).await;
        assert!(matches!(result, Err(SessionError::BatchTooLarge(51))));

        let duplicate = BatchUpdateAction {
            session_id: "s-1".to_string(),
            changes: vec![change("p-1", 1), change("p-1", 3)],
            reason: None,
        };
        let result = duplicate.execute(&mut ctx, &metadata(Role::Waiter)).await;
        assert!(matches!(result, Err(SessionError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_unknown_item_rejects_batch() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = BatchUpdateAction {
            session_id: "s-1".to_string(),
            changes: vec![change("p-1", 1), change("ghost", 1)],
            reason: None,
        };
        let result = action.execute(&mut ctx, &metadata(Role::Waiter)).await;
        assert!(matches!(result, Err(SessionError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_batch_net_effect_checked_against_paid() {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(
            &storage,
            &[paid_session(
                "s-1",
                "T1",
                vec![
                    item("p-1", 2, dec!(10.00), ItemStatus::Pending),
                    item("c-1", 3, dec!(5.00), ItemStatus::Confirmed),
                ],
                dec!(30.00),
            )],
        );
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        // 35 -> 15 with 30 paid
        let shrink = BatchUpdateAction {
            session_id: "s-1".to_string(),
            changes: vec![change("p-1", 0)],
            reason: None,
        };
        let result = shrink.execute(&mut ctx, &metadata(Role::Waiter)).await;
        assert!(matches!(result, Err(SessionError::BelowPaidAmount { .. })));

        // 35 -> 30: remove a pending line while adding to a confirmed one
        let swap = BatchUpdateAction {
            session_id: "s-1".to_string(),
            changes: vec![change("p-1", 1), change("c-1", 4)],
            reason: None,
        };
        let events = swap
            .execute(&mut ctx, &metadata(Role::Waiter))
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
    }
}
