//! StartPreparing command handler
//!
//! Kitchen picks up items. Without explicit ids every confirmed line of the
//! session moves to `preparing`.

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, ItemStatus, SessionEvent};

/// StartPreparing action
#[derive(Debug, Clone)]
pub struct StartPreparingAction {
    pub session_id: String,
    pub item_ids: Option<Vec<String>>,
}

#[async_trait]
impl CommandHandler for StartPreparingAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        if !metadata.role.can_cook() {
            return Err(SessionError::PermissionDenied(format!(
                "{} cannot start preparing",
                metadata.role
            )));
        }

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;

        let item_ids: Vec<String> = match &self.item_ids {
            None => snapshot
                .items_with_status(ItemStatus::Confirmed)
                .map(|i| i.id.clone())
                .collect(),
            Some(ids) => {
                let mut selected: Vec<String> = Vec::with_capacity(ids.len());
                for id in ids {
                    if selected.contains(id) {
                        continue;
                    }
                    let item = snapshot
                        .find_item(id)
                        .ok_or_else(|| SessionError::ItemNotFound(id.clone()))?;
                    item.status.transition(ItemStatus::Preparing)?;
                    selected.push(id.clone());
                }
                selected
            }
        };

        if item_ids.is_empty() {
            return Ok(vec![]);
        }

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &self.session_id,
            EventPayload::ItemsPreparing { item_ids },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::storage::SessionStorage;
    use crate::sessions::test_support::*;
    use rust_decimal_macros::dec;
    use shared::session::Role;

    fn storage() -> SessionStorage {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(
            &storage,
            &[active_session(
                "s-1",
                "T1",
                vec![
                    item("i-1", 1, dec!(10.00), ItemStatus::Confirmed),
                    item("i-2", 1, dec!(10.00), ItemStatus::Pending),
                    item("i-3", 1, dec!(10.00), ItemStatus::Served),
                ],
            )],
        );
        storage
    }

    fn prepared_ids(events: &[SessionEvent]) -> Vec<String> {
        match &events[0].payload {
            EventPayload::ItemsPreparing { item_ids } => item_ids.clone(),
            _ => panic!("Expected ItemsPreparing"),
        }
    }

    #[tokio::test]
    async fn test_all_confirmed_by_default() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = StartPreparingAction {
            session_id: "s-1".to_string(),
            item_ids: None,
        };
        let events = action
            .execute(&mut ctx, &metadata(Role::Kitchen))
            .await
            .unwrap();
        assert_eq!(prepared_ids(&events), vec!["i-1".to_string()]);
    }

    #[tokio::test]
    async fn test_explicit_pending_item_may_skip_confirmation() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = StartPreparingAction {
            session_id: "s-1".to_string(),
            item_ids: Some(vec!["i-2".to_string(), "i-2".to_string()]),
        };
        let events = action
            .execute(&mut ctx, &metadata(Role::Kitchen))
            .await
            .unwrap();
        assert_eq!(prepared_ids(&events), vec!["i-2".to_string()]);
    }

    #[tokio::test]
    async fn test_served_item_cannot_go_back() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = StartPreparingAction {
            session_id: "s-1".to_string(),
            item_ids: Some(vec!["i-1".to_string(), "i-3".to_string()]),
        };
        let result = action.execute(&mut ctx, &metadata(Role::Kitchen)).await;
        assert!(matches!(result, Err(SessionError::IllegalTransition(_))));
    }

    #[tokio::test]
    async fn test_waiter_cannot_start_preparing() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = StartPreparingAction {
            session_id: "s-1".to_string(),
            item_ids: None,
        };
        let result = action.execute(&mut ctx, &metadata(Role::Waiter)).await;
        assert!(matches!(result, Err(SessionError::PermissionDenied(_))));
    }
}
