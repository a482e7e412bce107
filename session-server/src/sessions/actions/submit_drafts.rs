//! SubmitDrafts command handler
//!
//! Guest "send cart": draft lines become pending and visible to staff.
//! Guests submit only their own drafts; staff submit every draft.

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, ItemStatus, SessionEvent};

/// SubmitDrafts action
#[derive(Debug, Clone)]
pub struct SubmitDraftsAction {
    pub session_id: String,
}

#[async_trait]
impl CommandHandler for SubmitDraftsAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;

        let item_ids: Vec<String> = snapshot
            .items_with_status(ItemStatus::Draft)
            .filter(|i| metadata.role.is_staff() || i.created_by == metadata.operator_id)
            .map(|i| i.id.clone())
            .collect();

        if item_ids.is_empty() {
            return Ok(vec![]);
        }

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &self.session_id,
            EventPayload::DraftsSubmitted { item_ids },
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

    #[tokio::test]
    async fn test_guest_submits_only_own_drafts() {
        let storage = SessionStorage::open_in_memory().unwrap();
        let mut foreign = item("d-2", 1, dec!(4.00), ItemStatus::Draft);
        foreign.created_by = "guest-2".to_string();
        let mut own = item("d-1", 1, dec!(4.00), ItemStatus::Draft);
        own.created_by = "guest-1".to_string();
        seed(&storage, &[active_session("s-1", "T1", vec![own, foreign])]);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let action = SubmitDraftsAction {
            session_id: "s-1".to_string(),
        };
        let events = action
            .execute(&mut ctx, &metadata(Role::Guest))
            .await
            .unwrap();

        match &events[0].payload {
            EventPayload::DraftsSubmitted { item_ids } => {
                assert_eq!(item_ids, &vec!["d-1".to_string()])
            }
            _ => panic!("Expected DraftsSubmitted"),
        }
    }

    #[tokio::test]
    async fn test_nothing_to_submit_is_a_noop() {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(
            &storage,
            &[active_session(
                "s-1",
                "T1",
                vec![item("i-1", 1, dec!(4.00), ItemStatus::Pending)],
            )],
        );

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let action = SubmitDraftsAction {
            session_id: "s-1".to_string(),
        };
        let events = action
            .execute(&mut ctx, &metadata(Role::Waiter))
            .await
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(ctx.current_sequence(), 0);
    }
}
