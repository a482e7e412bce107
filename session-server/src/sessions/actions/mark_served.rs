//! MarkServed command handler

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, ItemStatus, SessionEvent};

/// MarkServed action
#[derive(Debug, Clone)]
pub struct MarkServedAction {
    pub session_id: String,
    pub item_id: String,
}

#[async_trait]
impl CommandHandler for MarkServedAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        if !metadata.role.can_cook() {
            return Err(SessionError::PermissionDenied(format!(
                "{} cannot mark items served",
                metadata.role
            )));
        }

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;
        let item = snapshot
            .find_item(&self.item_id)
            .ok_or_else(|| SessionError::ItemNotFound(self.item_id.clone()))?;
        item.status.transition(ItemStatus::Served)?;

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &self.session_id,
            EventPayload::ItemServed {
                item_id: self.item_id.clone(),
            },
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

    fn serve() -> MarkServedAction {
        MarkServedAction {
            session_id: "s-1".to_string(),
            item_id: "i-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_serve_preparing_item() {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(
            &storage,
            &[active_session(
                "s-1",
                "T1",
                vec![item("i-1", 1, dec!(10.00), ItemStatus::Preparing)],
            )],
        );
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let events = serve()
            .execute(&mut ctx, &metadata(Role::Kitchen))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_item_cannot_skip_preparing() {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(
            &storage,
            &[active_session(
                "s-1",
                "T1",
                vec![item("i-1", 1, dec!(10.00), ItemStatus::Confirmed)],
            )],
        );
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let result = serve().execute(&mut ctx, &metadata(Role::Admin)).await;
        match result {
            Err(SessionError::IllegalTransition(t)) => {
                assert_eq!(t.from, ItemStatus::Confirmed);
                assert_eq!(t.to, ItemStatus::Served);
            }
            other => panic!("Expected IllegalTransition, got {:?}", other),
        }
    }
}
