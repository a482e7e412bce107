//! ConfirmPending command handler
//!
//! Bulk `pending → confirmed`: the waiter acknowledges everything the table
//! has sent and queues it for the kitchen.

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, ItemStatus, SessionEvent};

/// ConfirmPending action
#[derive(Debug, Clone)]
pub struct ConfirmPendingAction {
    pub session_id: String,
}

#[async_trait]
impl CommandHandler for ConfirmPendingAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        if !metadata.role.can_confirm() {
            return Err(SessionError::PermissionDenied(format!(
                "{} cannot confirm items",
                metadata.role
            )));
        }

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;
        let item_ids: Vec<String> = snapshot
            .items_with_status(ItemStatus::Pending)
            .map(|i| i.id.clone())
            .collect();

        if item_ids.is_empty() {
            return Ok(vec![]);
        }

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &self.session_id,
            EventPayload::ItemsConfirmed { item_ids },
        );

        Ok(vec![event])
    }
}
