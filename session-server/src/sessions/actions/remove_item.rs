//! RemoveItem command handler
//!
//! Plain delete without penalty, valid only for draft and pending lines.
//! Anything that reached the kitchen must go through `VoidItem`.

use async_trait::async_trait;

use super::update_quantity::check_edit_permission;
use crate::sessions::money;
use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, SessionEvent};

/// RemoveItem action
#[derive(Debug, Clone)]
pub struct RemoveItemAction {
    pub session_id: String,
    pub item_id: String,
}

#[async_trait]
impl CommandHandler for RemoveItemAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;
        let item = snapshot
            .find_item(&self.item_id)
            .ok_or_else(|| SessionError::ItemNotFound(self.item_id.clone()))?;

        if item.status.requires_void() {
            return Err(SessionError::VoidRequired {
                item_id: item.id.clone(),
                status: item.status,
            });
        }
        check_edit_permission(item, metadata)?;
        money::ensure_covers_paid(&snapshot, money::line_reduction(item, 0))?;

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &self.session_id,
            EventPayload::ItemRemoved {
                item_id: self.item_id.clone(),
            },
        );

        Ok(vec![event])
    }
}
