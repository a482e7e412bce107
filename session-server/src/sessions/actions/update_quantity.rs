//! UpdateQuantity command handler
//!
//! Increases are allowed on any live line. Decreases are only allowed
//! before the line reaches the kitchen; afterwards the void path is required.

use async_trait::async_trait;

use crate::sessions::money;
use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, ItemStatus, OrderItem, SessionEvent};

/// UpdateQuantity action
#[derive(Debug, Clone)]
pub struct UpdateQuantityAction {
    pub session_id: String,
    pub item_id: String,
    pub quantity: i32,
}

/// Who may edit a line at all
///
/// Drafts belong to their creator; later lines are staff territory.
pub(crate) fn check_edit_permission(
    item: &OrderItem,
    metadata: &CommandMetadata,
) -> Result<(), SessionError> {
    if item.status.is_terminal() {
        return Err(SessionError::InvalidOperation(format!(
            "item {} is {}",
            item.id, item.status
        )));
    }
    if item.status == ItemStatus::Draft {
        if item.created_by != metadata.operator_id {
            return Err(SessionError::PermissionDenied(
                "drafts can only be edited by their creator".to_string(),
            ));
        }
        return Ok(());
    }
    metadata.require_staff()
}

#[async_trait]
impl CommandHandler for UpdateQuantityAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        money::validate_quantity(self.quantity)?;

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;
        let item = snapshot
            .find_item(&self.item_id)
            .ok_or_else(|| SessionError::ItemNotFound(self.item_id.clone()))?;

        check_edit_permission(item, metadata)?;

        if self.quantity == item.quantity {
            return Ok(vec![]);
        }
        if self.quantity < item.quantity && item.status.requires_void() {
            return Err(SessionError::VoidRequired {
                item_id: item.id.clone(),
                status: item.status,
            });
        }
        money::ensure_covers_paid(&snapshot, money::line_reduction(item, self.quantity))?;

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &self.session_id,
            EventPayload::ItemQuantityChanged {
                item_id: self.item_id.clone(),
                from: item.quantity,
                to: self.quantity,
            },
        );

        Ok(vec![event])
    }
}
