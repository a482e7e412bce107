//! VoidItem command handler
//!
//! Audited cancellation with a mandatory reason. A partial void lowers the
//! line quantity; a full void moves the line to `voided`. The line is kept
//! for audit either way.

use async_trait::async_trait;

use crate::sessions::money;
use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, ItemStatus, SessionEvent};

/// VoidItem action
#[derive(Debug, Clone)]
pub struct VoidItemAction {
    pub session_id: String,
    pub item_id: String,
    pub reason: String,
    pub quantity: Option<i32>,
}

#[async_trait]
impl CommandHandler for VoidItemAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        metadata.require_staff()?;

        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(SessionError::VoidReasonRequired);
        }

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;
        let item = snapshot
            .find_item(&self.item_id)
            .ok_or_else(|| SessionError::ItemNotFound(self.item_id.clone()))?;

        item.status.transition(ItemStatus::Voided)?;

        let quantity = self.quantity.unwrap_or(item.quantity);
        if quantity <= 0 || quantity > item.quantity {
            return Err(SessionError::InvalidQuantity(format!(
                "void quantity must be between 1 and {}, got {}",
                item.quantity, quantity
            )));
        }
        money::ensure_covers_paid(
            &snapshot,
            money::line_reduction(item, item.quantity - quantity),
        )?;

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &self.session_id,
            EventPayload::ItemVoided {
                item_id: self.item_id.clone(),
                quantity,
                reason: reason.to_string(),
                full: quantity == item.quantity,
            },
        );

        Ok(vec![event])
    }
}
