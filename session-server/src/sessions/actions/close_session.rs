//! CloseSession command handler
//!
//! A normal close requires the live balance to be settled. A forced close
//! (staff override) closes regardless and cancels lines that never reached
//! the kitchen. Either way, guest drafts are cancelled.

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use rust_decimal::Decimal;
use shared::session::{CloseReason, EventPayload, ItemStatus, MONEY_TOLERANCE, SessionEvent};

/// CloseSession action
#[derive(Debug, Clone)]
pub struct CloseSessionAction {
    pub session_id: String,
    pub force: bool,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for CloseSessionAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        metadata.require_staff()?;

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;

        // Balance is checked against the live sum, not the stored total
        let remaining = (snapshot.live_total() - snapshot.bill.paid_amount).max(Decimal::ZERO);
        if !self.force && remaining > MONEY_TOLERANCE {
            return Err(SessionError::OutstandingBalance(remaining));
        }

        let cancelled_item_ids: Vec<String> = snapshot
            .items
            .iter()
            .filter(|i| match i.status {
                ItemStatus::Draft => true,
                ItemStatus::Pending => self.force,
                _ => false,
            })
            .map(|i| i.id.clone())
            .collect();

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &self.session_id,
            EventPayload::SessionClosed {
                reason: CloseReason::StaffOverride,
                cancelled_item_ids,
                note: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}
