//! MoveSession command handler
//!
//! Repoints a session to an empty table. Moving onto an occupied table is a
//! merge, and is rejected here with that suggestion.

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, SessionEvent};

/// MoveSession action
#[derive(Debug, Clone)]
pub struct MoveSessionAction {
    pub session_id: String,
    pub target_table_id: String,
    pub expected_sequence: Option<u64>,
}

#[async_trait]
impl CommandHandler for MoveSessionAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        metadata.require_staff()?;

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;

        if snapshot.table_id == self.target_table_id {
            return Err(SessionError::SelfTransfer(self.target_table_id.clone()));
        }
        if let Some(expected) = self.expected_sequence
            && expected != snapshot.last_sequence
        {
            return Err(SessionError::StaleTransfer {
                session_id: self.session_id.clone(),
            });
        }
        if let Some(session_id) =
            ctx.find_active_session_for_table(&metadata.restaurant_id, &self.target_table_id)?
        {
            return Err(SessionError::TableOccupied {
                table_id: self.target_table_id.clone(),
                session_id,
            });
        }

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &self.session_id,
            EventPayload::SessionMoved {
                from_table_id: snapshot.table_id.clone(),
                to_table_id: self.target_table_id.clone(),
            },
        );

        Ok(vec![event])
    }
}
