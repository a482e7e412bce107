//! OpenSession command handler
//!
//! Opens a new dining session on a table. Rejected (never queued) when the
//! table already has an active session.

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, SessionEvent};

/// OpenSession action
#[derive(Debug, Clone)]
pub struct OpenSessionAction {
    pub table_id: String,
}

#[async_trait]
impl CommandHandler for OpenSessionAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        if self.table_id.trim().is_empty() {
            return Err(SessionError::InvalidOperation(
                "table_id must not be empty".to_string(),
            ));
        }

        // 1. At most one active session per table
        if let Some(session_id) =
            ctx.find_active_session_for_table(&metadata.restaurant_id, &self.table_id)?
        {
            return Err(SessionError::TableOccupied {
                table_id: self.table_id.clone(),
                session_id,
            });
        }

        // 2. Server-generated identifiers
        let session_id = shared::util::new_id();
        let bill_id = shared::util::new_id();

        let seq = ctx.next_sequence();
        let event = metadata.event(
            seq,
            &session_id,
            EventPayload::SessionOpened {
                table_id: self.table_id.clone(),
                bill_id,
            },
        );

        Ok(vec![event])
    }
}
