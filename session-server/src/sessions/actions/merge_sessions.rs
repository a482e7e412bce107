//! MergeSessions command handler
//!
//! Folds every live line and pending request of the source session into the
//! target session, then closes the source. Both events are committed in the
//! same transaction, so either everything moves or nothing does.

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, OrderItem, ServiceRequest, SessionEvent, SessionSnapshot};

/// MergeSessions action
#[derive(Debug, Clone)]
pub struct MergeSessionsAction {
    pub source_session_id: String,
    pub target_session_id: String,
    pub expected_source_sequence: Option<u64>,
    pub expected_target_sequence: Option<u64>,
}

fn check_fresh(snapshot: &SessionSnapshot, expected: Option<u64>) -> Result<(), SessionError> {
    match expected {
        Some(seq) if seq != snapshot.last_sequence => Err(SessionError::StaleTransfer {
            session_id: snapshot.session_id.clone(),
        }),
        _ => Ok(()),
    }
}

#[async_trait]
impl CommandHandler for MergeSessionsAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        metadata.require_staff()?;

        if self.source_session_id == self.target_session_id {
            return Err(SessionError::SelfTransfer(self.source_session_id.clone()));
        }

        let source =
            ctx.load_active_session(&self.source_session_id, &metadata.restaurant_id)?;
        let target =
            ctx.load_active_session(&self.target_session_id, &metadata.restaurant_id)?;

        check_fresh(&source, self.expected_source_sequence)?;
        check_fresh(&target, self.expected_target_sequence)?;

        // A ledger with payments cannot be folded without refunds
        for snapshot in [&source, &target] {
            if snapshot.has_payments() {
                return Err(SessionError::SessionHasPayments(
                    snapshot.session_id.clone(),
                ));
            }
        }

        let items: Vec<OrderItem> = source.active_items().cloned().collect();
        let requests: Vec<ServiceRequest> = source.pending_requests().cloned().collect();

        let merged_in = metadata.event(
            ctx.next_sequence(),
            &self.target_session_id,
            EventPayload::SessionMergedIn {
                source_session_id: source.session_id.clone(),
                source_table_id: source.table_id.clone(),
                items,
                requests,
            },
        );
        let merged_out = metadata.event(
            ctx.next_sequence(),
            &self.source_session_id,
            EventPayload::SessionMergedOut {
                target_session_id: target.session_id.clone(),
                target_table_id: target.table_id.clone(),
            },
        );

        Ok(vec![merged_in, merged_out])
    }
}
