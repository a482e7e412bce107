//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type.

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{SessionCommand, SessionCommandPayload, SessionEvent};

mod add_item;
mod batch_update;
mod close_session;
mod confirm_pending;
mod mark_served;
mod merge_sessions;
mod move_session;
mod open_session;
mod process_payment;
mod remove_item;
mod service_request;
mod start_preparing;
mod submit_drafts;
mod update_quantity;
mod void_item;

pub use add_item::AddItemAction;
pub use batch_update::BatchUpdateAction;
pub use close_session::CloseSessionAction;
pub use confirm_pending::ConfirmPendingAction;
pub use mark_served::MarkServedAction;
pub use merge_sessions::MergeSessionsAction;
pub use move_session::MoveSessionAction;
pub use open_session::OpenSessionAction;
pub use process_payment::ProcessPaymentAction;
pub use remove_item::RemoveItemAction;
pub use service_request::{CreateServiceRequestAction, ResolveServiceRequestAction};
pub use start_preparing::StartPreparingAction;
pub use submit_drafts::SubmitDraftsAction;
pub use update_quantity::UpdateQuantityAction;
pub use void_item::VoidItemAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    OpenSession(OpenSessionAction),
    CloseSession(CloseSessionAction),
    AddItem(AddItemAction),
    SubmitDrafts(SubmitDraftsAction),
    UpdateQuantity(UpdateQuantityAction),
    RemoveItem(RemoveItemAction),
    VoidItem(VoidItemAction),
    ConfirmPending(ConfirmPendingAction),
    StartPreparing(StartPreparingAction),
    MarkServed(MarkServedAction),
    BatchUpdate(BatchUpdateAction),
    MoveSession(MoveSessionAction),
    MergeSessions(MergeSessionsAction),
    ProcessPayment(ProcessPaymentAction),
    CreateServiceRequest(CreateServiceRequestAction),
    ResolveServiceRequest(ResolveServiceRequestAction),
}

/// Manual implementation of CommandHandler for CommandAction
#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        match self {
            CommandAction::OpenSession(action) => action.execute(ctx, metadata).await,
            CommandAction::CloseSession(action) => action.execute(ctx, metadata).await,
            CommandAction::AddItem(action) => action.execute(ctx, metadata).await,
            CommandAction::SubmitDrafts(action) => action.execute(ctx, metadata).await,
            CommandAction::UpdateQuantity(action) => action.execute(ctx, metadata).await,
            CommandAction::RemoveItem(action) => action.execute(ctx, metadata).await,
            CommandAction::VoidItem(action) => action.execute(ctx, metadata).await,
            CommandAction::ConfirmPending(action) => action.execute(ctx, metadata).await,
            CommandAction::StartPreparing(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkServed(action) => action.execute(ctx, metadata).await,
            CommandAction::BatchUpdate(action) => action.execute(ctx, metadata).await,
            CommandAction::MoveSession(action) => action.execute(ctx, metadata).await,
            CommandAction::MergeSessions(action) => action.execute(ctx, metadata).await,
            CommandAction::ProcessPayment(action) => action.execute(ctx, metadata).await,
            CommandAction::CreateServiceRequest(action) => action.execute(ctx, metadata).await,
            CommandAction::ResolveServiceRequest(action) => action.execute(ctx, metadata).await,
        }
    }
}

/// Convert SessionCommand to CommandAction
///
/// This is the ONLY place with a match on SessionCommandPayload.
impl From<&SessionCommand> for CommandAction {
    fn from(cmd: &SessionCommand) -> Self {
        match &cmd.payload {
            SessionCommandPayload::OpenSession { table_id } => {
                CommandAction::OpenSession(OpenSessionAction {
                    table_id: table_id.clone(),
                })
            }
            SessionCommandPayload::CloseSession {
                session_id,
                force,
                reason,
            } => CommandAction::CloseSession(CloseSessionAction {
                session_id: session_id.clone(),
                force: *force,
                reason: reason.clone(),
            }),
            SessionCommandPayload::AddItem { session_id, item } => {
                CommandAction::AddItem(AddItemAction {
                    session_id: session_id.clone(),
                    item: item.clone(),
                })
            }
            SessionCommandPayload::SubmitDrafts { session_id } => {
                CommandAction::SubmitDrafts(SubmitDraftsAction {
                    session_id: session_id.clone(),
                })
            }
            SessionCommandPayload::UpdateQuantity {
                session_id,
                item_id,
                quantity,
            } => CommandAction::UpdateQuantity(UpdateQuantityAction {
                session_id: session_id.clone(),
                item_id: item_id.clone(),
                quantity: *quantity,
            }),
            SessionCommandPayload::RemoveItem {
                session_id,
                item_id,
            } => CommandAction::RemoveItem(RemoveItemAction {
                session_id: session_id.clone(),
                item_id: item_id.clone(),
            }),
            SessionCommandPayload::VoidItem {
                session_id,
                item_id,
                reason,
                quantity,
            } => CommandAction::VoidItem(VoidItemAction {
                session_id: session_id.clone(),
                item_id: item_id.clone(),
                reason: reason.clone(),
                quantity: *quantity,
            }),
            SessionCommandPayload::ConfirmPending { session_id } => {
                CommandAction::ConfirmPending(ConfirmPendingAction {
                    session_id: session_id.clone(),
                })
            }
            SessionCommandPayload::StartPreparing {
                session_id,
                item_ids,
            } => CommandAction::StartPreparing(StartPreparingAction {
                session_id: session_id.clone(),
                item_ids: item_ids.clone(),
            }),
            SessionCommandPayload::MarkServed {
                session_id,
                item_id,
            } => CommandAction::MarkServed(MarkServedAction {
                session_id: session_id.clone(),
                item_id: item_id.clone(),
            }),
            SessionCommandPayload::BatchUpdate {
                session_id,
                changes,
                reason,
            } => CommandAction::BatchUpdate(BatchUpdateAction {
                session_id: session_id.clone(),
                changes: changes.clone(),
                reason: reason.clone(),
            }),
            SessionCommandPayload::MoveSession {
                session_id,
                target_table_id,
                expected_sequence,
            } => CommandAction::MoveSession(MoveSessionAction {
                session_id: session_id.clone(),
                target_table_id: target_table_id.clone(),
                expected_sequence: *expected_sequence,
            }),
            SessionCommandPayload::MergeSessions {
                source_session_id,
                target_session_id,
                expected_source_sequence,
                expected_target_sequence,
            } => CommandAction::MergeSessions(MergeSessionsAction {
                source_session_id: source_session_id.clone(),
                target_session_id: target_session_id.clone(),
                expected_source_sequence: *expected_source_sequence,
                expected_target_sequence: *expected_target_sequence,
            }),
            SessionCommandPayload::ProcessPayment {
                session_id,
                payment,
            } => CommandAction::ProcessPayment(ProcessPaymentAction {
                session_id: session_id.clone(),
                payment: payment.clone(),
            }),
            SessionCommandPayload::CreateServiceRequest { session_id, kind } => {
                CommandAction::CreateServiceRequest(CreateServiceRequestAction {
                    session_id: session_id.clone(),
                    kind: *kind,
                })
            }
            SessionCommandPayload::ResolveServiceRequest {
                session_id,
                request_id,
            } => CommandAction::ResolveServiceRequest(ResolveServiceRequestAction {
                session_id: session_id.clone(),
                request_id: request_id.clone(),
            }),
        }
    }
}
