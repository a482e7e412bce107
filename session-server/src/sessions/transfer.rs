//! TransferCoordinator - two-phase move / merge between tables
//!
//! ```text
//! plan(source_table, target_table)      commit(plan, confirmed)
//!   ├─ source must have a session         ├─ refuse unless confirmed
//!   ├─ target empty  → Move               ├─ MoveSession / MergeSessions
//!   ├─ target active → Merge              │    with the planned sequences
//!   └─ record sequences seen              └─ StaleTransfer → Stale
//! ```
//!
//! The command itself is one atomic write; the plan only pins the state the
//! operator confirmed so that a concurrent edit invalidates the plan instead
//! of being merged blindly.

use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::session::{
    CommandError, CommandErrorCode, CommandResponse, Role, SessionCommand, SessionCommandPayload,
    SessionSnapshot,
};
use thiserror::Error;

use super::manager::{ManagerError, SessionsManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Target table is free: the session is repointed
    Move,
    /// Target table is occupied: items fold into its session
    Merge,
}

/// A transfer the operator has to confirm before it is committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub plan_id: String,
    pub restaurant_id: String,
    pub kind: TransferKind,
    pub source_table_id: String,
    pub target_table_id: String,
    pub source_session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_session_id: Option<String>,
    /// Live lines that will change tables
    pub item_count: usize,
    /// Pending service requests that will follow the items
    pub request_count: usize,
    pub source_sequence: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sequence: Option<u64>,
}

/// Who commits the transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferActor {
    pub operator_id: String,
    pub operator_name: String,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Cannot transfer table {0} onto itself")]
    SelfTransfer(String),

    #[error("Table {0} has no active session")]
    NoActiveSession(String),

    #[error("Transfer must be confirmed before commit")]
    NotConfirmed,

    #[error("Transfer plan is out of date")]
    Stale,

    #[error("Transfer rejected: {}", .0.message)]
    Rejected(CommandError),

    #[error(transparent)]
    Manager(#[from] ManagerError),
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::SelfTransfer(_) => {
                AppError::with_message(ErrorCode::SelfTransfer, err.to_string())
            }
            TransferError::NoActiveSession(_) => {
                AppError::with_message(ErrorCode::NoActiveSession, err.to_string())
            }
            TransferError::NotConfirmed => {
                AppError::with_message(ErrorCode::TransferNotConfirmed, err.to_string())
            }
            TransferError::Stale => AppError::with_message(ErrorCode::TransferStale, err.to_string())
                .with_suggestion("plan the transfer again"),
            TransferError::Rejected(e) => e.into(),
            TransferError::Manager(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferCoordinator {
    manager: SessionsManager,
}

impl TransferCoordinator {
    pub fn new(manager: SessionsManager) -> Self {
        Self { manager }
    }

    /// Compute what a transfer would do without writing anything
    pub fn plan(
        &self,
        restaurant_id: &str,
        source_table_id: &str,
        target_table_id: &str,
    ) -> Result<TransferPlan, TransferError> {
        if source_table_id == target_table_id {
            return Err(TransferError::SelfTransfer(source_table_id.to_string()));
        }

        let source = self
            .manager
            .get_active_session_for_table(restaurant_id, source_table_id)?
            .ok_or_else(|| TransferError::NoActiveSession(source_table_id.to_string()))?;
        let target = self
            .manager
            .get_active_session_for_table(restaurant_id, target_table_id)?;

        let plan = build_plan(restaurant_id, &source, target.as_ref(), target_table_id);
        tracing::debug!(
            plan_id = %plan.plan_id,
            kind = ?plan.kind,
            source = %plan.source_session_id,
            target_table = %plan.target_table_id,
            "Transfer planned"
        );
        Ok(plan)
    }

    /// Commit a confirmed plan as one atomic command
    ///
    /// Blocking, like `SessionsManager::execute_command`.
    pub fn commit(
        &self,
        plan: &TransferPlan,
        confirmed: bool,
        actor: &TransferActor,
    ) -> Result<CommandResponse, TransferError> {
        if !confirmed {
            return Err(TransferError::NotConfirmed);
        }

        let payload = match (plan.kind, &plan.target_session_id) {
            (TransferKind::Move, _) => SessionCommandPayload::MoveSession {
                session_id: plan.source_session_id.clone(),
                target_table_id: plan.target_table_id.clone(),
                expected_sequence: Some(plan.source_sequence),
            },
            (TransferKind::Merge, Some(target_session_id)) => {
                SessionCommandPayload::MergeSessions {
                    source_session_id: plan.source_session_id.clone(),
                    target_session_id: target_session_id.clone(),
                    expected_source_sequence: Some(plan.source_sequence),
                    expected_target_sequence: plan.target_sequence,
                }
            }
            // A merge plan always names its target; treat a hand-built one as stale
            (TransferKind::Merge, None) => return Err(TransferError::Stale),
        };

        let cmd = SessionCommand::new(
            plan.restaurant_id.clone(),
            actor.operator_id.clone(),
            actor.operator_name.clone(),
            actor.role,
            payload,
        );
        let response = self.manager.execute_command(cmd);

        match response.error {
            None => {
                tracing::info!(plan_id = %plan.plan_id, kind = ?plan.kind, "Transfer committed");
                Ok(response)
            }
            Some(e) if e.code == CommandErrorCode::StaleTransfer => {
                tracing::warn!(plan_id = %plan.plan_id, "Transfer plan went stale before commit");
                Err(TransferError::Stale)
            }
            // A move planned onto a free table that has since been taken
            Some(e) if e.code == CommandErrorCode::TableOccupied => Err(TransferError::Stale),
            Some(e) => Err(TransferError::Rejected(e)),
        }
    }
}

fn build_plan(
    restaurant_id: &str,
    source: &SessionSnapshot,
    target: Option<&SessionSnapshot>,
    target_table_id: &str,
) -> TransferPlan {
    TransferPlan {
        plan_id: shared::util::new_id(),
        restaurant_id: restaurant_id.to_string(),
        kind: if target.is_some() {
            TransferKind::Merge
        } else {
            TransferKind::Move
        },
        source_table_id: source.table_id.clone(),
        target_table_id: target_table_id.to_string(),
        source_session_id: source.session_id.clone(),
        target_session_id: target.map(|t| t.session_id.clone()),
        item_count: source.active_items().count(),
        request_count: source.pending_requests().count(),
        source_sequence: source.last_sequence,
        target_sequence: target.map(|t| t.last_sequence),
    }
}
