//! Core traits for command handling and event application
//!
//! - [`CommandHandler`]: validates a command against current state and emits events
//! - [`EventApplier`]: pure state transition from one event
//! - [`CommandContext`]: transactional view of snapshots for one command

use std::collections::HashMap;

use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::session::{
    CommandErrorCode, EventPayload, IllegalTransition, ItemStatus, Role, SessionEvent,
    SessionSnapshot,
};
use thiserror::Error;

// `#[enum_dispatch]` expands the `EventAction` impl in this module
#[allow(unused_imports)]
use super::appliers::*;
use super::storage::{SessionStorage, StorageError};

/// Metadata of the command being executed
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub restaurant_id: String,
    pub operator_id: String,
    pub operator_name: String,
    pub role: Role,
    /// Client timestamp (audit only)
    pub timestamp: i64,
}

impl CommandMetadata {
    /// Build an event carrying this command's metadata
    pub fn event(&self, sequence: u64, session_id: &str, payload: EventPayload) -> SessionEvent {
        SessionEvent::new(
            sequence,
            session_id.to_string(),
            self.restaurant_id.clone(),
            self.operator_id.clone(),
            self.operator_name.clone(),
            self.command_id.clone(),
            Some(self.timestamp),
            payload,
        )
    }

    pub fn require_staff(&self) -> Result<(), SessionError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(SessionError::PermissionDenied(format!(
                "{} may not perform this operation",
                self.role
            )))
        }
    }
}

/// Domain errors raised while handling a command
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session is closed: {0}")]
    SessionClosed(String),

    #[error("Table {table_id} already has active session {session_id}")]
    TableOccupied { table_id: String, session_id: String },

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),

    #[error("Item {item_id} is {status}; use a void with a reason")]
    VoidRequired { item_id: String, status: ItemStatus },

    #[error("A void reason is required")]
    VoidReasonRequired,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Payment {amount} exceeds remaining {remaining}")]
    PaymentExceedsRemaining { amount: Decimal, remaining: Decimal },

    #[error("Outstanding balance: {0}")]
    OutstandingBalance(Decimal),

    #[error("Source and target are the same: {0}")]
    SelfTransfer(String),

    #[error("Session has recorded payments: {0}")]
    SessionHasPayments(String),

    #[error("Bill total {total} would fall below paid amount {paid}")]
    BelowPaidAmount { total: Decimal, paid: Decimal },

    #[error("Too many split parts: {0}")]
    TooManySplitParts(usize),

    #[error("Batch too large: {0}")]
    BatchTooLarge(usize),

    #[error("Service request not found: {0}")]
    ServiceRequestNotFound(String),

    #[error("Session {session_id} changed since the transfer was planned")]
    StaleTransfer { session_id: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl SessionError {
    pub fn code(&self) -> CommandErrorCode {
        match self {
            Self::SessionNotFound(_) => CommandErrorCode::SessionNotFound,
            Self::SessionClosed(_) => CommandErrorCode::SessionClosed,
            Self::TableOccupied { .. } => CommandErrorCode::TableOccupied,
            Self::ItemNotFound(_) => CommandErrorCode::ItemNotFound,
            Self::IllegalTransition(_) => CommandErrorCode::IllegalTransition,
            Self::VoidRequired { .. } => CommandErrorCode::VoidRequired,
            Self::VoidReasonRequired => CommandErrorCode::VoidReasonRequired,
            Self::PermissionDenied(_) => CommandErrorCode::PermissionDenied,
            Self::InvalidQuantity(_) => CommandErrorCode::InvalidQuantity,
            Self::InvalidAmount(_) => CommandErrorCode::InvalidAmount,
            Self::PaymentExceedsRemaining { .. } => CommandErrorCode::PaymentExceedsRemaining,
            Self::OutstandingBalance(_) => CommandErrorCode::OutstandingBalance,
            Self::SelfTransfer(_) => CommandErrorCode::SelfTransfer,
            Self::SessionHasPayments(_) | Self::BelowPaidAmount { .. } => {
                CommandErrorCode::SessionHasPayments
            }
            Self::TooManySplitParts(_) => CommandErrorCode::TooManySplitParts,
            Self::BatchTooLarge(_) => CommandErrorCode::BatchTooLarge,
            Self::ServiceRequestNotFound(_) => CommandErrorCode::ServiceRequestNotFound,
            Self::StaleTransfer { .. } => CommandErrorCode::StaleTransfer,
            Self::InvalidOperation(_) => CommandErrorCode::InvalidOperation,
            Self::Storage(_) => CommandErrorCode::SystemBusy,
        }
    }

    /// Fallback the caller can take instead
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::VoidRequired { .. } => Some("void the item with a reason"),
            Self::TableOccupied { .. } => Some("merge the sessions instead"),
            Self::OutstandingBalance(_) => Some("record the remaining payment or force close"),
            Self::StaleTransfer { .. } => Some("plan the transfer again"),
            Self::BelowPaidAmount { .. } => Some("refund the payment first"),
            _ => None,
        }
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SessionNotFound(id) => SessionError::SessionNotFound(id),
            other => SessionError::Storage(other.to_string()),
        }
    }
}

/// Command handler: validates and produces events, never mutates state
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError>;
}

/// Event applier: pure state transition
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent);
}

/// Transactional context for one command
///
/// Snapshots loaded or saved through the context are cached, so actions and
/// appliers observe each other's changes before commit.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a SessionStorage,
    snapshots: HashMap<String, SessionSnapshot>,
    /// Insertion order of modified snapshots
    modified: Vec<String>,
    current_sequence: u64,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a SessionStorage,
        current_sequence: u64,
    ) -> Self {
        Self {
            txn,
            storage,
            snapshots: HashMap::new(),
            modified: Vec::new(),
            current_sequence,
        }
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.current_sequence += 1;
        self.current_sequence
    }

    pub fn current_sequence(&self) -> u64 {
        self.current_sequence
    }

    /// Load a snapshot (context cache first, then storage)
    pub fn load_snapshot(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        if let Some(snapshot) = self.snapshots.get(session_id) {
            return Ok(snapshot.clone());
        }
        self.storage
            .get_snapshot_txn(self.txn, session_id)?
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))
    }

    /// Load a session visible to the given restaurant
    ///
    /// Sessions of other restaurants are reported as not found.
    pub fn load_session(
        &self,
        session_id: &str,
        restaurant_id: &str,
    ) -> Result<SessionSnapshot, SessionError> {
        let snapshot = self.load_snapshot(session_id)?;
        if snapshot.restaurant_id != restaurant_id {
            return Err(SessionError::SessionNotFound(session_id.to_string()));
        }
        Ok(snapshot)
    }

    /// Load a session that must still be active
    pub fn load_active_session(
        &self,
        session_id: &str,
        restaurant_id: &str,
    ) -> Result<SessionSnapshot, SessionError> {
        let snapshot = self.load_session(session_id, restaurant_id)?;
        if !snapshot.is_active() {
            return Err(SessionError::SessionClosed(session_id.to_string()));
        }
        Ok(snapshot)
    }

    /// Store a snapshot in the context (persisted by the manager)
    pub fn save_snapshot(&mut self, snapshot: SessionSnapshot) {
        let id = snapshot.session_id.clone();
        if !self.modified.contains(&id) {
            self.modified.push(id.clone());
        }
        self.snapshots.insert(id, snapshot);
    }

    /// Create an empty snapshot for a new session
    pub fn create_snapshot(&self, session_id: String) -> SessionSnapshot {
        SessionSnapshot::new(session_id)
    }

    /// Active session of a table, including sessions touched by this command
    pub fn find_active_session_for_table(
        &self,
        restaurant_id: &str,
        table_id: &str,
    ) -> Result<Option<String>, SessionError> {
        if let Some(s) = self.snapshots.values().find(|s| {
            s.is_active() && s.restaurant_id == restaurant_id && s.table_id == table_id
        }) {
            return Ok(Some(s.session_id.clone()));
        }

        let found = self
            .storage
            .find_active_session_for_table_txn(self.txn, restaurant_id, table_id)?;

        // A cached copy may have moved away or closed within this command
        Ok(found.filter(|id| match self.snapshots.get(id) {
            Some(s) => s.is_active() && s.table_id == table_id,
            None => true,
        }))
    }

    /// Snapshots modified during this command, in first-touch order
    pub fn modified_snapshots(&self) -> impl Iterator<Item = &SessionSnapshot> {
        self.modified
            .iter()
            .filter_map(|id| self.snapshots.get(id))
    }
}
