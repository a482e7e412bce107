//! SessionsManager - Core command processing and event generation
//!
//! This module handles:
//! - Command validation and processing
//! - Event generation with global sequence numbers
//! - Persistence to redb (transactional)
//! - Snapshot updates
//! - Event broadcasting
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Create CommandContext
//!     ├─ 4. Convert command to action and execute
//!     ├─ 5. Apply events to snapshots via EventApplier
//!     ├─ 6. Persist events, snapshots and the active index
//!     ├─ 7. Mark command processed
//!     ├─ 8. Commit transaction
//!     ├─ 9. Broadcast event(s)
//!     └─ 10. Return response
//! ```
//!
//! redb admits one write transaction at a time, so two cashiers paying the
//! same bill are serialized here and the second one sees the first one's
//! payment when it re-reads the remaining balance.

mod error;
pub use error::*;

use super::actions::CommandAction;
use super::appliers::EventAction;
use super::storage::{SessionStorage, StorageError};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier, SessionError};
use shared::session::{
    CommandResponse, EventPayload, PaymentOutcome, SessionCommand, SessionCommandPayload,
    SessionEvent, SessionSnapshot, SessionStatus,
};
use std::path::Path;
use tokio::sync::broadcast;

/// Default event broadcast channel capacity
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 16384;

/// SessionsManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Clients use it to detect server restarts and trigger a full resync.
pub struct SessionsManager {
    storage: SessionStorage,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Server instance epoch - unique ID generated on startup
    epoch: String,
}

impl std::fmt::Debug for SessionsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionsManager")
            .field("storage", &"<SessionStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl SessionsManager {
    /// Create a new SessionsManager with the given database path
    pub fn new(db_path: impl AsRef<Path>, channel_capacity: usize) -> ManagerResult<Self> {
        let storage = SessionStorage::open(db_path)?;
        Ok(Self::with_storage(storage, channel_capacity))
    }

    /// Create a SessionsManager over an already opened storage
    pub fn with_storage(storage: SessionStorage, channel_capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(channel_capacity.max(1));
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "SessionsManager started with new epoch");
        Self {
            storage,
            event_tx,
            epoch,
        }
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to committed events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    /// Execute a command and return the response
    ///
    /// Blocking: callers on an async runtime should wrap this in
    /// `spawn_blocking`.
    pub fn execute_command(&self, cmd: SessionCommand) -> CommandResponse {
        let command_id = cmd.command_id.clone();
        match self.process_command(cmd) {
            Ok((response, events)) => {
                // Broadcast events after successful commit
                for event in events {
                    if self.event_tx.send(event).is_err() {
                        tracing::warn!("Event broadcast failed: no active receivers");
                        break;
                    }
                }
                response
            }
            Err(err) => {
                tracing::debug!(command_id = %command_id, error = %err, "Command rejected");
                CommandResponse::error(command_id, err.into())
            }
        }
    }

    /// Process command and return response with events
    ///
    /// 1. Convert command to CommandAction
    /// 2. Execute action to generate events
    /// 3. Apply events to snapshots via EventApplier
    /// 4. Persist everything atomically
    fn process_command(
        &self,
        cmd: SessionCommand,
    ) -> ManagerResult<(CommandResponse, Vec<SessionEvent>)> {
        tracing::debug!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing command");

        // 1. Idempotency check (before transaction): replay the first response
        if let Some(response) = self.storage.get_command_response(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((response, vec![]));
        }

        // 2. Begin write transaction
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within transaction
        if let Some(response) = self
            .storage
            .get_command_response_txn(&txn, &cmd.command_id)?
        {
            return Ok((response, vec![]));
        }

        // 3. Create context and metadata
        let current_sequence = self.storage.get_current_sequence_txn(&txn)?;
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            restaurant_id: cmd.restaurant_id.clone(),
            operator_id: cmd.operator_id.clone(),
            operator_name: cmd.operator_name.clone(),
            role: cmd.role,
            timestamp: cmd.timestamp,
        };

        // 4. Convert to action and execute
        let action: CommandAction = (&cmd).into();
        let events = futures::executor::block_on(action.execute(&mut ctx, &metadata))?;

        // 5. Apply events to snapshots
        for event in &events {
            let mut snapshot = ctx
                .load_snapshot(&event.session_id)
                .unwrap_or_else(|_| ctx.create_snapshot(event.session_id.clone()));

            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);

            ctx.save_snapshot(snapshot);
        }

        // 6. Persist events
        for event in &events {
            self.storage.store_event(&txn, event)?;
        }

        // 7. Persist snapshots and update active session tracking
        for snapshot in ctx.modified_snapshots() {
            self.storage.store_snapshot(&txn, snapshot)?;
            match snapshot.status {
                SessionStatus::Active => {
                    self.storage.mark_session_active(&txn, &snapshot.session_id)?;
                }
                SessionStatus::Closed => {
                    self.storage
                        .mark_session_inactive(&txn, &snapshot.session_id)?;
                }
            }
        }

        // 8. Update sequence counter
        let max_sequence = events
            .iter()
            .map(|e| e.sequence)
            .max()
            .unwrap_or(current_sequence);
        if max_sequence > current_sequence {
            self.storage.set_sequence(&txn, max_sequence)?;
        }

        let session_id = events
            .first()
            .map(|e| e.session_id.clone())
            .or_else(|| cmd.target_session().map(str::to_string));
        let item_id = events.iter().find_map(|e| match &e.payload {
            EventPayload::ItemAdded { item } => Some(item.id.clone()),
            _ => None,
        });
        let payment = match &cmd.payload {
            SessionCommandPayload::ProcessPayment { session_id, .. } => ctx
                .load_snapshot(session_id)
                .ok()
                .map(|s| payment_outcome(&s)),
            _ => None,
        };
        drop(ctx);

        // 9. Mark command processed
        let response = CommandResponse::success(cmd.command_id.clone(), session_id.clone())
            .with_item_id(item_id)
            .with_payment(payment);
        self.storage.record_command_response(&txn, &response)?;

        // 10. Commit transaction
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            command_id = %cmd.command_id,
            session_id = ?session_id,
            event_count = events.len(),
            sequence = max_sequence,
            "Command processed successfully"
        );

        Ok((response, events))
    }

    // ========== Public Query Methods ==========

    /// Get a snapshot by session ID
    pub fn get_snapshot(&self, session_id: &str) -> ManagerResult<Option<SessionSnapshot>> {
        Ok(self.storage.get_snapshot(session_id)?)
    }

    /// Get a snapshot visible to a restaurant
    pub fn get_session(
        &self,
        restaurant_id: &str,
        session_id: &str,
    ) -> ManagerResult<Option<SessionSnapshot>> {
        Ok(self
            .storage
            .get_snapshot(session_id)?
            .filter(|s| s.restaurant_id == restaurant_id))
    }

    /// Get all active session snapshots of a restaurant
    pub fn get_active_sessions(&self, restaurant_id: &str) -> ManagerResult<Vec<SessionSnapshot>> {
        Ok(self
            .storage
            .get_active_sessions()?
            .into_iter()
            .filter(|s| s.restaurant_id == restaurant_id)
            .collect())
    }

    /// Active session of a table, if any
    pub fn get_active_session_for_table(
        &self,
        restaurant_id: &str,
        table_id: &str,
    ) -> ManagerResult<Option<SessionSnapshot>> {
        Ok(self
            .storage
            .find_active_session_for_table(restaurant_id, table_id)?)
    }

    /// Get current sequence number
    pub fn get_current_sequence(&self) -> ManagerResult<u64> {
        Ok(self.storage.get_current_sequence()?)
    }

    /// Get events since a given sequence
    pub fn get_events_since(&self, since_sequence: u64) -> ManagerResult<Vec<SessionEvent>> {
        Ok(self.storage.get_events_since(since_sequence)?)
    }

    /// Get events for active sessions since a given sequence
    pub fn get_active_events_since(
        &self,
        since_sequence: u64,
    ) -> ManagerResult<Vec<SessionEvent>> {
        Ok(self.storage.get_active_events_since(since_sequence)?)
    }

    /// Get all events for a specific session
    pub fn get_events_for_session(&self, session_id: &str) -> ManagerResult<Vec<SessionEvent>> {
        Ok(self.storage.get_events_for_session(session_id)?)
    }

    /// Rebuild a snapshot from events (for verification)
    pub fn rebuild_snapshot(&self, session_id: &str) -> ManagerResult<SessionSnapshot> {
        let events = self.storage.get_events_for_session(session_id)?;
        if events.is_empty() {
            return Err(SessionError::SessionNotFound(session_id.to_string()).into());
        }

        let mut snapshot = SessionSnapshot::new(session_id.to_string());
        for event in &events {
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
        }

        Ok(snapshot)
    }
}

fn payment_outcome(snapshot: &SessionSnapshot) -> PaymentOutcome {
    PaymentOutcome {
        success: true,
        bill_id: snapshot.bill.bill_id.clone(),
        remaining: snapshot.bill.remaining(),
        fully_paid: snapshot.bill.is_covered(),
    }
}

impl Clone for SessionsManager {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            event_tx: self.event_tx.clone(),
            epoch: self.epoch.clone(),
        }
    }
}

#[cfg(test)]
mod tests;
