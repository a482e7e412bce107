//! redb-based storage layer for session event sourcing
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `events` | `(session_id, sequence)` | `SessionEvent` | Event stream (append-only) |
//! | `snapshots` | `session_id` | `SessionSnapshot` | Snapshot cache |
//! | `active_sessions` | `session_id` | `()` | Active session index |
//! | `command_responses` | `command_id` | `CommandResponse` | Idempotent replay |
//! | `sequence_counter` | `"seq"` | `u64` | Global sequence |
//! | `dining_tables` | `(restaurant_id, table_id)` | `DiningTable` | Floor plan registry |
//!
//! # Concurrency
//!
//! redb allows a single write transaction at a time. Every command runs inside
//! one write transaction, so two commands touching the same bill are always
//! serialized and each re-reads the committed state.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::models::DiningTable;
use shared::session::{CommandResponse, SessionEvent, SessionSnapshot};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for storing events: key = (session_id, sequence), value = JSON-serialized SessionEvent
const EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("events");

/// Table for storing snapshots: key = session_id, value = JSON-serialized SessionSnapshot
const SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

/// Table for tracking active sessions: key = session_id, value = empty (existence check)
const ACTIVE_SESSIONS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("active_sessions");

/// Table for processed commands: key = command_id, value = JSON-serialized CommandResponse
const COMMAND_RESPONSES_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("command_responses");

/// Table for sequence counter: key = "seq", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

/// Table for the floor plan: key = (restaurant_id, table_id), value = JSON-serialized DiningTable
const DINING_TABLES_TABLE: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("dining_tables");

const SEQUENCE_KEY: &str = "seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Session storage backed by redb
#[derive(Clone)]
pub struct SessionStorage {
    db: Arc<Database>,
}

impl SessionStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable as soon as `commit()` returns (copy-on-write
    /// with atomic pointer swap), so a crash never leaves a half-applied
    /// command behind.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_SESSIONS_TABLE)?;
            let _ = write_txn.open_table(COMMAND_RESPONSES_TABLE)?;
            let _ = write_txn.open_table(DINING_TABLES_TABLE)?;

            // Initialize sequence counter if not exists
            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Get current sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Get current sequence (within transaction)
    pub fn get_current_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let table = txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Set sequence number (within transaction)
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Command Idempotency ==========

    /// Response recorded for an already processed command
    pub fn get_command_response(&self, command_id: &str) -> StorageResult<Option<CommandResponse>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COMMAND_RESPONSES_TABLE)?;
        match table.get(command_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Response recorded for an already processed command (within transaction)
    pub fn get_command_response_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<Option<CommandResponse>> {
        let table = txn.open_table(COMMAND_RESPONSES_TABLE)?;
        match table.get(command_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Mark a command as processed, keeping its response for retries
    pub fn record_command_response(
        &self,
        txn: &WriteTransaction,
        response: &CommandResponse,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(COMMAND_RESPONSES_TABLE)?;
        let value = serde_json::to_vec(response)?;
        table.insert(response.command_id.as_str(), value.as_slice())?;
        Ok(())
    }

    // ========== Event Operations ==========

    /// Store an event
    pub fn store_event(&self, txn: &WriteTransaction, event: &SessionEvent) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let key = (event.session_id.as_str(), event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get all events for a session
    pub fn get_events_for_session(&self, session_id: &str) -> StorageResult<Vec<SessionEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((session_id, 0u64)..=(session_id, u64::MAX))? {
            let (_key, value) = result?;
            let event: SessionEvent = serde_json::from_slice(value.value())?;
            events.push(event);
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    /// Get events since a given sequence (across all sessions)
    pub fn get_events_since(&self, since_sequence: u64) -> StorageResult<Vec<SessionEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let event: SessionEvent = serde_json::from_slice(value.value())?;
            if event.sequence > since_sequence {
                events.push(event);
            }
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    /// Get events for active sessions since a given sequence
    pub fn get_active_events_since(&self, since_sequence: u64) -> StorageResult<Vec<SessionEvent>> {
        let read_txn = self.db.begin_read()?;
        let events_table = read_txn.open_table(EVENTS_TABLE)?;
        let active_table = read_txn.open_table(ACTIVE_SESSIONS_TABLE)?;

        let mut active_ids: Vec<String> = Vec::new();
        for result in active_table.iter()? {
            let (key, _value) = result?;
            active_ids.push(key.value().to_string());
        }

        let mut events = Vec::new();
        for session_id in &active_ids {
            let range_start = (session_id.as_str(), since_sequence + 1);
            let range_end = (session_id.as_str(), u64::MAX);

            for result in events_table.range(range_start..=range_end)? {
                let (_key, value) = result?;
                let event: SessionEvent = serde_json::from_slice(value.value())?;
                events.push(event);
            }
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Snapshot Operations ==========

    /// Store a snapshot
    pub fn store_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &SessionSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SNAPSHOTS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.session_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a snapshot by session ID
    pub fn get_snapshot(&self, session_id: &str) -> StorageResult<Option<SessionSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;

        match table.get(session_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a snapshot by session ID (within transaction)
    pub fn get_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
    ) -> StorageResult<Option<SessionSnapshot>> {
        let table = txn.open_table(SNAPSHOTS_TABLE)?;

        match table.get(session_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Active Sessions ==========

    /// Mark a session as active
    pub fn mark_session_active(&self, txn: &WriteTransaction, session_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        table.insert(session_id, ())?;
        Ok(())
    }

    /// Mark a session as inactive
    pub fn mark_session_inactive(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        table.remove(session_id)?;
        Ok(())
    }

    /// Check if a session is active
    pub fn is_session_active(&self, session_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        Ok(table.get(session_id)?.is_some())
    }

    /// Get all active session snapshots
    pub fn get_active_sessions(&self) -> StorageResult<Vec<SessionSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let active_table = read_txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        let snapshots_table = read_txn.open_table(SNAPSHOTS_TABLE)?;

        let mut snapshots = Vec::new();
        for result in active_table.iter()? {
            let (key, _) = result?;
            if let Some(value) = snapshots_table.get(key.value())? {
                snapshots.push(serde_json::from_slice(value.value())?);
            }
        }

        Ok(snapshots)
    }

    /// Find the active session of a table (within transaction)
    ///
    /// Returns the session_id if the table is occupied.
    pub fn find_active_session_for_table_txn(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        table_id: &str,
    ) -> StorageResult<Option<String>> {
        let active_table = txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        let snapshots_table = txn.open_table(SNAPSHOTS_TABLE)?;

        for result in active_table.iter()? {
            let (key, _) = result?;
            let session_id = key.value();

            if let Some(value) = snapshots_table.get(session_id)? {
                let snapshot: SessionSnapshot = serde_json::from_slice(value.value())?;
                if snapshot.restaurant_id == restaurant_id && snapshot.table_id == table_id {
                    return Ok(Some(session_id.to_string()));
                }
            }
        }

        Ok(None)
    }

    /// Find the active session of a table (read-only, outside transaction)
    pub fn find_active_session_for_table(
        &self,
        restaurant_id: &str,
        table_id: &str,
    ) -> StorageResult<Option<SessionSnapshot>> {
        Ok(self
            .get_active_sessions()?
            .into_iter()
            .find(|s| s.restaurant_id == restaurant_id && s.table_id == table_id))
    }

    // ========== Floor Plan ==========

    /// Insert or replace a dining table
    pub fn upsert_table(&self, table: &DiningTable) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut t = txn.open_table(DINING_TABLES_TABLE)?;
            let value = serde_json::to_vec(table)?;
            t.insert(
                (table.restaurant_id.as_str(), table.id.as_str()),
                value.as_slice(),
            )?;
        }
        txn.commit()?;
        Ok(())
    }

    /// All tables of a restaurant, including archived ones
    pub fn get_tables(&self, restaurant_id: &str) -> StorageResult<Vec<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DINING_TABLES_TABLE)?;

        let mut tables = Vec::new();
        for result in table.range((restaurant_id, "")..)? {
            let (key, value) = result?;
            if key.value().0 != restaurant_id {
                break;
            }
            tables.push(serde_json::from_slice(value.value())?);
        }
        Ok(tables)
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let events_table = read_txn.open_table(EVENTS_TABLE)?;
        let snapshots_table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        let active_table = read_txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        let commands_table = read_txn.open_table(COMMAND_RESPONSES_TABLE)?;
        let seq_table = read_txn.open_table(SEQUENCE_TABLE)?;

        Ok(StorageStats {
            event_count: events_table.len()?,
            snapshot_count: snapshots_table.len()?,
            active_session_count: active_table.len()?,
            processed_command_count: commands_table.len()?,
            current_sequence: seq_table
                .get(SEQUENCE_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0),
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub event_count: u64,
    pub snapshot_count: u64,
    pub active_session_count: u64,
    pub processed_command_count: u64,
    pub current_sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::session::{EventPayload, SessionEventType};

    fn create_test_event(session_id: &str, sequence: u64) -> SessionEvent {
        SessionEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            session_id: session_id.to_string(),
            restaurant_id: "r-1".to_string(),
            timestamp: shared::util::now_millis(),
            client_timestamp: None,
            operator_id: "test_op".to_string(),
            operator_name: "Test Operator".to_string(),
            command_id: uuid::Uuid::new_v4().to_string(),
            event_type: SessionEventType::SessionOpened,
            payload: EventPayload::SessionOpened {
                table_id: "T1".to_string(),
                bill_id: "bill-1".to_string(),
            },
        }
    }

    fn create_test_snapshot(session_id: &str, table_id: &str) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot::new(session_id.to_string());
        snapshot.restaurant_id = "r-1".to_string();
        snapshot.table_id = table_id.to_string();
        snapshot.update_checksum();
        snapshot
    }

    #[test]
    fn test_sequence_roundtrip() {
        let storage = SessionStorage::open_in_memory().unwrap();
        assert_eq!(storage.get_current_sequence().unwrap(), 0);

        let txn = storage.begin_write().unwrap();
        storage.set_sequence(&txn, 5).unwrap();
        assert_eq!(storage.get_current_sequence_txn(&txn).unwrap(), 5);
        txn.commit().unwrap();

        assert_eq!(storage.get_current_sequence().unwrap(), 5);
    }

    #[test]
    fn test_command_response_recorded() {
        let storage = SessionStorage::open_in_memory().unwrap();
        let command_id = "cmd-123";

        assert!(storage.get_command_response(command_id).unwrap().is_none());

        let response = CommandResponse::success(command_id.to_string(), Some("s-1".to_string()))
            .with_item_id(Some("i-1".to_string()));
        let txn = storage.begin_write().unwrap();
        storage.record_command_response(&txn, &response).unwrap();
        assert!(
            storage
                .get_command_response_txn(&txn, command_id)
                .unwrap()
                .is_some()
        );
        txn.commit().unwrap();

        assert_eq!(
            storage.get_command_response(command_id).unwrap(),
            Some(response)
        );
    }

    #[test]
    fn test_uncommitted_writes_are_discarded() {
        let storage = SessionStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_event(&txn, &create_test_event("s-1", 1)).unwrap();
        storage
            .record_command_response(&txn, &CommandResponse::success("cmd-1".to_string(), None))
            .unwrap();
        drop(txn);

        assert!(storage.get_events_for_session("s-1").unwrap().is_empty());
        assert!(storage.get_command_response("cmd-1").unwrap().is_none());
    }

    #[test]
    fn test_event_storage() {
        let storage = SessionStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_event(&txn, &create_test_event("s-1", 1)).unwrap();
        storage.store_event(&txn, &create_test_event("s-1", 2)).unwrap();
        storage.store_event(&txn, &create_test_event("s-2", 3)).unwrap();
        txn.commit().unwrap();

        let events = storage.get_events_for_session("s-1").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[1].sequence, 2);

        let since = storage.get_events_since(1).unwrap();
        assert_eq!(since.len(), 2);
        assert!(since.iter().all(|e| e.sequence > 1));
    }

    #[test]
    fn test_active_sessions_and_table_lookup() {
        let storage = SessionStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage
            .store_snapshot(&txn, &create_test_snapshot("s-1", "T1"))
            .unwrap();
        storage.mark_session_active(&txn, "s-1").unwrap();
        assert_eq!(
            storage
                .find_active_session_for_table_txn(&txn, "r-1", "T1")
                .unwrap(),
            Some("s-1".to_string())
        );
        assert_eq!(
            storage
                .find_active_session_for_table_txn(&txn, "r-2", "T1")
                .unwrap(),
            None
        );
        txn.commit().unwrap();

        assert!(storage.is_session_active("s-1").unwrap());
        assert_eq!(storage.get_active_sessions().unwrap().len(), 1);

        let txn = storage.begin_write().unwrap();
        storage.mark_session_inactive(&txn, "s-1").unwrap();
        txn.commit().unwrap();

        assert!(!storage.is_session_active("s-1").unwrap());
        assert!(storage.find_active_session_for_table("r-1", "T1").unwrap().is_none());
        // Snapshot is retained for audit
        assert!(storage.get_snapshot("s-1").unwrap().is_some());
    }

    #[test]
    fn test_active_events_since_skips_closed_sessions() {
        let storage = SessionStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_event(&txn, &create_test_event("s-1", 1)).unwrap();
        storage.store_event(&txn, &create_test_event("s-2", 2)).unwrap();
        storage.mark_session_active(&txn, "s-2").unwrap();
        txn.commit().unwrap();

        let events = storage.get_active_events_since(0).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].session_id, "s-2");
    }

    #[test]
    fn test_tables_scoped_by_restaurant() {
        let storage = SessionStorage::open_in_memory().unwrap();
        storage.upsert_table(&DiningTable::new("t-1", "r-1", "1")).unwrap();
        storage.upsert_table(&DiningTable::new("t-2", "r-1", "2")).unwrap();
        storage.upsert_table(&DiningTable::new("t-1", "r-2", "A")).unwrap();

        let tables = storage.get_tables("r-1").unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables.iter().all(|t| t.restaurant_id == "r-1"));

        let mut relabeled = DiningTable::new("t-1", "r-1", "1A");
        relabeled.archived = true;
        storage.upsert_table(&relabeled).unwrap();
        let tables = storage.get_tables("r-1").unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables.iter().any(|t| t.label == "1A" && t.archived));
    }

    #[test]
    fn test_stats() {
        let storage = SessionStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.store_event(&txn, &create_test_event("s-1", 1)).unwrap();
        storage.set_sequence(&txn, 1).unwrap();
        txn.commit().unwrap();

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.event_count, 1);
        assert_eq!(stats.current_sequence, 1);
    }
}
