//! Synchronization API for client reconnection
//!
//! This module provides the sync protocol for clients reconnecting after
//! a disconnect. It allows clients to catch up on missed events.
//!
//! # Protocol
//!
//! 1. Client reconnects with last known sequence and server epoch
//! 2. Server calculates gap
//! 3. If gap is small, return incremental events
//! 4. If gap is large or the epoch changed, return full sync with all
//!    active sessions of the restaurant
//!
//! Events are ordered by sequence. The sequence is global across
//! restaurants, so a restaurant-scoped incremental response may skip
//! numbers.

use super::manager::{ManagerError, SessionsManager};
use serde::{Deserialize, Serialize};
use shared::session::{SessionEvent, SessionSnapshot};

/// Maximum events to return in incremental sync
/// If gap exceeds this, full sync is returned instead
const MAX_INCREMENTAL_EVENTS: usize = 1000;

/// Sync request from client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    pub restaurant_id: String,
    /// Client's last known sequence number
    pub since_sequence: u64,
    /// Epoch the client last synced against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<String>,
}

/// Sync response to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Events since the requested sequence
    pub events: Vec<SessionEvent>,
    /// Current active session snapshots
    pub active_sessions: Vec<SessionSnapshot>,
    /// Server's current sequence number
    pub server_sequence: u64,
    /// Whether the client must replace its state
    pub requires_full_sync: bool,
    /// Server instance epoch (UUID generated on startup)
    pub server_epoch: String,
}

impl SyncResponse {
    /// Create a full sync response
    pub fn full_sync(
        active_sessions: Vec<SessionSnapshot>,
        server_sequence: u64,
        epoch: String,
    ) -> Self {
        Self {
            events: vec![],
            active_sessions,
            server_sequence,
            requires_full_sync: true,
            server_epoch: epoch,
        }
    }

    /// Create an incremental sync response
    pub fn incremental(events: Vec<SessionEvent>, server_sequence: u64, epoch: String) -> Self {
        Self {
            events,
            active_sessions: vec![],
            server_sequence,
            requires_full_sync: false,
            server_epoch: epoch,
        }
    }
}

/// Sync service for handling reconnection
#[derive(Debug, Clone)]
pub struct SyncService {
    manager: SessionsManager,
}

impl SyncService {
    pub fn new(manager: SessionsManager) -> Self {
        Self { manager }
    }

    /// Handle a sync request
    pub fn sync(&self, request: &SyncRequest) -> Result<SyncResponse, ManagerError> {
        let server_sequence = self.manager.get_current_sequence()?;
        let epoch = self.manager.epoch().to_string();

        let epoch_changed = request
            .epoch
            .as_deref()
            .is_some_and(|client_epoch| client_epoch != epoch);
        if epoch_changed {
            tracing::info!(
                restaurant_id = %request.restaurant_id,
                "Client epoch is stale, sending full sync"
            );
            return self.full_sync(&request.restaurant_id, server_sequence, epoch);
        }

        if request.since_sequence >= server_sequence {
            return Ok(SyncResponse::incremental(vec![], server_sequence, epoch));
        }

        let gap = server_sequence - request.since_sequence;
        if gap > MAX_INCREMENTAL_EVENTS as u64 {
            return self.full_sync(&request.restaurant_id, server_sequence, epoch);
        }

        let events: Vec<SessionEvent> = self
            .manager
            .get_active_events_since(request.since_sequence)?
            .into_iter()
            .filter(|e| e.restaurant_id == request.restaurant_id)
            .collect();

        Ok(SyncResponse::incremental(events, server_sequence, epoch))
    }

    fn full_sync(
        &self,
        restaurant_id: &str,
        server_sequence: u64,
        epoch: String,
    ) -> Result<SyncResponse, ManagerError> {
        let active_sessions = self.manager.get_active_sessions(restaurant_id)?;
        Ok(SyncResponse::full_sync(active_sessions, server_sequence, epoch))
    }

    /// Verify snapshot integrity by rebuilding from events
    pub fn verify_snapshot(&self, session_id: &str) -> Result<bool, ManagerError> {
        let Some(stored) = self.manager.get_snapshot(session_id)? else {
            return Ok(false);
        };
        let rebuilt = self.manager.rebuild_snapshot(session_id)?;

        Ok(stored.state_checksum == rebuilt.state_checksum && stored.items == rebuilt.items)
    }

    /// Verify all active session snapshots of a restaurant
    pub fn verify_all_snapshots(
        &self,
        restaurant_id: &str,
    ) -> Result<Vec<(String, bool)>, ManagerError> {
        let mut results = Vec::new();
        for session in self.manager.get_active_sessions(restaurant_id)? {
            let is_valid = self.verify_snapshot(&session.session_id)?;
            if !is_valid {
                tracing::warn!(session_id = %session.session_id, "Snapshot drifted from event log");
            }
            results.push((session.session_id, is_valid));
        }
        Ok(results)
    }
}
