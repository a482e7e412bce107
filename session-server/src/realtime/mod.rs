//! Realtime reconciliation
//!
//! ```text
//! ChangeFeed(scope) ──► Reconciler task (one per scope)
//!                         ├─ refetch whole scope from SliceSource
//!                         ├─ re-apply pending optimistic patches
//!                         └─ watch<Arc<ReconciledView>> ──► observers
//! ```
//!
//! Every notification is a refetch cue. The reconciler never patches its
//! authoritative state from notification payloads, so duplicated or
//! reordered notifications converge on the same view.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use shared::session::{SessionSnapshot, SubscriptionScope};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::sessions::{ChangeFeed, SessionsManager};

mod floor;
mod reconciler;

pub use floor::{TableStatus, project_floor};
pub use reconciler::{
    OptimisticPatch, PatchOp, ReconcileInput, ReconciledView, ReconcilerHandle, spawn_reconciler,
};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to fetch {scope}: {message}")]
    Fetch { scope: String, message: String },

    #[error("Reconciler for {0} has stopped")]
    Closed(String),
}

impl From<ReconcileError> for shared::error::AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Fetch { .. } => Self::database(err.to_string()),
            ReconcileError::Closed(_) => Self::internal(err.to_string()),
        }
    }
}

/// Authoritative source of a scope's sessions
#[async_trait]
pub trait SliceSource: Send + Sync + 'static {
    async fn fetch(&self, scope: &SubscriptionScope) -> Result<Vec<SessionSnapshot>, ReconcileError>;
}

/// Reads slices straight from the session store
#[derive(Debug, Clone)]
pub struct StorageSliceSource {
    manager: SessionsManager,
}

impl StorageSliceSource {
    pub fn new(manager: SessionsManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl SliceSource for StorageSliceSource {
    async fn fetch(&self, scope: &SubscriptionScope) -> Result<Vec<SessionSnapshot>, ReconcileError> {
        let manager = self.manager.clone();
        let owned = scope.clone();
        let fetch_error = |message: String| ReconcileError::Fetch {
            scope: scope.to_string(),
            message,
        };

        // redb reads block; keep them off the runtime threads
        let result = tokio::task::spawn_blocking(move || match &owned {
            SubscriptionScope::Session(id) => manager
                .get_snapshot(id)
                .map(|snapshot| snapshot.into_iter().collect()),
            SubscriptionScope::Restaurant(id) => manager.get_active_sessions(id),
        })
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

        result.map_err(|e| fetch_error(e.to_string()))
    }
}

struct Slot {
    handle: ReconcilerHandle,
    last_used: Instant,
}

/// One reconciler per subscription scope, spawned on first use
///
/// Scopes nobody asked for within the idle window are stopped by
/// [`ReconcilerRegistry::reap_idle`].
#[derive(Clone)]
pub struct ReconcilerRegistry {
    feed: ChangeFeed,
    source: Arc<dyn SliceSource>,
    reconcilers: Arc<DashMap<SubscriptionScope, Slot>>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for ReconcilerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcilerRegistry")
            .field("scopes", &self.reconcilers.len())
            .finish()
    }
}

impl ReconcilerRegistry {
    pub fn new(feed: ChangeFeed, source: Arc<dyn SliceSource>, shutdown: CancellationToken) -> Self {
        Self {
            feed,
            source,
            reconcilers: Arc::new(DashMap::new()),
            shutdown,
        }
    }

    /// Handle of the scope's reconciler, spawning it if needed
    ///
    /// Must be called inside a tokio runtime.
    pub fn get_or_spawn(&self, scope: SubscriptionScope) -> ReconcilerHandle {
        if let Some(mut existing) = self.reconcilers.get_mut(&scope)
            && !existing.handle.is_closed()
        {
            existing.last_used = Instant::now();
            return existing.handle.clone();
        }

        let slot = self
            .reconcilers
            .entry(scope.clone())
            .and_modify(|slot| {
                if slot.handle.is_closed() {
                    slot.handle = self.spawn(scope.clone());
                }
                slot.last_used = Instant::now();
            })
            .or_insert_with(|| Slot {
                handle: self.spawn(scope.clone()),
                last_used: Instant::now(),
            });
        slot.handle.clone()
    }

    /// Handle of a running reconciler, without spawning one
    pub fn get(&self, scope: &SubscriptionScope) -> Option<ReconcilerHandle> {
        let mut slot = self.reconcilers.get_mut(scope)?;
        if slot.handle.is_closed() {
            return None;
        }
        slot.last_used = Instant::now();
        Some(slot.handle.clone())
    }

    fn spawn(&self, scope: SubscriptionScope) -> ReconcilerHandle {
        let subscription = self.feed.subscribe(scope.clone());
        spawn_reconciler(
            scope,
            self.source.clone(),
            subscription,
            self.shutdown.child_token(),
        )
    }

    /// Stop and forget a scope's reconciler
    pub fn remove(&self, scope: &SubscriptionScope) -> bool {
        match self.reconcilers.remove(scope) {
            Some((_, slot)) => {
                slot.handle.shutdown();
                true
            }
            None => false,
        }
    }

    /// Stop reconcilers unused for longer than `max_idle`, and drop dead ones
    ///
    /// Returns how many were removed.
    pub fn reap_idle(&self, max_idle: Duration) -> usize {
        let before = self.reconcilers.len();
        self.reconcilers.retain(|scope, slot| {
            let keep = !slot.handle.is_closed() && slot.last_used.elapsed() < max_idle;
            if !keep {
                tracing::debug!(scope = %scope, "Reaping idle reconciler");
                slot.handle.shutdown();
            }
            keep
        });
        before.saturating_sub(self.reconcilers.len())
    }

    /// Periodically reap idle reconcilers until `shutdown` fires
    pub async fn run_reaper(self, max_idle: Duration, shutdown: CancellationToken) {
        tracing::info!(idle_secs = max_idle.as_secs(), "Reconciler reaper started");
        let period = (max_idle / 2).max(Duration::from_secs(1));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(period) => {}
                _ = shutdown.cancelled() => {
                    tracing::info!("Reconciler reaper received shutdown signal");
                    return;
                }
            }

            let reaped = self.reap_idle(max_idle);
            if reaped > 0 {
                tracing::info!(reaped, remaining = self.len(), "Idle reconcilers stopped");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.reconcilers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reconcilers.is_empty()
    }

    /// Stop every reconciler
    pub fn shutdown_all(&self) {
        tracing::info!(count = self.reconcilers.len(), "Stopping reconcilers");
        self.shutdown.cancel();
        self.reconcilers.clear();
    }
}
