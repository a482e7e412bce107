//! Per-scope reconciler task
//!
//! Inbound: change notifications (feed) and client inputs (mpsc).
//! Outbound: an immutable `Arc<ReconciledView>` through a watch channel.
//!
//! Optimistic patches and write failures share one rollback path: the
//! authoritative slice is refetched and replaced, then whatever patches are
//! still pending are re-applied on top of it.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::session::{ItemStatus, OrderItem, SessionSnapshot, SubscriptionScope};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::{ReconcileError, SliceSource};
use crate::sessions::ChangeSubscription;

/// Inbound queue depth per reconciler
const INBOX_CAPACITY: usize = 256;

/// Local edit applied before the server acknowledges the write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimisticPatch {
    /// Ties the patch to the write that will confirm or reject it
    pub correlation_id: String,
    pub session_id: String,
    pub op: PatchOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatchOp {
    /// A line created locally; its `client_ref` is the temporary id
    AddItem { item: OrderItem },
    SetQuantity { item_id: String, quantity: i32 },
    RemoveItem { item_id: String },
    SetStatus { item_id: String, status: ItemStatus },
}

#[derive(Debug, Clone)]
pub enum ReconcileInput {
    Optimistic(OptimisticPatch),
    WriteAcked { correlation_id: String },
    WriteFailed { correlation_id: String, error: String },
    Refresh,
}

/// Immutable view published to observers
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledView {
    pub scope: SubscriptionScope,
    /// Authoritative sessions with pending patches applied
    pub sessions: Vec<SessionSnapshot>,
    pub pending_patches: usize,
    /// Bumped on every publish
    pub revision: u64,
    /// Highest event sequence seen in the authoritative slice
    pub last_sequence: u64,
    /// The last refetch failed; `sessions` may be out of date
    pub stale: bool,
}

impl ReconciledView {
    fn empty(scope: SubscriptionScope) -> Self {
        Self {
            scope,
            sessions: Vec::new(),
            pending_patches: 0,
            revision: 0,
            last_sequence: 0,
            stale: false,
        }
    }

    pub fn session(&self, session_id: &str) -> Option<&SessionSnapshot> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }
}

/// Client side of a running reconciler
#[derive(Debug, Clone)]
pub struct ReconcilerHandle {
    scope: SubscriptionScope,
    tx: mpsc::Sender<ReconcileInput>,
    view_rx: watch::Receiver<Arc<ReconciledView>>,
    cancel: CancellationToken,
}

impl ReconcilerHandle {
    pub fn scope(&self) -> &SubscriptionScope {
        &self.scope
    }

    pub async fn apply_optimistic(&self, patch: OptimisticPatch) -> Result<(), ReconcileError> {
        self.send(ReconcileInput::Optimistic(patch)).await
    }

    pub async fn ack(&self, correlation_id: impl Into<String>) -> Result<(), ReconcileError> {
        self.send(ReconcileInput::WriteAcked {
            correlation_id: correlation_id.into(),
        })
        .await
    }

    pub async fn fail(
        &self,
        correlation_id: impl Into<String>,
        error: impl Into<String>,
    ) -> Result<(), ReconcileError> {
        self.send(ReconcileInput::WriteFailed {
            correlation_id: correlation_id.into(),
            error: error.into(),
        })
        .await
    }

    /// Force a refetch of the whole scope
    pub async fn refresh(&self) -> Result<(), ReconcileError> {
        self.send(ReconcileInput::Refresh).await
    }

    /// Latest published view (may still be the empty initial view)
    pub fn view(&self) -> Arc<ReconciledView> {
        self.view_rx.borrow().clone()
    }

    /// Wait until the first authoritative slice has been published
    pub async fn ready(&self) -> Result<Arc<ReconciledView>, ReconcileError> {
        self.wait_for(|v| v.revision > 0).await
    }

    /// Wait until the published view satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&Arc<ReconciledView>) -> bool,
    ) -> Result<Arc<ReconciledView>, ReconcileError> {
        let mut rx = self.view_rx.clone();
        let view = rx
            .wait_for(predicate)
            .await
            .map_err(|_| ReconcileError::Closed(self.scope.to_string()))?;
        Ok(view.clone())
    }

    pub fn subscribe_view(&self) -> watch::Receiver<Arc<ReconciledView>> {
        self.view_rx.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed() || self.cancel.is_cancelled()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn send(&self, input: ReconcileInput) -> Result<(), ReconcileError> {
        self.tx
            .send(input)
            .await
            .map_err(|_| ReconcileError::Closed(self.scope.to_string()))
    }
}

/// Start the reconciler task for `scope`
///
/// The task performs an initial fetch, then runs until `cancel` fires, the
/// feed closes or every handle is dropped.
pub fn spawn_reconciler(
    scope: SubscriptionScope,
    source: Arc<dyn SliceSource>,
    subscription: ChangeSubscription,
    cancel: CancellationToken,
) -> ReconcilerHandle {
    let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
    let (view_tx, view_rx) = watch::channel(Arc::new(ReconciledView::empty(scope.clone())));

    let reconciler = Reconciler {
        scope: scope.clone(),
        source,
        subscription,
        inbox,
        view_tx,
        cancel: cancel.clone(),
        authoritative: Vec::new(),
        patches: Vec::new(),
        revision: 0,
        stale: false,
    };
    tokio::spawn(reconciler.run());

    ReconcilerHandle {
        scope,
        tx,
        view_rx,
        cancel,
    }
}

struct Reconciler {
    scope: SubscriptionScope,
    source: Arc<dyn SliceSource>,
    subscription: ChangeSubscription,
    inbox: mpsc::Receiver<ReconcileInput>,
    view_tx: watch::Sender<Arc<ReconciledView>>,
    cancel: CancellationToken,
    authoritative: Vec<SessionSnapshot>,
    /// Pending patches in the order they were applied
    patches: Vec<OptimisticPatch>,
    revision: u64,
    stale: bool,
}

impl Reconciler {
    async fn run(mut self) {
        tracing::debug!(scope = %self.scope, "Reconciler started");
        self.refetch().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                notification = self.subscription.recv() => match notification {
                    Some(n) => {
                        tracing::trace!(scope = %self.scope, sequence = n.sequence, "Change cue");
                        // Coalesce a burst into one refetch
                        while self.subscription.try_recv().is_some() {}
                        self.refetch().await;
                    }
                    None => {
                        tracing::info!(scope = %self.scope, "Change feed closed");
                        break;
                    }
                },
                input = self.inbox.recv() => match input {
                    Some(input) => self.handle(input).await,
                    None => break,
                },
            }
        }

        self.cancel.cancel();
        tracing::debug!(scope = %self.scope, "Reconciler stopped");
    }

    async fn handle(&mut self, input: ReconcileInput) {
        match input {
            ReconcileInput::Optimistic(patch) => {
                self.patches.retain(|p| p.correlation_id != patch.correlation_id);
                self.patches.push(patch);
                self.publish();
            }
            ReconcileInput::WriteAcked { correlation_id } => {
                self.patches.retain(|p| p.correlation_id != correlation_id);
                self.refetch().await;
            }
            ReconcileInput::WriteFailed {
                correlation_id,
                error,
            } => {
                tracing::warn!(
                    scope = %self.scope,
                    correlation_id = %correlation_id,
                    error = %error,
                    "Write failed, discarding optimistic patch"
                );
                self.patches.retain(|p| p.correlation_id != correlation_id);
                self.refetch().await;
            }
            ReconcileInput::Refresh => self.refetch().await,
        }
    }

    /// Replace the authoritative slice, then publish
    async fn refetch(&mut self) {
        match self.source.fetch(&self.scope).await {
            Ok(sessions) => {
                self.authoritative = sessions;
                self.stale = false;
                self.drop_superseded();
            }
            Err(e) => {
                tracing::warn!(scope = %self.scope, error = %e, "Refetch failed, keeping last view");
                self.stale = true;
            }
        }
        self.publish();
    }

    /// Local lines whose server row has arrived are no longer optimistic
    fn drop_superseded(&mut self) {
        let arrived: HashSet<(&str, &str)> = self
            .authoritative
            .iter()
            .flat_map(|s| {
                s.items.iter().filter_map(move |i| {
                    i.client_ref
                        .as_deref()
                        .map(|r| (s.session_id.as_str(), r))
                })
            })
            .collect();

        self.patches.retain(|p| match &p.op {
            PatchOp::AddItem { item } => !item
                .client_ref
                .as_deref()
                .is_some_and(|r| arrived.contains(&(p.session_id.as_str(), r))),
            _ => true,
        });
    }

    fn publish(&mut self) {
        let mut sessions = self.authoritative.clone();
        for patch in &self.patches {
            if let Some(session) = sessions.iter_mut().find(|s| s.session_id == patch.session_id) {
                apply_patch(session, &patch.op);
            }
        }

        self.revision += 1;
        let view = ReconciledView {
            scope: self.scope.clone(),
            last_sequence: self
                .authoritative
                .iter()
                .map(|s| s.last_sequence)
                .max()
                .unwrap_or(0),
            sessions,
            pending_patches: self.patches.len(),
            revision: self.revision,
            stale: self.stale,
        };
        self.view_tx.send_replace(Arc::new(view));
    }
}

fn apply_patch(session: &mut SessionSnapshot, op: &PatchOp) {
    match op {
        PatchOp::AddItem { item } => {
            let exists = session.items.iter().any(|i| {
                i.id == item.id || (item.client_ref.is_some() && i.client_ref == item.client_ref)
            });
            if !exists {
                session.items.push(item.clone());
            }
        }
        PatchOp::SetQuantity { item_id, quantity } => {
            if let Some(item) = session.find_item_mut(item_id) {
                item.quantity = *quantity;
            }
        }
        PatchOp::RemoveItem { item_id } => session.items.retain(|i| &i.id != item_id),
        PatchOp::SetStatus { item_id, status } => {
            if let Some(item) = session.find_item_mut(item_id) {
                item.status = *status;
            }
        }
    }
}
