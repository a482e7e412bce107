//! ChangeFeed - scoped change notifications derived from committed events
//!
//! ```text
//! SessionsManager ── broadcast<SessionEvent> ──► ChangeSubscription(scope)
//!                                                  ├─ filter by scope
//!                                                  ├─ event → ChangeNotification(s)
//!                                                  └─ lagged → synthetic "*" resync
//! ```
//!
//! Subscribers never receive row data, only refetch cues. A subscriber that
//! falls behind the broadcast buffer gets one wildcard notification in
//! place of everything it missed.

use std::collections::VecDeque;

use futures::Stream;
use shared::session::{ChangeNotification, SessionEvent, SubscriptionScope};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use super::manager::SessionsManager;

/// Source of scoped change subscriptions
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    manager: SessionsManager,
}

impl ChangeFeed {
    pub fn new(manager: SessionsManager) -> Self {
        Self { manager }
    }

    /// Subscribe to changes of one session or one restaurant
    ///
    /// Only events committed after this call are delivered.
    pub fn subscribe(&self, scope: SubscriptionScope) -> ChangeSubscription {
        tracing::debug!(scope = %scope, "Change feed subscription opened");
        ChangeSubscription {
            scope,
            rx: self.manager.subscribe(),
            queued: VecDeque::new(),
        }
    }
}

/// One scoped change stream
pub struct ChangeSubscription {
    scope: SubscriptionScope,
    rx: broadcast::Receiver<SessionEvent>,
    /// Notifications of an event not yet handed out (one event may touch several tables)
    queued: VecDeque<ChangeNotification>,
}

impl std::fmt::Debug for ChangeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSubscription")
            .field("scope", &self.scope)
            .field("queued", &self.queued.len())
            .finish()
    }
}

impl ChangeSubscription {
    pub fn scope(&self) -> &SubscriptionScope {
        &self.scope
    }

    /// Wait for the next notification; `None` once the feed is closed
    pub async fn recv(&mut self) -> Option<ChangeNotification> {
        loop {
            if let Some(n) = self.queued.pop_front() {
                return Some(n);
            }
            match self.rx.recv().await {
                Ok(event) => self.enqueue(&event),
                Err(RecvError::Lagged(n)) => return Some(self.lagged(n)),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next notification if one is ready, without waiting
    pub fn try_recv(&mut self) -> Option<ChangeNotification> {
        loop {
            if let Some(n) = self.queued.pop_front() {
                return Some(n);
            }
            match self.rx.try_recv() {
                Ok(event) => self.enqueue(&event),
                Err(TryRecvError::Lagged(n)) => return Some(self.lagged(n)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Convert into a `Stream` (for SSE)
    pub fn into_stream(self) -> impl Stream<Item = ChangeNotification> + Send {
        futures::stream::unfold(self, |mut sub| async move {
            sub.recv().await.map(|n| (n, sub))
        })
    }

    fn enqueue(&mut self, event: &SessionEvent) {
        self.queued.extend(
            ChangeNotification::from_event(event)
                .into_iter()
                .filter(|n| self.scope.matches(n)),
        );
    }

    fn lagged(&mut self, skipped: u64) -> ChangeNotification {
        tracing::warn!(scope = %self.scope, skipped, "Change subscriber lagged, forcing resync");
        self.queued.clear();
        ChangeNotification::resync(&self.scope)
    }
}
