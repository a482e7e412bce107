//! Change notifications - refetch cues derived from committed events
//!
//! A notification never carries authoritative row data. Receivers treat every
//! notification as "the scope is dirty" and refetch the whole scope, which
//! makes delivery order and duplication irrelevant.

use super::event::{EventPayload, SessionEvent};
use serde::{Deserialize, Serialize};

/// Logical table a change touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    OrderItems,
    Sessions,
    ServiceRequests,
}

/// Row operation; `All` is the wildcard "anything may have changed"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "*")]
    All,
}

/// `{ table, event, row_filter }` change cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub table: ChangeTable,
    pub event: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Sequence of the originating event (0 for synthetic resyncs)
    pub sequence: u64,
}

impl ChangeNotification {
    fn for_event(event: &SessionEvent, table: ChangeTable, kind: ChangeKind) -> Self {
        Self {
            table,
            event: kind,
            restaurant_id: Some(event.restaurant_id.clone()),
            session_id: Some(event.session_id.clone()),
            sequence: event.sequence,
        }
    }

    /// Derive the notifications a committed event produces
    pub fn from_event(event: &SessionEvent) -> Vec<Self> {
        use ChangeKind::*;
        use ChangeTable::*;

        let kinds: Vec<(ChangeTable, ChangeKind)> = match &event.payload {
            EventPayload::SessionOpened { .. } => vec![(Sessions, Insert)],
            EventPayload::SessionClosed {
                cancelled_item_ids, ..
            } => {
                let mut v = vec![(Sessions, Update)];
                if !cancelled_item_ids.is_empty() {
                    v.push((OrderItems, Update));
                }
                v
            }
            EventPayload::ItemAdded { .. } => vec![(OrderItems, Insert)],
            EventPayload::ItemRemoved { .. } => vec![(OrderItems, Delete)],
            EventPayload::DraftsSubmitted { .. }
            | EventPayload::ItemQuantityChanged { .. }
            | EventPayload::ItemVoided { .. }
            | EventPayload::ItemsConfirmed { .. }
            | EventPayload::ItemsPreparing { .. }
            | EventPayload::ItemServed { .. } => vec![(OrderItems, Update)],
            EventPayload::SessionMoved { .. } => vec![(Sessions, Update)],
            EventPayload::SessionMergedOut { .. } => {
                vec![(Sessions, Update), (OrderItems, Delete), (ServiceRequests, Delete)]
            }
            EventPayload::SessionMergedIn { requests, .. } => {
                let mut v = vec![(Sessions, Update), (OrderItems, Insert)];
                if !requests.is_empty() {
                    v.push((ServiceRequests, Insert));
                }
                v
            }
            EventPayload::BillTotalCorrected { .. } | EventPayload::PaymentRecorded { .. } => {
                vec![(Sessions, Update)]
            }
            EventPayload::ServiceRequestCreated { .. } => vec![(ServiceRequests, Insert)],
            EventPayload::ServiceRequestResolved { .. } => vec![(ServiceRequests, Update)],
        };

        kinds
            .into_iter()
            .map(|(table, kind)| Self::for_event(event, table, kind))
            .collect()
    }

    /// Synthetic wildcard for a scope (lost notifications, reconnects)
    pub fn resync(scope: &SubscriptionScope) -> Self {
        let (restaurant_id, session_id) = match scope {
            SubscriptionScope::Session(id) => (None, Some(id.clone())),
            SubscriptionScope::Restaurant(id) => (Some(id.clone()), None),
        };
        Self {
            table: ChangeTable::Sessions,
            event: ChangeKind::All,
            restaurant_id,
            session_id,
            sequence: 0,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.event == ChangeKind::All
    }
}

/// Subscription key of a change stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SubscriptionScope {
    /// Cart-level changes of one session
    Session(String),
    /// Kitchen-wide and table-status-wide changes of one restaurant
    Restaurant(String),
}

impl SubscriptionScope {
    pub fn matches(&self, n: &ChangeNotification) -> bool {
        match self {
            Self::Session(id) => n.session_id.as_deref() == Some(id.as_str()),
            Self::Restaurant(id) => n.restaurant_id.as_deref() == Some(id.as_str()),
        }
    }
}

impl std::fmt::Display for SubscriptionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(id) => write!(f, "session:{id}"),
            Self::Restaurant(id) => write!(f, "restaurant:{id}"),
        }
    }
}
