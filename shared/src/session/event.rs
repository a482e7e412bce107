//! Session events - immutable facts recorded after command processing

use super::snapshot::CloseReason;
use super::types::{AllocationRecord, OrderItem, ServiceRequest, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Session event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    pub sequence: u64,
    /// Session this event belongs to
    pub session_id: String,
    /// Tenant scope
    pub restaurant_id: String,
    /// Server timestamp (Unix milliseconds), authoritative
    pub timestamp: i64,
    /// Client timestamp (Unix milliseconds), audit only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Operator who triggered this event
    pub operator_id: String,
    /// Operator name (snapshot for audit)
    pub operator_name: String,
    /// Command that triggered this event
    pub command_id: String,
    pub event_type: SessionEventType,
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEventType {
    // Lifecycle
    SessionOpened,
    SessionClosed,

    // Items
    ItemAdded,
    DraftsSubmitted,
    ItemQuantityChanged,
    ItemRemoved,
    ItemVoided,
    ItemsConfirmed,
    ItemsPreparing,
    ItemServed,

    // Table operations
    SessionMoved,
    SessionMergedOut,
    SessionMergedIn,

    // Billing
    BillTotalCorrected,
    PaymentRecorded,

    // Service requests
    ServiceRequestCreated,
    ServiceRequestResolved,
}

impl std::fmt::Display for SessionEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionEventType::SessionOpened => "SESSION_OPENED",
            SessionEventType::SessionClosed => "SESSION_CLOSED",
            SessionEventType::ItemAdded => "ITEM_ADDED",
            SessionEventType::DraftsSubmitted => "DRAFTS_SUBMITTED",
            SessionEventType::ItemQuantityChanged => "ITEM_QUANTITY_CHANGED",
            SessionEventType::ItemRemoved => "ITEM_REMOVED",
            SessionEventType::ItemVoided => "ITEM_VOIDED",
            SessionEventType::ItemsConfirmed => "ITEMS_CONFIRMED",
            SessionEventType::ItemsPreparing => "ITEMS_PREPARING",
            SessionEventType::ItemServed => "ITEM_SERVED",
            SessionEventType::SessionMoved => "SESSION_MOVED",
            SessionEventType::SessionMergedOut => "SESSION_MERGED_OUT",
            SessionEventType::SessionMergedIn => "SESSION_MERGED_IN",
            SessionEventType::BillTotalCorrected => "BILL_TOTAL_CORRECTED",
            SessionEventType::PaymentRecorded => "PAYMENT_RECORDED",
            SessionEventType::ServiceRequestCreated => "SERVICE_REQUEST_CREATED",
            SessionEventType::ServiceRequestResolved => "SERVICE_REQUEST_RESOLVED",
        };
        f.write_str(s)
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    SessionOpened {
        table_id: String,
        /// Server-generated bill id (one ledger per session)
        bill_id: String,
    },
    SessionClosed {
        reason: CloseReason,
        /// Unsent lines cancelled by the close
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        cancelled_item_ids: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    // ========== Items ==========
    ItemAdded {
        /// Complete snapshot of the created line
        item: OrderItem,
    },
    DraftsSubmitted {
        item_ids: Vec<String>,
    },
    ItemQuantityChanged {
        item_id: String,
        from: i32,
        to: i32,
    },
    ItemRemoved {
        item_id: String,
    },
    ItemVoided {
        item_id: String,
        /// Quantity removed by this void
        quantity: i32,
        reason: String,
        /// Whether the whole line moved to `voided`
        full: bool,
    },
    ItemsConfirmed {
        item_ids: Vec<String>,
    },
    ItemsPreparing {
        item_ids: Vec<String>,
    },
    ItemServed {
        item_id: String,
    },

    // ========== Table operations ==========
    SessionMoved {
        from_table_id: String,
        to_table_id: String,
    },
    SessionMergedOut {
        target_session_id: String,
        target_table_id: String,
    },
    SessionMergedIn {
        source_session_id: String,
        source_table_id: String,
        /// Non-terminal lines folded into this session
        items: Vec<OrderItem>,
        /// Pending service requests folded into this session
        #[serde(default)]
        requests: Vec<ServiceRequest>,
    },

    // ========== Billing ==========
    BillTotalCorrected {
        previous: Decimal,
        corrected: Decimal,
    },
    PaymentRecorded {
        payment_group_id: String,
        transactions: Vec<Transaction>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        allocations: Vec<AllocationRecord>,
    },

    // ========== Service requests ==========
    ServiceRequestCreated {
        request: ServiceRequest,
    },
    ServiceRequestResolved {
        request_id: String,
    },
}

impl EventPayload {
    /// The event type this payload belongs to
    pub fn event_type(&self) -> SessionEventType {
        match self {
            Self::SessionOpened { .. } => SessionEventType::SessionOpened,
            Self::SessionClosed { .. } => SessionEventType::SessionClosed,
            Self::ItemAdded { .. } => SessionEventType::ItemAdded,
            Self::DraftsSubmitted { .. } => SessionEventType::DraftsSubmitted,
            Self::ItemQuantityChanged { .. } => SessionEventType::ItemQuantityChanged,
            Self::ItemRemoved { .. } => SessionEventType::ItemRemoved,
            Self::ItemVoided { .. } => SessionEventType::ItemVoided,
            Self::ItemsConfirmed { .. } => SessionEventType::ItemsConfirmed,
            Self::ItemsPreparing { .. } => SessionEventType::ItemsPreparing,
            Self::ItemServed { .. } => SessionEventType::ItemServed,
            Self::SessionMoved { .. } => SessionEventType::SessionMoved,
            Self::SessionMergedOut { .. } => SessionEventType::SessionMergedOut,
            Self::SessionMergedIn { .. } => SessionEventType::SessionMergedIn,
            Self::BillTotalCorrected { .. } => SessionEventType::BillTotalCorrected,
            Self::PaymentRecorded { .. } => SessionEventType::PaymentRecorded,
            Self::ServiceRequestCreated { .. } => SessionEventType::ServiceRequestCreated,
            Self::ServiceRequestResolved { .. } => SessionEventType::ServiceRequestResolved,
        }
    }
}

impl SessionEvent {
    /// Create a new event
    ///
    /// # Arguments
    /// * `sequence` - Global sequence number (authoritative ordering)
    /// * `session_id` - Session this event belongs to
    /// * `restaurant_id` - Tenant scope
    /// * `operator_id` - Operator who triggered this event
    /// * `operator_name` - Operator name (snapshot for audit)
    /// * `command_id` - Command that triggered this event
    /// * `client_timestamp` - Client-provided timestamp (audit only, may have clock skew)
    /// * `payload` - Event payload
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        session_id: String,
        restaurant_id: String,
        operator_id: String,
        operator_name: String,
        command_id: String,
        client_timestamp: Option<i64>,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            session_id,
            restaurant_id,
            // Server timestamp is always set by server
            timestamp: chrono::Utc::now().timestamp_millis(),
            client_timestamp,
            operator_id,
            operator_name,
            command_id,
            event_type: payload.event_type(),
            payload,
        }
    }

    /// Create event from command (extracts metadata including client timestamp)
    pub fn from_command(
        sequence: u64,
        session_id: String,
        command: &super::SessionCommand,
        payload: EventPayload,
    ) -> Self {
        Self::new(
            sequence,
            session_id,
            command.restaurant_id.clone(),
            command.operator_id.clone(),
            command.operator_name.clone(),
            command.command_id.clone(),
            Some(command.timestamp),
            payload,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, SessionCommand, SessionCommandPayload};

    #[test]
    fn test_event_copies_command_metadata() {
        let cmd = SessionCommand::new(
            "r-1",
            "w-1",
            "Ana",
            Role::Waiter,
            SessionCommandPayload::ConfirmPending {
                session_id: "s-1".into(),
            },
        );
        let event = SessionEvent::from_command(
            7,
            "s-1".to_string(),
            &cmd,
            EventPayload::ItemsConfirmed {
                item_ids: vec!["i-1".into()],
            },
        );
        assert_eq!(event.sequence, 7);
        assert_eq!(event.restaurant_id, "r-1");
        assert_eq!(event.command_id, cmd.command_id);
        assert_eq!(event.client_timestamp, Some(cmd.timestamp));
        assert_eq!(event.event_type, SessionEventType::ItemsConfirmed);
    }

    #[test]
    fn test_event_type_display_matches_serde() {
        let json = serde_json::to_string(&SessionEventType::BillTotalCorrected).unwrap();
        assert_eq!(
            json,
            format!("\"{}\"", SessionEventType::BillTotalCorrected)
        );
    }
}
