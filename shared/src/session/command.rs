//! Session commands - requests from actors to mutate a session

use super::types::{ItemChange, ItemInput, PaymentRequest, Role, ServiceRequestKind};
use serde::{Deserialize, Serialize};

/// Session command envelope
///
/// `command_id` is the idempotency key: resubmitting the same command after a
/// timeout is safe and returns success without applying it twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCommand {
    /// Client-generated unique id
    pub command_id: String,
    /// Tenant scope of the command
    pub restaurant_id: String,
    /// Acting identity (guest device id or staff id)
    pub operator_id: String,
    /// Display name snapshot for audit
    pub operator_name: String,
    /// Asserted role of the actor
    pub role: Role,
    /// Client timestamp (Unix milliseconds, audit only)
    pub timestamp: i64,
    pub payload: SessionCommandPayload,
}

impl SessionCommand {
    pub fn new(
        restaurant_id: impl Into<String>,
        operator_id: impl Into<String>,
        operator_name: impl Into<String>,
        role: Role,
        payload: SessionCommandPayload,
    ) -> Self {
        Self {
            command_id: crate::util::new_id(),
            restaurant_id: restaurant_id.into(),
            operator_id: operator_id.into(),
            operator_name: operator_name.into(),
            role,
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    /// Session the command targets, if it targets an existing one
    pub fn target_session(&self) -> Option<&str> {
        use SessionCommandPayload::*;
        match &self.payload {
            OpenSession { .. } => None,
            CloseSession { session_id, .. }
            | AddItem { session_id, .. }
            | SubmitDrafts { session_id }
            | UpdateQuantity { session_id, .. }
            | RemoveItem { session_id, .. }
            | VoidItem { session_id, .. }
            | ConfirmPending { session_id }
            | StartPreparing { session_id, .. }
            | MarkServed { session_id, .. }
            | BatchUpdate { session_id, .. }
            | MoveSession { session_id, .. }
            | ProcessPayment { session_id, .. }
            | CreateServiceRequest { session_id, .. }
            | ResolveServiceRequest { session_id, .. } => Some(session_id),
            MergeSessions {
                source_session_id, ..
            } => Some(source_session_id),
        }
    }
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionCommandPayload {
    // ========== Lifecycle ==========
    OpenSession {
        table_id: String,
    },
    CloseSession {
        session_id: String,
        /// Staff override: close with outstanding balance, cancelling unsent items
        #[serde(default)]
        force: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Items ==========
    AddItem {
        session_id: String,
        item: ItemInput,
    },
    /// Guest "send cart": all own drafts → pending
    SubmitDrafts {
        session_id: String,
    },
    UpdateQuantity {
        session_id: String,
        item_id: String,
        quantity: i32,
    },
    /// Plain delete, valid only before confirmation
    RemoveItem {
        session_id: String,
        item_id: String,
    },
    VoidItem {
        session_id: String,
        item_id: String,
        reason: String,
        /// Partial void; full line when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quantity: Option<i32>,
    },
    ConfirmPending {
        session_id: String,
    },
    StartPreparing {
        session_id: String,
        /// Limit to these items; all confirmed items when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_ids: Option<Vec<String>>,
    },
    MarkServed {
        session_id: String,
        item_id: String,
    },
    BatchUpdate {
        session_id: String,
        changes: Vec<ItemChange>,
        /// Shared void reason for reductions of confirmed-or-later items
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Table operations ==========
    MoveSession {
        session_id: String,
        target_table_id: String,
        /// Optimistic concurrency guard from a transfer plan
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_sequence: Option<u64>,
    },
    MergeSessions {
        source_session_id: String,
        target_session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_source_sequence: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_target_sequence: Option<u64>,
    },

    // ========== Billing ==========
    ProcessPayment {
        session_id: String,
        payment: PaymentRequest,
    },

    // ========== Service requests ==========
    CreateServiceRequest {
        session_id: String,
        kind: ServiceRequestKind,
    },
    ResolveServiceRequest {
        session_id: String,
        request_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let json = r#"{
            "command_id": "c-1",
            "restaurant_id": "r-1",
            "operator_id": "w-1",
            "operator_name": "Ana",
            "role": "waiter",
            "timestamp": 0,
            "payload": {"type": "VOID_ITEM", "session_id": "s-1", "item_id": "i-1", "reason": "customer complaint"}
        }"#;
        let cmd: SessionCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.role, Role::Waiter);
        match cmd.payload {
            SessionCommandPayload::VoidItem {
                ref reason,
                quantity,
                ..
            } => {
                assert_eq!(reason, "customer complaint");
                assert_eq!(quantity, None);
            }
            _ => panic!("Expected VoidItem"),
        }
        assert_eq!(cmd.target_session(), Some("s-1"));
    }

    #[test]
    fn test_close_defaults_to_not_forced() {
        let json = r#"{"type": "CLOSE_SESSION", "session_id": "s-1"}"#;
        let payload: SessionCommandPayload = serde_json::from_str(json).unwrap();
        assert!(matches!(
            payload,
            SessionCommandPayload::CloseSession { force: false, .. }
        ));
    }

    #[test]
    fn test_new_assigns_unique_command_ids() {
        let a = SessionCommand::new(
            "r-1",
            "g-1",
            "Guest",
            Role::Guest,
            SessionCommandPayload::OpenSession {
                table_id: "t-1".into(),
            },
        );
        let b = SessionCommand::new(
            "r-1",
            "g-1",
            "Guest",
            Role::Guest,
            SessionCommandPayload::OpenSession {
                table_id: "t-1".into(),
            },
        );
        assert_ne!(a.command_id, b.command_id);
        assert_eq!(a.target_session(), None);
    }
}
