//! Session snapshot - computed state from event stream
//!
//! The snapshot includes a `state_checksum` field for drift detection.
//! Clients can compare their locally computed checksum with the server's
//! to detect if the reducer logic has diverged.

use super::types::{
    AllocationRecord, Bill, ItemStatus, OrderItem, ServiceRequest, Transaction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Session status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Closed,
}

/// Why a session was closed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloseReason {
    /// Bill fully paid
    Paid,
    /// Explicit staff close (zero balance or forced)
    StaffOverride,
    /// Folded into another session
    Merged,
}

/// Session snapshot - computed from event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub restaurant_id: String,
    /// Current table (repointed by a move)
    pub table_id: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<CloseReason>,
    /// Target session when closed by a merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_into: Option<String>,
    /// All lines, terminal ones retained for audit
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub service_requests: Vec<ServiceRequest>,
    pub bill: Bill,
    /// Immutable payment records
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Item allocation side-records (informational)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocations: Vec<AllocationRecord>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<i64>,
    /// Last applied event sequence
    pub last_sequence: u64,
    /// State checksum for drift detection (hex string)
    /// Computed from: items.len, bill total, paid amount, last_sequence, status
    #[serde(default)]
    pub state_checksum: String,
}

impl SessionSnapshot {
    /// Create a new empty session
    pub fn new(session_id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let mut snapshot = Self {
            session_id,
            restaurant_id: String::new(),
            table_id: String::new(),
            status: SessionStatus::Active,
            close_reason: None,
            merged_into: None,
            items: Vec::new(),
            service_requests: Vec::new(),
            bill: Bill::new(String::new()),
            transactions: Vec::new(),
            allocations: Vec::new(),
            created_at: now,
            updated_at: now,
            closed_at: None,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn find_item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// Non-terminal lines
    pub fn active_items(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(|i| !i.status.is_terminal())
    }

    pub fn items_with_status(&self, status: ItemStatus) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(move |i| i.status == status)
    }

    pub fn pending_requests(&self) -> impl Iterator<Item = &ServiceRequest> {
        self.service_requests.iter().filter(|r| r.is_pending())
    }

    pub fn has_payments(&self) -> bool {
        !self.transactions.is_empty()
    }

    /// Live sum of `quantity × unit_price` over billable lines
    ///
    /// This is the single source of truth for what is owed.
    pub fn live_total(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Compute state checksum for drift detection
    ///
    /// Returns a 16-character hex string over item count, bill total, paid
    /// amount, last sequence and status.
    pub fn compute_checksum(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();
        self.items.len().hash(&mut hasher);
        // Decimal hashing is scale-independent (10.0 == 10.00)
        self.bill.total_amount.hash(&mut hasher);
        self.bill.paid_amount.hash(&mut hasher);
        self.last_sequence.hash(&mut hasher);
        (self.status as u8).hash(&mut hasher);

        format!("{:016x}", hasher.finish())
    }

    /// Update the state_checksum field based on current state
    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    /// Returns false if drift detected
    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::new(String::new())
    }
}
