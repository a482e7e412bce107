//! Session domain types shared by server and clients

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for monetary comparisons (half a minor currency unit)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

// ============================================================================
// Item status machine
// ============================================================================

/// Order item status
///
/// Forward pipeline: `draft → pending → confirmed → preparing → served`.
/// `voided` and `cancelled` are terminal and reachable sideways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Guest cart entry, not yet visible to staff
    Draft,
    /// Visible to staff, waiting for confirmation
    Pending,
    /// Acknowledged by the waiter, queued for the kitchen
    Confirmed,
    /// Kitchen started cooking
    Preparing,
    /// Handed off to the table
    Served,
    /// Audited cancellation after confirmation
    Voided,
    /// Dropped before reaching the kitchen
    Cancelled,
}

/// Rejected status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: ItemStatus,
    pub to: ItemStatus,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal item transition {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

impl ItemStatus {
    /// Terminal states never change again
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Voided | Self::Cancelled)
    }

    /// Items that have reached the kitchen queue (deletion requires a void)
    pub const fn requires_void(self) -> bool {
        matches!(self, Self::Confirmed | Self::Preparing | Self::Served)
    }

    /// Items visible to staff and counted in the bill
    pub const fn is_billable(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Confirmed | Self::Preparing | Self::Served
        )
    }

    /// Position in the forward pipeline; terminal states have none
    pub const fn stage(self) -> Option<u8> {
        match self {
            Self::Draft => Some(0),
            Self::Pending => Some(1),
            Self::Confirmed => Some(2),
            Self::Preparing => Some(3),
            Self::Served => Some(4),
            Self::Voided | Self::Cancelled => None,
        }
    }

    /// The single transition table for item statuses
    pub const fn can_transition(self, to: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, to),
            (Draft, Pending)
                | (Pending, Confirmed)
                | (Pending, Preparing)
                | (Confirmed, Preparing)
                | (Preparing, Served)
                | (Draft | Pending | Confirmed | Preparing | Served, Voided)
                | (Draft | Pending, Cancelled)
        )
    }

    /// Guarded transition
    pub fn transition(self, to: ItemStatus) -> Result<ItemStatus, IllegalTransition> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(IllegalTransition { from: self, to })
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Served => "served",
            Self::Voided => "voided",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Roles
// ============================================================================

/// Actor role asserted by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Guest,
    Waiter,
    Cashier,
    Kitchen,
    Admin,
}

impl Role {
    pub const fn is_staff(self) -> bool {
        !matches!(self, Self::Guest)
    }

    /// pending → confirmed
    pub const fn can_confirm(self) -> bool {
        matches!(self, Self::Waiter | Self::Cashier | Self::Admin)
    }

    /// confirmed → preparing → served
    pub const fn can_cook(self) -> bool {
        matches!(self, Self::Kitchen | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Guest => "guest",
            Self::Waiter => "waiter",
            Self::Cashier => "cashier",
            Self::Kitchen => "kitchen",
            Self::Admin => "admin",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Order items
// ============================================================================

/// One ordered line within a session
///
/// `unit_price` is captured when the line is created and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Server-assigned id
    pub id: String,
    /// Temporary id assigned by the client that created the line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub status: ItemStatus,
    pub created_by: String,
    pub created_by_role: Role,
    pub created_at: i64,
    pub updated_at: i64,
    /// Quantity removed through partial voids
    #[serde(default)]
    pub voided_quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub void_reason: Option<String>,
}

impl OrderItem {
    /// Contribution of this line to the bill
    pub fn line_total(&self) -> Decimal {
        if self.status.is_billable() {
            self.unit_price * Decimal::from(self.quantity)
        } else {
            Decimal::ZERO
        }
    }
}

/// Item payload for `AddItem`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInput {
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
    /// Catalog price at order time
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    /// Initial status; defaults to draft for guests and pending for staff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

/// One entry of a batch edit; `quantity == 0` removes the line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChange {
    pub item_id: String,
    pub quantity: i32,
}

// ============================================================================
// Service requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRequestKind {
    CallWaiter,
    BillRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRequestStatus {
    Pending,
    Resolved,
}

/// Ad-hoc guest request attached to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: String,
    pub kind: ServiceRequestKind,
    pub status: ServiceRequestStatus,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
}

impl ServiceRequest {
    pub fn is_pending(&self) -> bool {
        self.status == ServiceRequestStatus::Pending
    }
}

// ============================================================================
// Billing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Pos,
    Mixed,
}

/// Which line items a payment portion covers (informational)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAllocation {
    pub item_id: String,
    pub quantity: i32,
}

/// One part of a split payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPart {
    pub method: PaymentMethod,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocation: Vec<ItemAllocation>,
}

/// Payment request for `processPayment`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRequest {
    Single {
        method: PaymentMethod,
        amount: Decimal,
    },
    Split {
        parts: Vec<PaymentPart>,
    },
}

impl PaymentRequest {
    /// Normalized list of parts
    pub fn parts(&self) -> Vec<PaymentPart> {
        match self {
            Self::Single { method, amount } => vec![PaymentPart {
                method: *method,
                amount: *amount,
                allocation: vec![],
            }],
            Self::Split { parts } => parts.clone(),
        }
    }

    /// Sum of all parts
    pub fn total(&self) -> Decimal {
        match self {
            Self::Single { amount, .. } => *amount,
            Self::Split { parts } => parts.iter().map(|p| p.amount).sum(),
        }
    }
}

/// Immutable payment record against a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    /// Parts of one split payment share a group id
    pub payment_group_id: String,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub recorded_by: String,
    pub recorded_at: i64,
}

/// Audit side-record linking a transaction to the items it covered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub transaction_id: String,
    pub items: Vec<ItemAllocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    #[default]
    Unpaid,
    Paid,
}

/// Financial ledger of one session
///
/// The remaining amount is always derived from total and paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub bill_id: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: BillStatus,
}

impl Bill {
    pub fn new(bill_id: impl Into<String>) -> Self {
        Self {
            bill_id: bill_id.into(),
            total_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            status: BillStatus::Unpaid,
        }
    }

    /// `max(total - paid, 0)`
    pub fn remaining(&self) -> Decimal {
        (self.total_amount - self.paid_amount).max(Decimal::ZERO)
    }

    /// Paid covers total within tolerance
    pub fn is_covered(&self) -> bool {
        self.paid_amount >= self.total_amount - MONEY_TOLERANCE
    }
}

/// Result of an accepted payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub success: bool,
    pub bill_id: String,
    pub remaining: Decimal,
    pub fully_paid: bool,
}

// ============================================================================
// Command response
// ============================================================================

/// Command response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Session touched by the command (new id for OpenSession)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Server id of the created line (AddItem)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Payment result (ProcessPayment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentOutcome>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, session_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            session_id,
            item_id: None,
            payment: None,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            session_id: None,
            item_id: None,
            payment: None,
            error: Some(error),
        }
    }

    pub fn with_item_id(mut self, item_id: Option<String>) -> Self {
        self.item_id = item_id;
        self
    }

    pub fn with_payment(mut self, payment: Option<PaymentOutcome>) -> Self {
        self.payment = payment;
        self
    }
}

/// Command error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
    /// Suggested fallback for recoverable conflicts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    SessionNotFound,
    SessionClosed,
    TableOccupied,
    ItemNotFound,
    IllegalTransition,
    VoidRequired,
    VoidReasonRequired,
    PermissionDenied,
    InvalidQuantity,
    InvalidAmount,
    PaymentExceedsRemaining,
    OutstandingBalance,
    SelfTransfer,
    SessionHasPayments,
    TooManySplitParts,
    BatchTooLarge,
    ServiceRequestNotFound,
    StaleTransfer,
    InvalidOperation,
    DuplicateCommand,
    InternalError,
    // Storage errors (maps to ErrorCode 94xx)
    StorageFull,
    OutOfMemory,
    StorageCorrupted,
    SystemBusy,
}

impl CommandErrorCode {
    /// Unified error code for the HTTP boundary
    pub fn error_code(self) -> crate::error::ErrorCode {
        use crate::error::ErrorCode;
        match self {
            Self::SessionNotFound => ErrorCode::SessionNotFound,
            Self::SessionClosed => ErrorCode::SessionClosed,
            Self::TableOccupied => ErrorCode::TableOccupied,
            Self::ItemNotFound => ErrorCode::ItemNotFound,
            Self::IllegalTransition => ErrorCode::IllegalTransition,
            Self::VoidRequired => ErrorCode::VoidRequired,
            Self::VoidReasonRequired => ErrorCode::VoidReasonRequired,
            Self::PermissionDenied => ErrorCode::PermissionDenied,
            Self::InvalidQuantity => ErrorCode::InvalidQuantity,
            Self::InvalidAmount => ErrorCode::PaymentInvalidAmount,
            Self::PaymentExceedsRemaining => ErrorCode::PaymentExceedsRemaining,
            Self::OutstandingBalance => ErrorCode::OutstandingBalance,
            Self::SelfTransfer => ErrorCode::SelfTransfer,
            Self::SessionHasPayments => ErrorCode::SessionHasPayments,
            Self::TooManySplitParts => ErrorCode::TooManySplitParts,
            Self::BatchTooLarge => ErrorCode::BatchTooLarge,
            Self::ServiceRequestNotFound => ErrorCode::ServiceRequestNotFound,
            Self::StaleTransfer => ErrorCode::TransferStale,
            Self::InvalidOperation => ErrorCode::InvalidRequest,
            Self::DuplicateCommand => ErrorCode::AlreadyExists,
            Self::InternalError => ErrorCode::InternalError,
            Self::StorageFull => ErrorCode::StorageFull,
            Self::OutOfMemory => ErrorCode::OutOfMemory,
            Self::StorageCorrupted => ErrorCode::StorageCorrupted,
            Self::SystemBusy => ErrorCode::SystemBusy,
        }
    }
}

impl From<CommandError> for crate::error::AppError {
    fn from(err: CommandError) -> Self {
        let app = crate::error::AppError::with_message(err.code.error_code(), err.message);
        match err.suggestion {
            Some(s) => app.with_suggestion(s),
            None => app,
        }
    }
}
