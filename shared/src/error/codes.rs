//! Unified error codes for the session platform
//!
//! This module defines all error codes used across session-server and the
//! client apps. Error codes are organized by category:
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 4xxx: Session / order item errors
//! - 5xxx: Payment errors
//! - 7xxx: Table / transfer errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Value is out of range
    ValueOutOfRange = 8,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role is required
    RoleRequired = 2002,

    // ==================== 4xxx: Session ====================
    /// Session not found
    SessionNotFound = 4001,
    /// Session is already closed
    SessionClosed = 4002,
    /// Order item not found
    ItemNotFound = 4003,
    /// Illegal item status transition
    IllegalTransition = 4004,
    /// Item was sent to the kitchen and must be voided
    VoidRequired = 4005,
    /// Void reason is missing
    VoidReasonRequired = 4006,
    /// Quantity is invalid
    InvalidQuantity = 4007,
    /// Batch edit has too many changes
    BatchTooLarge = 4008,
    /// Service request not found
    ServiceRequestNotFound = 4009,
    /// Session has recorded payments
    SessionHasPayments = 4010,
    /// Session still has an outstanding balance
    OutstandingBalance = 4011,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Payment exceeds remaining balance
    PaymentExceedsRemaining = 5002,
    /// Invalid payment method
    PaymentInvalidMethod = 5003,
    /// Invalid payment amount
    PaymentInvalidAmount = 5004,
    /// Too many split parts
    TooManySplitParts = 5005,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is occupied
    TableOccupied = 7002,
    /// Source and target are the same table
    SelfTransfer = 7003,
    /// Transfer was not confirmed by the caller
    TransferNotConfirmed = 7004,
    /// Transfer plan is stale
    TransferStale = 7005,
    /// Table has no active session
    NoActiveSession = 7006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,

    // ==================== 94xx: Storage ====================
    /// Storage full (disk space insufficient)
    StorageFull = 9401,
    /// Out of memory
    OutOfMemory = 9402,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9403,
    /// System busy (IO error, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",

            // Session
            ErrorCode::SessionNotFound => "Session not found",
            ErrorCode::SessionClosed => "Session is already closed",
            ErrorCode::ItemNotFound => "Order item not found",
            ErrorCode::IllegalTransition => "Illegal item status transition",
            ErrorCode::VoidRequired => "Item has been sent to the kitchen and must be voided",
            ErrorCode::VoidReasonRequired => "A void reason is required",
            ErrorCode::InvalidQuantity => "Quantity is invalid",
            ErrorCode::BatchTooLarge => "Batch edit has too many changes",
            ErrorCode::ServiceRequestNotFound => "Service request not found",
            ErrorCode::SessionHasPayments => "Session has recorded payments",
            ErrorCode::OutstandingBalance => "Session still has an outstanding balance",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentExceedsRemaining => "Payment exceeds remaining balance",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::PaymentInvalidAmount => "Invalid payment amount",
            ErrorCode::TooManySplitParts => "Too many split payment parts",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableOccupied => "Table is occupied",
            ErrorCode::SelfTransfer => "Cannot transfer a table onto itself",
            ErrorCode::TransferNotConfirmed => "Transfer must be confirmed before commit",
            ErrorCode::TransferStale => "Transfer plan is out of date",
            ErrorCode::NoActiveSession => "Table has no active session",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",

            // Storage
            ErrorCode::StorageFull => "Storage is full",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::StorageCorrupted => "Storage is corrupted",
            ErrorCode::SystemBusy => "System is busy, retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),

            // Session
            4001 => Ok(ErrorCode::SessionNotFound),
            4002 => Ok(ErrorCode::SessionClosed),
            4003 => Ok(ErrorCode::ItemNotFound),
            4004 => Ok(ErrorCode::IllegalTransition),
            4005 => Ok(ErrorCode::VoidRequired),
            4006 => Ok(ErrorCode::VoidReasonRequired),
            4007 => Ok(ErrorCode::InvalidQuantity),
            4008 => Ok(ErrorCode::BatchTooLarge),
            4009 => Ok(ErrorCode::ServiceRequestNotFound),
            4010 => Ok(ErrorCode::SessionHasPayments),
            4011 => Ok(ErrorCode::OutstandingBalance),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentExceedsRemaining),
            5003 => Ok(ErrorCode::PaymentInvalidMethod),
            5004 => Ok(ErrorCode::PaymentInvalidAmount),
            5005 => Ok(ErrorCode::TooManySplitParts),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableOccupied),
            7003 => Ok(ErrorCode::SelfTransfer),
            7004 => Ok(ErrorCode::TransferNotConfirmed),
            7005 => Ok(ErrorCode::TransferStale),
            7006 => Ok(ErrorCode::NoActiveSession),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            // Storage
            9401 => Ok(ErrorCode::StorageFull),
            9402 => Ok(ErrorCode::OutOfMemory),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
