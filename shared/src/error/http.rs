//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::SessionNotFound
            | Self::ItemNotFound
            | Self::ServiceRequestNotFound
            | Self::TableNotFound
            | Self::NoActiveSession => StatusCode::NOT_FOUND,

            // 409 Conflict (recoverable, usually with a suggested fallback)
            Self::AlreadyExists
            | Self::SessionClosed
            | Self::TableOccupied
            | Self::VoidRequired
            | Self::IllegalTransition
            | Self::SessionHasPayments
            | Self::OutstandingBalance
            | Self::TransferStale => StatusCode::CONFLICT,

            // 403 Forbidden
            Self::PermissionDenied | Self::RoleRequired => StatusCode::FORBIDDEN,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError | Self::SystemBusy => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::StorageFull
            | Self::OutOfMemory
            | Self::StorageCorrupted => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
