//! Shared types for the table session platform
//!
//! Wire types used by the session server and by every client app (guest
//! menu, waiter, cashier, kitchen display, admin): commands, events,
//! session snapshots, the item status machine, change notifications, the
//! table status projector and the unified error system.

pub mod error;
pub mod models;
pub mod session;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
