//! Table Session Event Sourcing Module
//!
//! This module implements the table session core using event sourcing:
//!
//! - **manager**: Core SessionsManager for command processing and event generation
//! - **storage**: redb-based persistence layer for events, snapshots, and indices
//! - **actions / appliers**: command validation and pure event application
//! - **transfer**: two-phase move / merge between tables
//! - **feed**: scoped change notifications for realtime subscribers
//! - **sync**: Reconnection synchronization API
//! - **verify_scheduler**: periodic snapshot drift detection
//!
//! # Architecture
//!
//! ```text
//! Command → SessionsManager → Event(s) → Storage (redb)
//!                 ↓                           ↓
//!             Broadcast               Snapshot Update
//!                 ↓
//!     ChangeFeed → Reconcilers / SSE
//! ```
//!
//! # Data Flow
//!
//! 1. Client sends SessionCommand over HTTP
//! 2. SessionsManager validates the command against the current snapshots
//! 3. SessionEvent(s) are generated with global sequences
//! 4. Events and snapshots are persisted in one redb transaction
//! 5. Events are broadcast to all subscribers
//! 6. CommandResponse is returned to client

pub mod actions;
pub mod appliers;
pub mod feed;
pub mod manager;
pub mod money;
pub mod storage;
pub mod sync;
pub mod traits;
pub mod transfer;
pub mod verify_scheduler;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use feed::{ChangeFeed, ChangeSubscription};
pub use manager::{DEFAULT_EVENT_CHANNEL_CAPACITY, ManagerError, ManagerResult, SessionsManager};
pub use storage::{SessionStorage, StorageError};
pub use sync::{SyncRequest, SyncResponse, SyncService};
pub use traits::SessionError;
pub use transfer::{TransferActor, TransferCoordinator, TransferError, TransferKind, TransferPlan};
pub use verify_scheduler::{VerifyReport, VerifyScheduler};

// Re-export shared types for convenience
pub use shared::session::{
    CommandError, CommandErrorCode, CommandResponse, EventPayload, SessionCommand,
    SessionCommandPayload, SessionEvent, SessionEventType, SessionSnapshot, SessionStatus,
};
