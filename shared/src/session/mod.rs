//! Session Event Sourcing Module
//!
//! Types for the table session system:
//! - Commands: Requests from actors to mutate a session
//! - Events: Immutable facts recorded after command processing
//! - Snapshots: Computed session state from event stream
//! - Change notifications: refetch cues for the realtime layer
//! - Table status: pure role-aware projection for floor plans

pub mod change;
pub mod command;
pub mod event;
pub mod snapshot;
pub mod table_status;
pub mod types;

// Re-exports
pub use change::{ChangeKind, ChangeNotification, ChangeTable, SubscriptionScope};
pub use command::{SessionCommand, SessionCommandPayload};
pub use event::{EventPayload, SessionEvent, SessionEventType};
pub use snapshot::{CloseReason, SessionSnapshot, SessionStatus};
pub use table_status::{DisplayStatus, TransferMode, project};
pub use types::*;
