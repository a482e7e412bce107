//! Table status projection
//!
//! Pure, role-aware derivation of one display status per table from the
//! table, its session and its service requests. No side effects: the same
//! inputs always yield the same status.

use super::snapshot::SessionSnapshot;
use super::types::{ItemStatus, OrderItem, Role, ServiceRequest, ServiceRequestKind};
use crate::models::DiningTable;
use serde::{Deserialize, Serialize};

/// Display status of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    /// No active session
    Empty,
    /// Seated, nothing ordered yet
    Occupied,
    /// Items in flight that need nothing from this role
    Ordering,
    /// Everything served
    Dining,
    /// Kitchen is cooking
    Cooking,
    /// Role-specific attention (pending for waiters, confirmed for cashier and kitchen)
    NeedsAttention,
    CallWaiter,
    BillRequested,

    // Transfer mode
    /// Selected transfer source, locked from being a target
    TransferSource,
    /// Selectable as a transfer source
    TransferCandidate,
    /// Valid target that already has a session (merge)
    MergeTarget,
    /// Valid target without a session (move)
    MoveTarget,
}

/// Pending transfer interaction on the floor plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMode {
    /// Selected source table; `None` while the user is still choosing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table_id: Option<String>,
}

/// Derive the display status of `table` for `role`
///
/// Priority, highest first: transfer mode, relevant service request,
/// role-specific attention, cooking, dining, ordering, occupied, empty.
pub fn project(
    table: &DiningTable,
    session: Option<&SessionSnapshot>,
    service_requests: &[ServiceRequest],
    role: Role,
    transfer: Option<&TransferMode>,
) -> DisplayStatus {
    let session = session.filter(|s| s.is_active() && s.table_id == table.id);

    if let Some(mode) = transfer {
        return project_transfer(table, session.is_some(), mode);
    }

    let Some(session) = session else {
        return DisplayStatus::Empty;
    };

    if let Some(status) = request_status(service_requests, role) {
        return status;
    }

    let visible: Vec<&OrderItem> = session
        .active_items()
        .filter(|i| !(role.is_staff() && i.status == ItemStatus::Draft))
        .collect();

    let has = |status: ItemStatus| visible.iter().any(|i| i.status == status);

    let needs_attention = match role {
        Role::Waiter => has(ItemStatus::Pending),
        Role::Cashier | Role::Kitchen => has(ItemStatus::Confirmed),
        Role::Admin => has(ItemStatus::Pending) || has(ItemStatus::Confirmed),
        Role::Guest => false,
    };
    if needs_attention {
        return DisplayStatus::NeedsAttention;
    }

    if has(ItemStatus::Preparing) {
        return DisplayStatus::Cooking;
    }

    if visible.is_empty() {
        return DisplayStatus::Occupied;
    }

    if visible.iter().all(|i| i.status == ItemStatus::Served) {
        DisplayStatus::Dining
    } else {
        DisplayStatus::Ordering
    }
}

fn project_transfer(table: &DiningTable, has_session: bool, mode: &TransferMode) -> DisplayStatus {
    match mode.source_table_id.as_deref() {
        Some(source) if source == table.id => DisplayStatus::TransferSource,
        Some(_) if has_session => DisplayStatus::MergeTarget,
        Some(_) => DisplayStatus::MoveTarget,
        None if has_session => DisplayStatus::TransferCandidate,
        None => DisplayStatus::Empty,
    }
}

fn request_status(requests: &[ServiceRequest], role: Role) -> Option<DisplayStatus> {
    let relevant = |kind: ServiceRequestKind| match role {
        Role::Waiter | Role::Admin => true,
        Role::Cashier => kind == ServiceRequestKind::BillRequest,
        Role::Kitchen | Role::Guest => false,
    };

    let mut pending = requests
        .iter()
        .filter(|r| r.is_pending() && relevant(r.kind))
        .map(|r| r.kind)
        .peekable();
    pending.peek()?;

    if pending.any(|k| k == ServiceRequestKind::BillRequest) {
        Some(DisplayStatus::BillRequested)
    } else {
        Some(DisplayStatus::CallWaiter)
    }
}
