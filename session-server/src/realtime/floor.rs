//! Floor plan projection over a reconciled restaurant view

use serde::Serialize;
use shared::models::DiningTable;
use shared::session::{DisplayStatus, Role, SessionSnapshot, TransferMode, project};

/// Display row of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table_id: String,
    pub label: String,
    pub status: DisplayStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Project every table of the floor for `role`
///
/// Archived tables are hidden unless a session still sits on them. Sessions
/// on tables missing from the floor plan get a row labelled by table id.
pub fn project_floor(
    tables: &[DiningTable],
    sessions: &[SessionSnapshot],
    role: Role,
    transfer: Option<&TransferMode>,
) -> Vec<TableStatus> {
    let session_for = |table_id: &str| {
        sessions
            .iter()
            .find(|s| s.is_active() && s.table_id == table_id)
    };

    let mut rows: Vec<TableStatus> = tables
        .iter()
        .filter(|t| !t.archived || session_for(&t.id).is_some())
        .map(|t| row(t, session_for(&t.id), role, transfer))
        .collect();

    for session in sessions.iter().filter(|s| s.is_active()) {
        if !tables.iter().any(|t| t.id == session.table_id) {
            let table = DiningTable::new(&session.table_id, &session.restaurant_id, &session.table_id);
            rows.push(row(&table, Some(session), role, transfer));
        }
    }

    rows.sort_by(|a, b| a.label.cmp(&b.label));
    rows
}

fn row(
    table: &DiningTable,
    session: Option<&SessionSnapshot>,
    role: Role,
    transfer: Option<&TransferMode>,
) -> TableStatus {
    let requests = session.map(|s| s.service_requests.as_slice()).unwrap_or(&[]);
    TableStatus {
        table_id: table.id.clone(),
        label: table.label.clone(),
        status: project(table, session, requests, role, transfer),
        session_id: session.map(|s| s.session_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::{active_session, item, request};
    use rust_decimal_macros::dec;
    use shared::session::{ItemStatus, ServiceRequestKind};

    fn floor() -> Vec<DiningTable> {
        let mut archived = DiningTable::new("T9", "r-1", "9");
        archived.archived = true;
        vec![
            DiningTable::new("T1", "r-1", "1"),
            DiningTable::new("T2", "r-1", "2"),
            archived,
        ]
    }

    #[test]
    fn test_floor_is_role_aware() {
        let mut s = active_session("s-1", "T1", vec![item("i-1", 1, dec!(5.00), ItemStatus::Confirmed)]);
        s.service_requests.push(request("rq-1", ServiceRequestKind::CallWaiter));

        let waiter = project_floor(&floor(), &[s.clone()], Role::Waiter, None);
        assert_eq!(waiter.len(), 2);
        assert_eq!(waiter[0].status, DisplayStatus::CallWaiter);
        assert_eq!(waiter[0].session_id.as_deref(), Some("s-1"));
        assert_eq!(waiter[1].status, DisplayStatus::Empty);

        // The cashier ignores call-waiter requests
        let cashier = project_floor(&floor(), &[s], Role::Cashier, None);
        assert_eq!(cashier[0].status, DisplayStatus::NeedsAttention);
    }

    #[test]
    fn test_unknown_and_archived_tables() {
        let on_archived = active_session("s-1", "T9", vec![]);
        let unknown = active_session("s-2", "patio", vec![]);

        let rows = project_floor(&floor(), &[on_archived, unknown], Role::Waiter, None);
        let ids: Vec<&str> = rows.iter().map(|r| r.table_id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2", "T9", "patio"]);
        assert_eq!(rows[3].status, DisplayStatus::Occupied);
    }

    #[test]
    fn test_transfer_mode_marks_targets() {
        let s = active_session("s-1", "T1", vec![]);
        let mode = TransferMode {
            source_table_id: Some("T1".to_string()),
        };

        let rows = project_floor(&floor(), &[s], Role::Waiter, Some(&mode));
        assert_eq!(rows[0].status, DisplayStatus::TransferSource);
        assert_eq!(rows[1].status, DisplayStatus::MoveTarget);
    }
}
