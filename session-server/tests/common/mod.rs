//! Shared helpers for integration tests

#![allow(dead_code)]

use rust_decimal::Decimal;
use session_server::SessionsManager;
use shared::session::{
    CommandResponse, ItemInput, PaymentMethod, PaymentRequest, Role, SessionCommand,
    SessionCommandPayload,
};
use tempfile::TempDir;

pub const RESTAURANT: &str = "r-1";

/// Manager over a fresh on-disk database; keep the `TempDir` alive
pub fn create_manager() -> (SessionsManager, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let manager = SessionsManager::new(dir.path().join("sessions.redb"), 1024).unwrap();
    (manager, dir)
}

pub fn run(manager: &SessionsManager, role: Role, payload: SessionCommandPayload) -> CommandResponse {
    manager.execute_command(SessionCommand::new(
        RESTAURANT,
        format!("{role}-1"),
        "Test Operator",
        role,
        payload,
    ))
}

pub fn item_input(name: &str, price: Decimal, quantity: i32) -> ItemInput {
    ItemInput {
        product_id: format!("p-{name}"),
        name: name.to_string(),
        quantity,
        unit_price: price,
        client_ref: None,
        status: None,
    }
}

pub fn open_session(manager: &SessionsManager, table_id: &str) -> String {
    let resp = run(
        manager,
        Role::Waiter,
        SessionCommandPayload::OpenSession {
            table_id: table_id.to_string(),
        },
    );
    assert!(resp.success, "Failed to open session: {resp:?}");
    resp.session_id.unwrap()
}

pub fn add_item(manager: &SessionsManager, session_id: &str, input: ItemInput) -> String {
    let resp = run(
        manager,
        Role::Waiter,
        SessionCommandPayload::AddItem {
            session_id: session_id.to_string(),
            item: input,
        },
    );
    assert!(resp.success, "Failed to add item: {resp:?}");
    resp.item_id.unwrap()
}

pub fn cash_payment(session_id: &str, amount: Decimal) -> SessionCommandPayload {
    SessionCommandPayload::ProcessPayment {
        session_id: session_id.to_string(),
        payment: PaymentRequest::Single {
            method: PaymentMethod::Cash,
            amount,
        },
    }
}
