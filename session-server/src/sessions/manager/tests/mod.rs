use super::*;
use crate::sessions::storage::SessionStorage;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::session::{
    CommandErrorCode, ItemInput, ItemStatus, PaymentMethod, PaymentRequest, Role,
};

const RESTAURANT: &str = "r-1";

fn create_test_manager() -> SessionsManager {
    let storage = SessionStorage::open_in_memory().unwrap();
    SessionsManager::with_storage(storage, 1024)
}

fn command(role: Role, payload: SessionCommandPayload) -> SessionCommand {
    SessionCommand::new(
        RESTAURANT,
        format!("{role}-1"),
        "Test Operator",
        role,
        payload,
    )
}

fn run(manager: &SessionsManager, role: Role, payload: SessionCommandPayload) -> CommandResponse {
    manager.execute_command(command(role, payload))
}

fn error_code(response: &CommandResponse) -> CommandErrorCode {
    assert!(!response.success, "expected failure, got {response:?}");
    response.error.as_ref().unwrap().code
}

// ========================================================================
// Helper: open a table with items
// ========================================================================

fn open_session(manager: &SessionsManager, table_id: &str) -> String {
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

fn item_input(name: &str, price: Decimal, quantity: i32) -> ItemInput {
    ItemInput {
        product_id: format!("p-{name}"),
        name: name.to_string(),
        quantity,
        unit_price: price,
        client_ref: None,
        status: None,
    }
}

/// Add a line as `role` and return its server id
fn add_item(
    manager: &SessionsManager,
    session_id: &str,
    role: Role,
    input: ItemInput,
) -> String {
    let resp = run(
        manager,
        role,
        SessionCommandPayload::AddItem {
            session_id: session_id.to_string(),
            item: input,
        },
    );
    assert!(resp.success, "Failed to add item: {resp:?}");
    resp.item_id.unwrap()
}

/// Open `table_id` and add one pending line per (name, price, quantity)
fn open_with_items(
    manager: &SessionsManager,
    table_id: &str,
    items: &[(&str, Decimal, i32)],
) -> String {
    let session_id = open_session(manager, table_id);
    for (name, price, quantity) in items {
        add_item(
            manager,
            &session_id,
            Role::Waiter,
            item_input(name, *price, *quantity),
        );
    }
    session_id
}

fn confirm(manager: &SessionsManager, session_id: &str) {
    let resp = run(
        manager,
        Role::Waiter,
        SessionCommandPayload::ConfirmPending {
            session_id: session_id.to_string(),
        },
    );
    assert!(resp.success);
}

fn pay(manager: &SessionsManager, session_id: &str, amount: Decimal) -> CommandResponse {
    run(
        manager,
        Role::Cashier,
        SessionCommandPayload::ProcessPayment {
            session_id: session_id.to_string(),
            payment: PaymentRequest::Single {
                method: PaymentMethod::Cash,
                amount,
            },
        },
    )
}

fn snapshot(manager: &SessionsManager, session_id: &str) -> SessionSnapshot {
    manager.get_snapshot(session_id).unwrap().unwrap()
}

mod test_core;
