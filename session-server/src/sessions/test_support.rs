//! Builders shared by the unit tests of actions, appliers and the manager

use rust_decimal::Decimal;
use shared::session::{
    Bill, EventPayload, ItemStatus, OrderItem, PaymentMethod, Role, ServiceRequest,
    ServiceRequestKind, ServiceRequestStatus, SessionEvent, SessionSnapshot, Transaction,
};

use super::money;
use super::storage::SessionStorage;
use super::traits::CommandMetadata;

pub const RESTAURANT: &str = "r-1";

pub fn metadata(role: Role) -> CommandMetadata {
    CommandMetadata {
        command_id: uuid::Uuid::new_v4().to_string(),
        restaurant_id: RESTAURANT.to_string(),
        operator_id: format!("{}-1", role),
        operator_name: "Test User".to_string(),
        role,
        timestamp: 1234567890,
    }
}

pub fn item(id: &str, quantity: i32, unit_price: Decimal, status: ItemStatus) -> OrderItem {
    OrderItem {
        id: id.to_string(),
        client_ref: None,
        product_id: format!("p-{id}"),
        name: format!("Dish {id}"),
        quantity,
        unit_price,
        status,
        created_by: "guest-1".to_string(),
        created_by_role: Role::Guest,
        created_at: 0,
        updated_at: 0,
        voided_quantity: 0,
        void_reason: None,
    }
}

pub fn request(id: &str, kind: ServiceRequestKind) -> ServiceRequest {
    ServiceRequest {
        id: id.to_string(),
        kind,
        status: ServiceRequestStatus::Pending,
        created_at: 0,
        resolved_at: None,
        resolved_by: None,
    }
}

/// Active session on `table_id` holding `items`, bill already in sync
pub fn active_session(session_id: &str, table_id: &str, items: Vec<OrderItem>) -> SessionSnapshot {
    let mut snapshot = SessionSnapshot::new(session_id.to_string());
    snapshot.restaurant_id = RESTAURANT.to_string();
    snapshot.table_id = table_id.to_string();
    snapshot.bill = Bill::new(format!("bill-{session_id}"));
    snapshot.items = items;
    money::recalculate_bill(&mut snapshot);
    snapshot.update_checksum();
    snapshot
}

/// Same as [`active_session`] with one cash payment of `paid` already recorded
pub fn paid_session(
    session_id: &str,
    table_id: &str,
    items: Vec<OrderItem>,
    paid: Decimal,
) -> SessionSnapshot {
    let mut snapshot = active_session(session_id, table_id, items);
    snapshot.transactions.push(Transaction {
        transaction_id: format!("t-{session_id}"),
        payment_group_id: format!("g-{session_id}"),
        method: PaymentMethod::Cash,
        amount: paid,
        recorded_by: "cashier-1".to_string(),
        recorded_at: 0,
    });
    money::recalculate_bill(&mut snapshot);
    snapshot.update_checksum();
    snapshot
}

/// Persist snapshots (and the active index) in one committed transaction
pub fn seed(storage: &SessionStorage, snapshots: &[SessionSnapshot]) {
    let txn = storage.begin_write().unwrap();
    for snapshot in snapshots {
        storage.store_snapshot(&txn, snapshot).unwrap();
        if snapshot.is_active() {
            storage
                .mark_session_active(&txn, &snapshot.session_id)
                .unwrap();
        }
    }
    txn.commit().unwrap();
}

/// Event as if emitted by a waiter command
pub fn event(sequence: u64, session_id: &str, payload: EventPayload) -> SessionEvent {
    metadata(Role::Waiter).event(sequence, session_id, payload)
}
