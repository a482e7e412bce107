//! AddItem command handler
//!
//! Adds one line to a session. The unit price is captured here and never
//! changes afterwards.

use async_trait::async_trait;

use crate::sessions::money;
use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{EventPayload, ItemInput, ItemStatus, OrderItem, Role, SessionEvent};

/// AddItem action
#[derive(Debug, Clone)]
pub struct AddItemAction {
    pub session_id: String,
    pub item: ItemInput,
}

impl AddItemAction {
    /// Initial status allowed for the caller's role
    fn initial_status(&self, role: Role) -> Result<ItemStatus, SessionError> {
        let requested = self.item.status;
        match role {
            Role::Guest => match requested.unwrap_or(ItemStatus::Draft) {
                s @ (ItemStatus::Draft | ItemStatus::Pending) => Ok(s),
                other => Err(SessionError::PermissionDenied(format!(
                    "guests cannot create {} items",
                    other
                ))),
            },
            _ => match requested.unwrap_or(ItemStatus::Pending) {
                s @ (ItemStatus::Draft | ItemStatus::Pending) => Ok(s),
                ItemStatus::Confirmed if role.can_confirm() => Ok(ItemStatus::Confirmed),
                ItemStatus::Confirmed => Err(SessionError::PermissionDenied(format!(
                    "{} cannot create confirmed items",
                    role
                ))),
                other => Err(SessionError::InvalidOperation(format!(
                    "items cannot be created as {}",
                    other
                ))),
            },
        }
    }
}

#[async_trait]
impl CommandHandler for AddItemAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        // 1. Validate input before touching state
        money::validate_item_input(&self.item)?;
        let status = self.initial_status(metadata.role)?;

        // 2. Session must be active
        ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;

        // 3. Build the complete line
        let now = shared::util::now_millis();
        let item = OrderItem {
            id: shared::util::new_id(),
            client_ref: self.item.client_ref.clone(),
            product_id: self.item.product_id.clone(),
            name: self.item.name.clone(),
            quantity: self.item.quantity,
            unit_price: self.item.unit_price,
            status,
            created_by: metadata.operator_id.clone(),
            created_by_role: metadata.role,
            created_at: now,
            updated_at: now,
            voided_quantity: 0,
            void_reason: None,
        };

        let seq = ctx.next_sequence();
        let event = metadata.event(seq, &self.session_id, EventPayload::ItemAdded { item });

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::storage::SessionStorage;
    use crate::sessions::test_support::*;
    use rust_decimal_macros::dec;

    fn add(status: Option<ItemStatus>) -> AddItemAction {
        AddItemAction {
            session_id: "s-1".to_string(),
            item: ItemInput {
                product_id: "p-soup".to_string(),
                name: "Soup".to_string(),
                quantity: 2,
                unit_price: dec!(10.00),
                client_ref: Some("tmp-1".to_string()),
                status,
            },
        }
    }

    fn added_item(events: &[SessionEvent]) -> &OrderItem {
        match &events[0].payload {
            EventPayload::ItemAdded { item } => item,
            _ => panic!("Expected ItemAdded"),
        }
    }

    #[tokio::test]
    async fn test_guest_item_defaults_to_draft() {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(&storage, &[active_session("s-1", "T1", vec![])]);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let events = add(None)
            .execute(&mut ctx, &metadata(Role::Guest))
            .await
            .unwrap();

        let item = added_item(&events);
        assert_eq!(item.status, ItemStatus::Draft);
        assert_eq!(item.client_ref.as_deref(), Some("tmp-1"));
        assert_eq!(item.unit_price, dec!(10.00));
        assert_eq!(item.created_by_role, Role::Guest);
    }

    #[tokio::test]
    async fn test_staff_item_defaults_to_pending() {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(&storage, &[active_session("s-1", "T1", vec![])]);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let events = add(None)
            .execute(&mut ctx, &metadata(Role::Waiter))
            .await
            .unwrap();
        assert_eq!(added_item(&events).status, ItemStatus::Pending);
    }

    #[tokio::test]
    async fn test_guest_cannot_create_confirmed_item() {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(&storage, &[active_session("s-1", "T1", vec![])]);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let result = add(Some(ItemStatus::Confirmed))
            .execute(&mut ctx, &metadata(Role::Guest))
            .await;
        assert!(matches!(result, Err(SessionError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_waiter_may_create_confirmed_item() {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(&storage, &[active_session("s-1", "T1", vec![])]);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let events = add(Some(ItemStatus::Confirmed))
            .execute(&mut ctx, &metadata(Role::Waiter))
            .await
            .unwrap();
        assert_eq!(added_item(&events).status, ItemStatus::Confirmed);

        let result = add(Some(ItemStatus::Served))
            .execute(&mut ctx, &metadata(Role::Waiter))
            .await;
        assert!(matches!(result, Err(SessionError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_add_to_unknown_session() {
        let storage = SessionStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let result = add(None).execute(&mut ctx, &metadata(Role::Guest)).await;
        assert!(matches!(result, Err(SessionError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected() {
        let storage = SessionStorage::open_in_memory().unwrap();
        seed(&storage, &[active_session("s-1", "T1", vec![])]);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let mut action = add(None);
        action.item.quantity = 0;
        let result = action.execute(&mut ctx, &metadata(Role::Guest)).await;
        assert!(matches!(result, Err(SessionError::InvalidQuantity(_))));
    }
}
