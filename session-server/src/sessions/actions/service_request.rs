//! Service request command handlers (call waiter, ask for the bill)

use async_trait::async_trait;

use crate::sessions::traits::{CommandContext, CommandHandler, CommandMetadata, SessionError};
use shared::session::{
    EventPayload, ServiceRequest, ServiceRequestKind, ServiceRequestStatus, SessionEvent,
};

/// CreateServiceRequest action
///
/// A second pending request of the same kind is a no-op.
#[derive(Debug, Clone)]
pub struct CreateServiceRequestAction {
    pub session_id: String,
    pub kind: ServiceRequestKind,
}

#[async_trait]
impl CommandHandler for CreateServiceRequestAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;

        if snapshot.pending_requests().any(|r| r.kind == self.kind) {
            return Ok(vec![]);
        }

        let request = ServiceRequest {
            id: shared::util::new_id(),
            kind: self.kind,
            status: ServiceRequestStatus::Pending,
            created_at: shared::util::now_millis(),
            resolved_at: None,
            resolved_by: None,
        };

        let seq = ctx.next_sequence();
        Ok(vec![metadata.event(
            seq,
            &self.session_id,
            EventPayload::ServiceRequestCreated { request },
        )])
    }
}

/// ResolveServiceRequest action
///
/// Resolving an already resolved request is a no-op.
#[derive(Debug, Clone)]
pub struct ResolveServiceRequestAction {
    pub session_id: String,
    pub request_id: String,
}

#[async_trait]
impl CommandHandler for ResolveServiceRequestAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        metadata.require_staff()?;

        let snapshot = ctx.load_active_session(&self.session_id, &metadata.restaurant_id)?;
        let request = snapshot
            .service_requests
            .iter()
            .find(|r| r.id == self.request_id)
            .ok_or_else(|| SessionError::ServiceRequestNotFound(self.request_id.clone()))?;

        if !request.is_pending() {
            return Ok(vec![]);
        }

        let seq = ctx.next_sequence();
        Ok(vec![metadata.event(
            seq,
            &self.session_id,
            EventPayload::ServiceRequestResolved {
                request_id: self.request_id.clone(),
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::storage::SessionStorage;
    use crate::sessions::test_support::*;
    use shared::session::Role;

    fn storage() -> SessionStorage {
        let storage = SessionStorage::open_in_memory().unwrap();
        let mut s = active_session("s-1", "T1", vec![]);
        s.service_requests
            .push(request("rq-1", ServiceRequestKind::CallWaiter));
        let mut done = request("rq-2", ServiceRequestKind::BillRequest);
        done.status = ServiceRequestStatus::Resolved;
        s.service_requests.push(done);
        seed(&storage, &[s]);
        storage
    }

    #[tokio::test]
    async fn test_guest_creates_request() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = CreateServiceRequestAction {
            session_id: "s-1".to_string(),
            kind: ServiceRequestKind::BillRequest,
        };
        let events = action
            .execute(&mut ctx, &metadata(Role::Guest))
            .await
            .unwrap();
        assert!(matches!(
            events[0].payload,
            EventPayload::ServiceRequestCreated { ref request }
                if request.kind == ServiceRequestKind::BillRequest && request.is_pending()
        ));
    }

    #[tokio::test]
    async fn test_duplicate_pending_request_is_noop() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = CreateServiceRequestAction {
            session_id: "s-1".to_string(),
            kind: ServiceRequestKind::CallWaiter,
        };
        let events = action
            .execute(&mut ctx, &metadata(Role::Guest))
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_request() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let resolve = |id: &str| ResolveServiceRequestAction {
            session_id: "s-1".to_string(),
            request_id: id.to_string(),
        };

        let events = resolve("rq-1")
            .execute(&mut ctx, &metadata(Role::Waiter))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);

        let events = resolve("rq-2")
            .execute(&mut ctx, &metadata(Role::Waiter))
            .await
            .unwrap();
        assert!(events.is_empty());

        let result = resolve("rq-9").execute(&mut ctx, &metadata(Role::Waiter)).await;
        assert!(matches!(result, Err(SessionError::ServiceRequestNotFound(_))));

        let result = resolve("rq-1").execute(&mut ctx, &metadata(Role::Guest)).await;
        assert!(matches!(result, Err(SessionError::PermissionDenied(_))));
    }
}
