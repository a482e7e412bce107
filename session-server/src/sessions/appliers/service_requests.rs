//! Service request event appliers

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, ServiceRequestStatus, SessionEvent, SessionSnapshot};

/// ServiceRequestCreated applier
pub struct ServiceRequestCreatedApplier;

impl EventApplier for ServiceRequestCreatedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::ServiceRequestCreated { request } = &event.payload {
            if !snapshot.service_requests.iter().any(|r| r.id == request.id) {
                snapshot.service_requests.push(request.clone());
            }
            finish(snapshot, event);
        }
    }
}

/// ServiceRequestResolved applier
pub struct ServiceRequestResolvedApplier;

impl EventApplier for ServiceRequestResolvedApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::ServiceRequestResolved { request_id } = &event.payload {
            if let Some(request) = snapshot
                .service_requests
                .iter_mut()
                .find(|r| &r.id == request_id)
            {
                request.status = ServiceRequestStatus::Resolved;
                request.resolved_at = Some(event.timestamp);
                request.resolved_by = Some(event.operator_id.clone());
            }
            finish(snapshot, event);
        }
    }
}
