//! SessionMergedIn / SessionMergedOut event appliers
//!
//! A merge emits both events in one command: the target receives the live
//! lines and pending requests, the source gives them up and closes.
//! Terminal lines stay on the source for audit.

use super::finish;
use crate::sessions::traits::EventApplier;
use shared::session::{CloseReason, EventPayload, SessionEvent, SessionSnapshot, SessionStatus};

/// SessionMergedIn applier (target side)
pub struct SessionMergedInApplier;

impl EventApplier for SessionMergedInApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::SessionMergedIn {
            items, requests, ..
        } = &event.payload
        {
            for item in items {
                if snapshot.find_item(&item.id).is_none() {
                    snapshot.items.push(item.clone());
                }
            }
            for request in requests {
                if !snapshot.service_requests.iter().any(|r| r.id == request.id) {
                    snapshot.service_requests.push(request.clone());
                }
            }

            finish(snapshot, event);
        }
    }
}

/// SessionMergedOut applier (source side)
pub struct SessionMergedOutApplier;

impl EventApplier for SessionMergedOutApplier {
    fn apply(&self, snapshot: &mut SessionSnapshot, event: &SessionEvent) {
        if let EventPayload::SessionMergedOut {
            target_session_id, ..
        } = &event.payload
        {
            snapshot.items.retain(|i| i.status.is_terminal());
            snapshot.service_requests.retain(|r| !r.is_pending());

            snapshot.status = SessionStatus::Closed;
            snapshot.close_reason = Some(CloseReason::Merged);
            snapshot.merged_into = Some(target_session_id.clone());
            snapshot.closed_at = Some(event.timestamp);

            finish(snapshot, event);
        }
    }
}
