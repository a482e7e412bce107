//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific event type. Appliers are PURE functions: the same snapshot
//! and event always produce the same result, which is what makes
//! `rebuild_snapshot` possible.

use enum_dispatch::enum_dispatch;

use crate::sessions::money;
use crate::sessions::traits::EventApplier;
use shared::session::{EventPayload, SessionEvent, SessionSnapshot};

mod billing;
mod item_added;
mod item_quantity_changed;
mod item_removed;
mod item_status;
mod item_voided;
mod service_requests;
mod session_closed;
mod session_merged;
mod session_moved;
mod session_opened;

pub use billing::{BillTotalCorrectedApplier, PaymentRecordedApplier};
pub use item_added::ItemAddedApplier;
pub use item_quantity_changed::ItemQuantityChangedApplier;
pub use item_removed::ItemRemovedApplier;
pub use item_status::{
    DraftsSubmittedApplier, ItemServedApplier, ItemsConfirmedApplier, ItemsPreparingApplier,
};
pub use item_voided::ItemVoidedApplier;
pub use service_requests::{ServiceRequestCreatedApplier, ServiceRequestResolvedApplier};
pub use session_closed::SessionClosedApplier;
pub use session_merged::{SessionMergedInApplier, SessionMergedOutApplier};
pub use session_moved::SessionMovedApplier;
pub use session_opened::SessionOpenedApplier;

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    SessionOpened(SessionOpenedApplier),
    SessionClosed(SessionClosedApplier),
    ItemAdded(ItemAddedApplier),
    DraftsSubmitted(DraftsSubmittedApplier),
    ItemQuantityChanged(ItemQuantityChangedApplier),
    ItemRemoved(ItemRemovedApplier),
    ItemVoided(ItemVoidedApplier),
    ItemsConfirmed(ItemsConfirmedApplier),
    ItemsPreparing(ItemsPreparingApplier),
    ItemServed(ItemServedApplier),
    SessionMoved(SessionMovedApplier),
    SessionMergedOut(SessionMergedOutApplier),
    SessionMergedIn(SessionMergedInApplier),
    BillTotalCorrected(BillTotalCorrectedApplier),
    PaymentRecorded(PaymentRecordedApplier),
    ServiceRequestCreated(ServiceRequestCreatedApplier),
    ServiceRequestResolved(ServiceRequestResolvedApplier),
}

/// Convert SessionEvent reference to EventAction
///
/// This is the ONLY place with a match on EventPayload.
impl From<&SessionEvent> for EventAction {
    fn from(event: &SessionEvent) -> Self {
        match &event.payload {
            EventPayload::SessionOpened { .. } => {
                EventAction::SessionOpened(SessionOpenedApplier)
            }
            EventPayload::SessionClosed { .. } => {
                EventAction::SessionClosed(SessionClosedApplier)
            }
            EventPayload::ItemAdded { .. } => EventAction::ItemAdded(ItemAddedApplier),
            EventPayload::DraftsSubmitted { .. } => {
                EventAction::DraftsSubmitted(DraftsSubmittedApplier)
            }
            EventPayload::ItemQuantityChanged { .. } => {
                EventAction::ItemQuantityChanged(ItemQuantityChangedApplier)
            }
            EventPayload::ItemRemoved { .. } => EventAction::ItemRemoved(ItemRemovedApplier),
            EventPayload::ItemVoided { .. } => EventAction::ItemVoided(ItemVoidedApplier),
            EventPayload::ItemsConfirmed { .. } => {
                EventAction::ItemsConfirmed(ItemsConfirmedApplier)
            }
            EventPayload::ItemsPreparing { .. } => {
                EventAction::ItemsPreparing(ItemsPreparingApplier)
            }
            EventPayload::ItemServed { .. } => EventAction::ItemServed(ItemServedApplier),
            EventPayload::SessionMoved { .. } => EventAction::SessionMoved(SessionMovedApplier),
            EventPayload::SessionMergedOut { .. } => {
                EventAction::SessionMergedOut(SessionMergedOutApplier)
            }
            EventPayload::SessionMergedIn { .. } => {
                EventAction::SessionMergedIn(SessionMergedInApplier)
            }
            EventPayload::BillTotalCorrected { .. } => {
                EventAction::BillTotalCorrected(BillTotalCorrectedApplier)
            }
            EventPayload::PaymentRecorded { .. } => {
                EventAction::PaymentRecorded(PaymentRecordedApplier)
            }
            EventPayload::ServiceRequestCreated { .. } => {
                EventAction::ServiceRequestCreated(ServiceRequestCreatedApplier)
            }
            EventPayload::ServiceRequestResolved { .. } => {
                EventAction::ServiceRequestResolved(ServiceRequestResolvedApplier)
            }
        }
    }
}

/// Common tail of every applier: sequence, timestamp, bill, checksum
fn finish(snapshot: &mut SessionSnapshot, event: &SessionEvent) {
    snapshot.last_sequence = event.sequence;
    snapshot.updated_at = event.timestamp;
    money::recalculate_bill(snapshot);
    snapshot.update_checksum();
}
