//! Session API Module
//!
//! All mutations go through `POST /api/sessions/commands`; the remaining
//! routes are restaurant-scoped reads.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Session router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/sessions/commands", post(handler::execute))
        // Active sessions
        .route("/api/restaurants/{restaurant_id}/sessions", get(handler::list_active))
        // One session (active or closed)
        .route(
            "/api/restaurants/{restaurant_id}/sessions/{session_id}",
            get(handler::get_by_id),
        )
        // Audit trail
        .route(
            "/api/restaurants/{restaurant_id}/sessions/{session_id}/events",
            get(handler::list_events),
        )
        // getActiveSession(tableId)
        .route(
            "/api/restaurants/{restaurant_id}/tables/{table_id}/session",
            get(handler::get_for_table),
        )
}
