//! Change Stream API Module
//!
//! Server-sent events carrying refetch cues. Clients that need a view rather
//! than cues read the session routes after each notification.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/restaurants/{restaurant_id}/changes",
            get(handler::restaurant_changes),
        )
        .route(
            "/api/restaurants/{restaurant_id}/sessions/{session_id}/changes",
            get(handler::session_changes),
        )
}
