//! Sync API Module
//!
//! Reconnect catch-up and snapshot verification.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/restaurants/{restaurant_id}/sync", post(handler::sync))
        .route(
            "/api/restaurants/{restaurant_id}/sessions/{session_id}/verify",
            get(handler::verify),
        )
}
