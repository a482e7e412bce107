//! Transfer API Module
//!
//! Two calls per transfer: `plan` shows what would happen, `commit` executes
//! a plan the operator explicitly confirmed.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/restaurants/{restaurant_id}/transfers/plan",
            post(handler::plan),
        )
        .route(
            "/api/restaurants/{restaurant_id}/transfers/commit",
            post(handler::commit),
        )
}
