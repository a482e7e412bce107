//! Table API Module
//!
//! Floor plan registration and the role-aware floor status.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/restaurants/{restaurant_id}/tables",
            get(handler::list).post(handler::upsert),
        )
        .route(
            "/api/restaurants/{restaurant_id}/tables/{table_id}/archive",
            put(handler::archive),
        )
        .route(
            "/api/restaurants/{restaurant_id}/floor",
            get(handler::floor_status),
        )
}
