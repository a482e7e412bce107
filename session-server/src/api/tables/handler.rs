//! Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::DiningTable;
use shared::session::{Role, SubscriptionScope, TransferMode};

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::realtime::{TableStatus, project_floor};
use crate::sessions::ManagerError;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct UpsertTableRequest {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FloorQuery {
    pub role: Role,
    /// Floor is in transfer mode
    #[serde(default)]
    pub transfer: bool,
    /// Source table chosen in transfer mode
    #[serde(default)]
    pub source_table_id: Option<String>,
}

/// GET /api/restaurants/{restaurant_id}/tables
pub async fn list(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<Vec<DiningTable>>> {
    let manager = state.sessions.clone();
    let tables = run_blocking(move || {
        Ok(manager
            .storage()
            .get_tables(&restaurant_id)
            .map_err(ManagerError::from)?)
    })
    .await?;
    Ok(Json(tables))
}

/// POST /api/restaurants/{restaurant_id}/tables
pub async fn upsert(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
    Json(req): Json<UpsertTableRequest>,
) -> AppResult<Json<DiningTable>> {
    if req.id.trim().is_empty() {
        return Err(AppError::validation("Table id must not be empty"));
    }
    if req.label.trim().is_empty() {
        return Err(AppError::validation("Table label must not be empty"));
    }

    let mut table = DiningTable::new(&req.id, &restaurant_id, &req.label);
    table.session_token = req.session_token;

    let manager = state.sessions.clone();
    let stored = table.clone();
    run_blocking(move || {
        Ok(manager
            .storage()
            .upsert_table(&stored)
            .map_err(ManagerError::from)?)
    })
    .await?;

    tracing::info!(restaurant_id = %table.restaurant_id, table_id = %table.id, "Table registered");
    Ok(Json(table))
}

/// PUT /api/restaurants/{restaurant_id}/tables/{table_id}/archive
pub async fn archive(
    State(state): State<ServerState>,
    Path((restaurant_id, table_id)): Path<(String, String)>,
) -> AppResult<Json<DiningTable>> {
    let manager = state.sessions.clone();
    let table = run_blocking(move || {
        let storage = manager.storage();
        let mut table = storage
            .get_tables(&restaurant_id)
            .map_err(ManagerError::from)?
            .into_iter()
            .find(|t| t.id == table_id)
            .ok_or_else(|| AppError::not_found(format!("Table {table_id}")))?;

        table.archived = true;
        storage.upsert_table(&table).map_err(ManagerError::from)?;
        Ok(table)
    })
    .await?;

    tracing::info!(table_id = %table.id, "Table archived");
    Ok(Json(table))
}

/// GET /api/restaurants/{restaurant_id}/floor?role=waiter
///
/// Projected from the restaurant's reconciled view, so repeated polls are
/// served without touching the session store. A reconciler is only started
/// for restaurants that have registered tables or active sessions.
pub async fn floor_status(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
    Query(query): Query<FloorQuery>,
) -> AppResult<Json<Vec<TableStatus>>> {
    let scope = SubscriptionScope::Restaurant(restaurant_id.clone());
    let running = state.reconcilers.get(&scope);

    let manager = state.sessions.clone();
    let rid = restaurant_id.clone();
    let check_sessions = running.is_none();
    let (tables, known) = run_blocking(move || {
        let tables = manager
            .storage()
            .get_tables(&rid)
            .map_err(ManagerError::from)?;
        let known = !tables.is_empty()
            || !check_sessions
            || !manager.get_active_sessions(&rid)?.is_empty();
        Ok((tables, known))
    })
    .await?;

    if !known {
        tracing::debug!(restaurant_id = %restaurant_id, "Floor requested for unknown restaurant");
        return Ok(Json(Vec::new()));
    }

    let handle = running.unwrap_or_else(|| state.reconcilers.get_or_spawn(scope));
    let view = handle.ready().await?;
    if view.stale {
        tracing::warn!(restaurant_id = %restaurant_id, "Serving floor from a stale view");
    }

    let transfer = query.transfer.then(|| TransferMode {
        source_table_id: query.source_table_id.clone(),
    });
    Ok(Json(project_floor(
        &tables,
        &view.sessions,
        query.role,
        transfer.as_ref(),
    )))
}
