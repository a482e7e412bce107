//! Sync API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::sessions::{SyncRequest, SyncResponse};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct SyncBody {
    #[serde(default)]
    pub since_sequence: u64,
    #[serde(default)]
    pub epoch: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub session_id: String,
    /// Stored snapshot matches a replay of its events
    pub consistent: bool,
}

/// POST /api/restaurants/{restaurant_id}/sync
pub async fn sync(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
    Json(body): Json<SyncBody>,
) -> AppResult<Json<SyncResponse>> {
    let request = SyncRequest {
        restaurant_id,
        since_sequence: body.since_sequence,
        epoch: body.epoch,
    };

    let service = state.sync.clone();
    let response = run_blocking(move || Ok(service.sync(&request)?)).await?;
    tracing::debug!(
        events = response.events.len(),
        full = response.requires_full_sync,
        "Sync served"
    );
    Ok(Json(response))
}

/// GET /api/restaurants/{restaurant_id}/sessions/{session_id}/verify
pub async fn verify(
    State(state): State<ServerState>,
    Path((restaurant_id, session_id)): Path<(String, String)>,
) -> AppResult<Json<VerifyResponse>> {
    let manager = state.sessions.clone();
    let service = state.sync.clone();
    let report = run_blocking(move || {
        manager
            .get_session(&restaurant_id, &session_id)?
            .ok_or_else(|| AppError::not_found(format!("Session {}", session_id)))?;
        let consistent = service.verify_snapshot(&session_id)?;
        Ok(VerifyResponse {
            session_id,
            consistent,
        })
    })
    .await?;
    Ok(Json(report))
}
