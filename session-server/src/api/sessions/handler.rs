//! Session API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::session::{CommandResponse, SessionCommand, SessionEvent, SessionSnapshot};

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// POST /api/sessions/commands - execute one command
///
/// The body is always a `CommandResponse`; the status code mirrors its
/// error so plain HTTP clients can branch on it.
pub async fn execute(
    State(state): State<ServerState>,
    Json(cmd): Json<SessionCommand>,
) -> AppResult<(StatusCode, Json<CommandResponse>)> {
    let manager = state.sessions.clone();
    let response = run_blocking(move || Ok(manager.execute_command(cmd))).await?;

    let status = match &response.error {
        Some(e) => e.code.error_code().http_status(),
        None => StatusCode::OK,
    };
    Ok((status, Json(response)))
}

/// GET /api/restaurants/{restaurant_id}/sessions
pub async fn list_active(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<Vec<SessionSnapshot>>> {
    let manager = state.sessions.clone();
    let sessions = run_blocking(move || Ok(manager.get_active_sessions(&restaurant_id)?)).await?;
    Ok(Json(sessions))
}

/// GET /api/restaurants/{restaurant_id}/sessions/{session_id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path((restaurant_id, session_id)): Path<(String, String)>,
) -> AppResult<Json<SessionSnapshot>> {
    let manager = state.sessions.clone();
    let session = run_blocking(move || {
        manager
            .get_session(&restaurant_id, &session_id)?
            .ok_or_else(|| AppError::not_found(format!("Session {}", session_id)))
    })
    .await?;
    Ok(Json(session))
}

/// GET /api/restaurants/{restaurant_id}/sessions/{session_id}/events
pub async fn list_events(
    State(state): State<ServerState>,
    Path((restaurant_id, session_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<SessionEvent>>> {
    let manager = state.sessions.clone();
    let events = run_blocking(move || {
        // Scope check before exposing the audit trail
        if manager.get_session(&restaurant_id, &session_id)?.is_none() {
            return Err(AppError::not_found(format!("Session {}", session_id)));
        }
        Ok(manager.get_events_for_session(&session_id)?)
    })
    .await?;
    Ok(Json(events))
}

/// GET /api/restaurants/{restaurant_id}/tables/{table_id}/session
///
/// `null` when the table is free.
pub async fn get_for_table(
    State(state): State<ServerState>,
    Path((restaurant_id, table_id)): Path<(String, String)>,
) -> AppResult<Json<Option<SessionSnapshot>>> {
    let manager = state.sessions.clone();
    let session = run_blocking(move || {
        Ok(manager.get_active_session_for_table(&restaurant_id, &table_id)?)
    })
    .await?;
    Ok(Json(session))
}
