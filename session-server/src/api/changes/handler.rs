//! Change Stream Handlers

use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, stream};
use serde::Serialize;
use shared::session::SubscriptionScope;

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// First event of every stream
#[derive(Debug, Serialize)]
struct StreamOpened {
    scope: String,
    server_epoch: String,
    server_sequence: u64,
}

/// GET /api/restaurants/{restaurant_id}/changes
pub async fn restaurant_changes(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    open_stream(state, SubscriptionScope::Restaurant(restaurant_id)).await
}

/// GET /api/restaurants/{restaurant_id}/sessions/{session_id}/changes
pub async fn session_changes(
    State(state): State<ServerState>,
    Path((restaurant_id, session_id)): Path<(String, String)>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let manager = state.sessions.clone();
    let id = session_id.clone();
    run_blocking(move || {
        manager
            .get_session(&restaurant_id, &id)?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Session {}", id)))
    })
    .await?;

    open_stream(state, SubscriptionScope::Session(session_id)).await
}

/// Subscribe before reading the sequence so no commit falls between the two
async fn open_stream(
    state: ServerState,
    scope: SubscriptionScope,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let subscription = state.feed.subscribe(scope.clone());

    let manager = state.sessions.clone();
    let server_sequence = run_blocking(move || Ok(manager.get_current_sequence()?)).await?;
    let opened = StreamOpened {
        scope: scope.to_string(),
        server_epoch: state.sessions.epoch().to_string(),
        server_sequence,
    };
    tracing::info!(scope = %scope, "Change stream opened");

    let first = stream::once(async move { Event::default().event("opened").json_data(opened) });
    let changes = subscription
        .into_stream()
        .map(|notification| Event::default().event("change").json_data(notification));
    let events = first
        .chain(changes)
        .take_until(state.shutdown.clone().cancelled_owned());

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}
