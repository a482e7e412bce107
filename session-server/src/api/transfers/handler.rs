//! Transfer API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::session::CommandResponse;

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::sessions::{TransferActor, TransferPlan};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub source_table_id: String,
    pub target_table_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub plan: TransferPlan,
    /// Must be `true`; the UI sets it after the confirmation dialog
    #[serde(default)]
    pub confirmed: bool,
    pub actor: TransferActor,
}

/// POST /api/restaurants/{restaurant_id}/transfers/plan
pub async fn plan(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
    Json(req): Json<PlanRequest>,
) -> AppResult<Json<TransferPlan>> {
    let transfers = state.transfers.clone();
    let plan = run_blocking(move || {
        Ok(transfers.plan(&restaurant_id, &req.source_table_id, &req.target_table_id)?)
    })
    .await?;
    Ok(Json(plan))
}

/// POST /api/restaurants/{restaurant_id}/transfers/commit
pub async fn commit(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
    Json(req): Json<CommitRequest>,
) -> AppResult<Json<CommandResponse>> {
    if req.plan.restaurant_id != restaurant_id {
        return Err(AppError::not_found(format!(
            "Transfer plan {}",
            req.plan.plan_id
        )));
    }

    let transfers = state.transfers.clone();
    let response =
        run_blocking(move || Ok(transfers.commit(&req.plan, req.confirmed, &req.actor)?)).await?;
    Ok(Json(response))
}
