//! 健康检查路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/health | GET | 健康检查 (含存储统计) |
//!
//! # 响应示例
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "epoch": "5c0e...",
//!   "uptime_seconds": 42,
//!   "storage": { "event_count": 10, "active_session_count": 2, ... }
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::sessions::ManagerError;
use crate::sessions::storage::StorageStats;
use crate::utils::AppResult;

/// 健康检查路由 - 公共路由
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 状态 (ok)
    status: &'static str,
    /// 版本号
    version: &'static str,
    /// 本次启动的 epoch，客户端据此判断是否需要全量同步
    epoch: String,
    uptime_seconds: u64,
    /// 已注册的实时协调任务数
    reconcilers: usize,
    storage: StorageStats,
}

async fn health(State(state): State<ServerState>) -> AppResult<Json<HealthResponse>> {
    let manager = state.sessions.clone();
    let storage = run_blocking(move || {
        let stats = manager.storage().get_stats().map_err(ManagerError::from)?;
        Ok(stats)
    })
    .await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        epoch: state.sessions.epoch().to_string(),
        uptime_seconds: state.uptime_secs(),
        reconcilers: state.reconcilers.len(),
        storage,
    }))
}
