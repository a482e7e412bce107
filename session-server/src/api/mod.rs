//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`sessions`] - 会话命令与查询
//! - [`transfers`] - 换桌 / 并桌 (计划 + 确认提交)
//! - [`tables`] - 桌台登记与楼面状态
//! - [`sync`] - 断线重连同步
//! - [`changes`] - 变更通知流 (SSE)

pub mod changes;
pub mod health;
pub mod sessions;
pub mod sync;
pub mod tables;
pub mod transfers;

use axum::{Router, middleware};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// 同时处理的请求上限 (SSE 连接建立后不占用名额)
const MAX_CONCURRENT_REQUESTS: usize = 256;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    tracing::info!(target: "http_access", "{} {} {}", method, uri, response.status());
    response
}

/// Build the Axum router (without state)
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(sessions::router())
        .merge(transfers::router())
        .merge(tables::router())
        .merge(sync::router())
        .merge(changes::router())
}

/// Build a fully configured application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .with_state(state)
        // CORS - 各端 (点餐页、收银、后厨) 跨域访问
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(log_request))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
}

/// 在阻塞线程池中执行 redb 读写
///
/// 会话管理器的所有操作都是同步的，直接在 async handler 中调用会阻塞运行时。
pub(crate) async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::internal(format!("Blocking task failed: {e}")))?
}
