//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::core::{Config, Result, ServerError, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        let tasks = state.start_background_tasks();
        let app = crate::api::build_app(state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ServerError::Http)?;
        tracing::info!("🦀 Table session server listening on {}", addr);

        let shutdown = state.shutdown.clone();
        let signal = async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down..."),
                _ = shutdown.cancelled() => {}
            }
        };

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(ServerError::Http);

        // SSE 连接和协调任务跟随全局信号退出
        state.reconcilers.shutdown_all();
        state.shutdown.cancel();
        tasks.shutdown().await;

        served
    }
}
