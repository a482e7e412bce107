//! Table Session Server - 餐桌会话核心服务
//!
//! # 架构概述
//!
//! 一桌一会话：顾客扫码点餐、服务员确认、后厨出餐、收银结账，
//! 所有写操作都是命令，经事件溯源落库后以变更通知推送给各端。
//!
//! - **会话** (`sessions`): 命令处理、事件应用、redb 存储、换桌并桌
//! - **实时** (`realtime`): 按范围的协调器、乐观更新、楼面状态投影
//! - **HTTP API** (`api`): 命令入口、查询、同步、SSE 变更流
//!
//! # 模块结构
//!
//! ```text
//! session-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── sessions/      # 会话事件溯源
//! ├── realtime/      # 变更协调
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志
//! ```

pub mod api;
pub mod core;
pub mod realtime;
pub mod sessions;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use realtime::{ReconciledView, ReconcilerHandle, ReconcilerRegistry};
pub use sessions::{SessionStorage, SessionsManager, TransferCoordinator};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 进程级环境准备：加载 `.env`，初始化日志
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在时忽略
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir()?;
    init_logger_with_file(
        Some(&config.log_level),
        config.is_production(),
        config.log_dir.as_deref(),
    );
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
  _____       _     _
 |_   _|__ _ | |__ | |  ___
   | | / _` || '_ \| | / _ \
   | || (_| || |_) | ||  __/
   |_| \__,_||_.__/|_| \___|
        session server
    "#
    );
}
