use thiserror::Error;

use crate::sessions::ManagerError;

/// 服务器启动与运行错误
///
/// 请求级错误使用 [`crate::utils::AppError`]，这里只覆盖进程级故障。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("工作目录不可用: {0}")]
    WorkDir(#[source] std::io::Error),

    #[error("会话存储初始化失败: {0}")]
    Storage(#[from] ManagerError),

    #[error("HTTP 服务错误: {0}")]
    Http(#[source] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

/// 启动流程的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
