//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型 (from shared::error)
//! - [`ApiResponse`] - API 响应结构 (from shared::error)
//! - 日志初始化

pub mod logger;

// Request-level error types live in shared so clients decode the same codes
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
