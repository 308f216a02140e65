//! 数据模型定义
//!
//! 业务实体、HTTP 请求与响应结构。通过 ts-rs 导出 TypeScript 类型供前端使用。

pub mod assignments;
pub mod auth;
pub mod common;
pub mod courses;
pub mod reminders;
pub mod submissions;
pub mod users;

pub use common::{ApiResponse, ErrorCode, PaginatedResponse, PaginationInfo, PaginationQuery, normalize_page};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
