//! 审计日志模块
//!
//! 订单生命周期、认证和报表事件的只追加旁路记录。

pub mod service;
pub mod storage;
pub mod types;
pub mod worker;

pub use service::{AuditLogRequest, AuditService};
pub use storage::AuditStorage;
pub use types::{AuditAction, AuditEntry, AuditListResponse, AuditQuery, AuditStatus};
