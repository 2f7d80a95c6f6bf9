//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 认证相关接口
//! - [`orders`] - 订单管理接口
//! - [`processing`] - 手动处理触发接口
//! - [`reports`] - 报表接口
//! - [`audit_log`] - 审计日志接口 (仅管理员)

pub mod audit_log;
pub mod auth;
pub mod health;
pub mod orders;
pub mod processing;
pub mod reports;

use axum::Router;

use crate::core::ServerState;

/// 汇总全部路由
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(orders::router())
        .merge(processing::router())
        .merge(reports::router())
        .merge(audit_log::router())
}
