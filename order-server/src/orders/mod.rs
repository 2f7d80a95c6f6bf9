//! 订单生命周期模块
//!
//! - [`OrderService`] - 创建、查询、分页、取消
//! - [`ProcessingService`] - 状态流转与滞留订单清理

pub mod processing;
pub mod service;

pub use processing::ProcessingService;
pub use service::{CreateOrderInput, OrderPage, OrderService, PaginationMeta};
