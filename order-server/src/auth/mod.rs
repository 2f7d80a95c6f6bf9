//! 认证模块
//!
//! - [`JwtService`] - JWT 令牌生成与验证
//! - [`CurrentUser`] - 请求上下文中的当前用户 (extractor 注入)

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
