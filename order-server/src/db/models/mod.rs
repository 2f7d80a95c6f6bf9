//! Database Models

pub mod order;
pub mod user;

pub use order::{Order, OrderItem, OrderStatus, compute_total};
pub use user::{User, UserProfile, UserRole};
