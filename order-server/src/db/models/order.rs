//! Order Model
//!
//! Money follows the house rule: all arithmetic is done with `Decimal`
//! internally, then converted to `f64` (2 decimal places, half-up) for
//! storage and serialization.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::AppError;

/// 订单生命周期状态
///
/// 正向流转: pending → processing → completed。
/// cancelled 只能从 pending 进入 (取消接口)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// 全部状态 (报表零填充用)
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(AppError::internal(format!("Unknown order status: {other}"))),
        }
    }
}

/// 订单行项目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

/// 订单模型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    /// 创建时由 items 推导，后续状态变更不再重算
    pub total_amount: f64,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 乐观并发版本号，每次状态变更 +1
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 计算订单总额: Σ(price × quantity)，2 位小数，四舍五入
pub fn compute_total(items: &[OrderItem]) -> Result<f64, AppError> {
    let mut total = Decimal::ZERO;
    for item in items {
        let price = Decimal::from_f64(item.price)
            .ok_or_else(|| AppError::validation(format!("Invalid price: {}", item.price)))?;
        total += price * Decimal::from(item.quantity);
    }
    total
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .ok_or_else(|| AppError::internal("Order total out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: i64, price: f64) -> OrderItem {
        OrderItem {
            name: name.to_string(),
            quantity,
            price,
        }
    }

    #[test]
    fn test_compute_total() {
        let items = vec![item("Widget", 2, 29.99), item("Gadget", 1, 10.02)];
        assert_eq!(compute_total(&items).unwrap(), 70.0);
    }

    #[test]
    fn test_compute_total_exact_decimals() {
        // 0.1 + 0.2 style drift must not leak into totals
        let items = vec![item("A", 3, 0.1), item("B", 1, 0.2)];
        assert_eq!(compute_total(&items).unwrap(), 0.5);
    }

    #[test]
    fn test_compute_total_rounds_half_up() {
        let items = vec![item("A", 1, 0.005)];
        assert_eq!(compute_total(&items).unwrap(), 0.01);
    }

    #[test]
    fn test_status_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<OrderStatus>().is_err());
    }
}
