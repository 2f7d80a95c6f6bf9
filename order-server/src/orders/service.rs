//! Order Lifecycle Service
//!
//! Creation, lookup and pagination. Status transitions live in
//! [`ProcessingService`](super::ProcessingService); the only mutation here
//! is cancellation, which is valid from `pending` alone.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppError;
use crate::audit::{AuditAction, AuditService};
use crate::db::models::{Order, OrderItem, OrderStatus, compute_total};
use crate::db::repository::order as order_repo;
use crate::message::{BusMessage, MessageBus, OrderCreatedPayload};
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_ITEM_NAME_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_PRICE, MAX_QUANTITY,
    is_valid_email, require_finite, validate_optional_text, validate_required_text,
};
use crate::utils::{AppResult, now_millis};

/// 创建订单的输入
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// 分页元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total_items: i64,
    pub item_count: i64,
    pub items_per_page: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

/// 一页订单
#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub meta: PaginationMeta,
}

/// 订单服务
#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    bus: Arc<MessageBus>,
    audit: Arc<AuditService>,
}

impl OrderService {
    pub fn new(pool: SqlitePool, bus: Arc<MessageBus>, audit: Arc<AuditService>) -> Self {
        Self { pool, bus, audit }
    }

    /// 创建订单
    ///
    /// 校验输入 → 计算总额 → 持久化 (status=pending) → 审计 →
    /// 发布 order_created 事件。事件发布是尽力而为的：失败只记录
    /// WARN，不回滚持久化，也不使请求失败 — 滞留订单由每小时的
    /// 清理任务兜底。
    pub async fn create(&self, input: CreateOrderInput) -> AppResult<Order> {
        validate_create_input(&input)?;

        let total_amount = compute_total(&input.items)?;
        let now = now_millis();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            customer_name: input.customer_name,
            customer_email: input.customer_email,
            items: input.items,
            total_amount,
            status: OrderStatus::Pending,
            notes: input.notes,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        order_repo::insert(&self.pool, &order).await?;

        self.audit
            .success(
                AuditAction::OrderCreated,
                &order.id,
                serde_json::json!({
                    "customer_email": &order.customer_email,
                    "total_amount": order.total_amount,
                    "item_count": order.items.len(),
                }),
            )
            .await;

        let payload = OrderCreatedPayload {
            id: order.id.clone(),
            items: order.items.clone(),
        };
        if let Err(e) = self.bus.publish(BusMessage::order_created(&payload)) {
            tracing::warn!(
                order_id = %order.id,
                error = %e,
                "Failed to publish order_created event; pending sweep will pick it up"
            );
        }

        tracing::info!(
            order_id = %order.id,
            total_amount = %order.total_amount,
            "Order created"
        );

        Ok(order)
    }

    /// 按 ID 查询订单
    pub async fn find_one(&self, id: &str) -> AppResult<Order> {
        order_repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))
    }

    /// 分页查询订单 (createdAt 倒序)
    ///
    /// page/limit 低于 1 时取 1，limit 上限 100。
    pub async fn find_all(&self, page: i64, limit: i64) -> AppResult<OrderPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let offset = (page - 1) * limit;

        let total_items = order_repo::count_all(&self.pool).await?;
        let items = order_repo::find_page(&self.pool, limit, offset).await?;

        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + limit - 1) / limit
        };

        let meta = PaginationMeta {
            total_items,
            item_count: items.len() as i64,
            items_per_page: limit,
            total_pages,
            current_page: page,
        };

        Ok(OrderPage { items, meta })
    }

    /// 取消订单
    ///
    /// 仅允许 pending → cancelled；任何后续状态都拒绝。
    pub async fn cancel(&self, id: &str) -> AppResult<Order> {
        let order = self.find_one(id).await?;

        if order.status != OrderStatus::Pending {
            return Err(AppError::business_rule(format!(
                "Order {id} cannot be cancelled from status {}",
                order.status
            )));
        }

        let now = now_millis();
        let swapped = order_repo::update_status(
            &self.pool,
            id,
            order.version,
            OrderStatus::Cancelled,
            now,
        )
        .await?;
        if !swapped {
            return Err(AppError::conflict(format!(
                "Order {id} was modified concurrently"
            )));
        }

        self.audit
            .success(
                AuditAction::OrderCancelled,
                id,
                serde_json::json!({ "previous_status": order.status }),
            )
            .await;

        tracing::info!(order_id = %id, "Order cancelled");

        self.find_one(id).await
    }
}

fn validate_create_input(input: &CreateOrderInput) -> AppResult<()> {
    validate_required_text(&input.customer_name, "customerName", MAX_NAME_LEN)?;
    validate_required_text(&input.customer_email, "customerEmail", MAX_EMAIL_LEN)?;
    if !is_valid_email(&input.customer_email) {
        return Err(AppError::validation("customerEmail must be a valid email"));
    }
    validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;

    if input.items.is_empty() {
        return Err(AppError::validation("items must not be empty"));
    }
    for item in &input.items {
        validate_required_text(&item.name, "item name", MAX_ITEM_NAME_LEN)?;
        if item.quantity < 1 {
            return Err(AppError::validation(format!(
                "item quantity must be at least 1, got {}",
                item.quantity
            )));
        }
        if item.quantity > MAX_QUANTITY {
            return Err(AppError::validation(format!(
                "item quantity exceeds maximum allowed ({MAX_QUANTITY})"
            )));
        }
        require_finite(item.price, "item price")?;
        if item.price < 0.0 {
            return Err(AppError::validation(format!(
                "item price must be non-negative, got {}",
                item.price
            )));
        }
        if item.price > MAX_PRICE {
            return Err(AppError::validation(format!(
                "item price exceeds maximum allowed ({MAX_PRICE})"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateOrderInput {
        CreateOrderInput {
            customer_name: "John Doe".to_string(),
            customer_email: "john@example.com".to_string(),
            items: vec![OrderItem {
                name: "Product XYZ".to_string(),
                quantity: 1,
                price: 29.99,
            }],
            notes: None,
        }
    }

    #[test]
    fn test_validate_create_input() {
        assert!(validate_create_input(&valid_input()).is_ok());

        let mut input = valid_input();
        input.items.clear();
        assert!(validate_create_input(&input).is_err());

        let mut input = valid_input();
        input.items[0].quantity = 0;
        assert!(validate_create_input(&input).is_err());

        let mut input = valid_input();
        input.items[0].price = -0.01;
        assert!(validate_create_input(&input).is_err());

        let mut input = valid_input();
        input.customer_email = "not-an-email".to_string();
        assert!(validate_create_input(&input).is_err());
    }
}
