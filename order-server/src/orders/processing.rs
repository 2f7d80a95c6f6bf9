//! Order Processing Service
//!
//! Drives the pending → processing → completed transition. The work step
//! is a fixed-duration placeholder standing in for real fulfilment; swap
//! the sleep for an actual task when one exists.
//!
//! Every status write is a compare-and-swap on the order's `version`
//! column, so two concurrent transitions for the same order cannot
//! silently overwrite each other — the loser gets a conflict.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::AppError;
use crate::audit::{AuditAction, AuditService};
use crate::db::models::OrderStatus;
use crate::db::repository::order as order_repo;
use crate::utils::{AppResult, now_millis};

/// 订单处理服务
#[derive(Clone)]
pub struct ProcessingService {
    pool: SqlitePool,
    audit: Arc<AuditService>,
    /// 处理占位耗时 (毫秒)
    processing_delay_ms: u64,
    /// 滞留 pending 订单重试阈值 (分钟)
    pending_retry_after_minutes: i64,
}

impl ProcessingService {
    pub fn new(
        pool: SqlitePool,
        audit: Arc<AuditService>,
        processing_delay_ms: u64,
        pending_retry_after_minutes: i64,
    ) -> Self {
        Self {
            pool,
            audit,
            processing_delay_ms,
            pending_retry_after_minutes,
        }
    }

    /// 处理订单: 置 processing → 执行工作 → 置 completed
    ///
    /// 任何失败向调用方传播，不做补偿回滚 — 订单可能停留在
    /// processing，由审计日志暴露，人工或重试驱动恢复。
    pub async fn process_order(&self, order_id: &str) -> AppResult<()> {
        let started_at = now_millis();
        tracing::info!(order_id = %order_id, "Processing order");

        match self.run_transitions(order_id, started_at).await {
            Ok(()) => {
                let elapsed = now_millis() - started_at;
                self.audit
                    .success(
                        AuditAction::ProcessingCompleted,
                        order_id,
                        serde_json::json!({ "processing_time_ms": elapsed }),
                    )
                    .await;
                tracing::info!(
                    order_id = %order_id,
                    processing_time_ms = %elapsed,
                    "Order processing completed"
                );
                Ok(())
            }
            Err(e) => {
                self.audit
                    .error(
                        AuditAction::ProcessingError,
                        order_id,
                        serde_json::json!({ "started_at": started_at }),
                        e.to_string(),
                    )
                    .await;
                tracing::error!(order_id = %order_id, error = %e, "Order processing failed");
                Err(e)
            }
        }
    }

    async fn run_transitions(&self, order_id: &str, started_at: i64) -> AppResult<()> {
        let order = order_repo::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;

        self.audit
            .success(
                AuditAction::ProcessingStarted,
                order_id,
                serde_json::json!({ "timestamp": started_at }),
            )
            .await;

        let swapped = order_repo::update_status(
            &self.pool,
            order_id,
            order.version,
            OrderStatus::Processing,
            now_millis(),
        )
        .await?;
        if !swapped {
            return Err(AppError::conflict(format!(
                "Order {order_id} was modified concurrently"
            )));
        }

        self.perform_work().await;

        let swapped = order_repo::update_status(
            &self.pool,
            order_id,
            order.version + 1,
            OrderStatus::Completed,
            now_millis(),
        )
        .await?;
        if !swapped {
            return Err(AppError::conflict(format!(
                "Order {order_id} was modified concurrently during processing"
            )));
        }

        Ok(())
    }

    /// 处理工作占位 — 固定耗时
    async fn perform_work(&self) {
        tokio::time::sleep(tokio::time::Duration::from_millis(self.processing_delay_ms)).await;
    }

    /// 清理滞留的 pending 订单 (每小时定时任务)
    ///
    /// 逐个重新处理超过阈值的 pending 订单，单个失败记录后继续。
    /// 没有退避、没有重试上限、没有死信 — 反复失败的订单每轮都会
    /// 再次被拾起。
    pub async fn cleanup_old_pending_orders(&self) -> AppResult<()> {
        tracing::info!("Running stale pending order sweep");

        let cutoff = now_millis() - self.pending_retry_after_minutes * 60 * 1000;
        let stale = order_repo::find_stale_pending(&self.pool, cutoff).await?;

        tracing::info!(count = stale.len(), "Found stale pending orders");

        for order in stale {
            if let Err(e) = self.process_order(&order.id).await {
                tracing::error!(
                    order_id = %order.id,
                    error = %e,
                    "Stale order reprocessing failed; will retry next sweep"
                );
            }
        }

        Ok(())
    }
}
