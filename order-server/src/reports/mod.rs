//! Report Aggregator
//!
//! Daily and date-range statistics computed on demand over the order
//! store. Reports are derived, never persisted. Sums run through
//! `Decimal` and land as 2-dp `f64` on the wire.
//!
//! Windows are whole calendar days in the configured business timezone:
//! `[00:00:00.000, 23:59:59.999]`, both ends inclusive.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::AppError;
use crate::audit::{AuditAction, AuditService};
use crate::db::models::{Order, OrderStatus};
use crate::db::repository::order as order_repo;
use crate::utils::time::{day_end_millis, day_start_millis, millis_to_date_string, today};
use crate::utils::AppResult;

/// 各状态订单数 (缺失状态填零)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersByStatus {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl OrdersByStatus {
    fn count(orders: &[Order]) -> Self {
        let mut counts = Self::default();
        for order in orders {
            match order.status {
                OrderStatus::Pending => counts.pending += 1,
                OrderStatus::Processing => counts.processing += 1,
                OrderStatus::Completed => counts.completed += 1,
                OrderStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    /// 各状态计数之和
    pub fn total(&self) -> i64 {
        self.pending + self.processing + self.completed + self.cancelled
    }
}

/// 单日聚合桶
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayBucket {
    pub count: i64,
    pub amount: f64,
}

/// 日报
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    /// 报表覆盖的日期 (YYYY-MM-DD)
    pub date: String,
    pub total_orders: i64,
    pub total_amount: f64,
    pub average_order_value: f64,
    pub orders_by_status: OrdersByStatus,
}

/// 区间报表 — 日报的超集，额外含按天分桶
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeReport {
    /// 报表生成日期 (YYYY-MM-DD)
    pub date: String,
    pub start_date: String,
    pub end_date: String,
    pub total_orders: i64,
    pub total_amount: f64,
    pub average_order_value: f64,
    pub orders_by_status: OrdersByStatus,
    pub orders_by_day: BTreeMap<String, DayBucket>,
}

/// 报表服务
#[derive(Clone)]
pub struct ReportService {
    pool: SqlitePool,
    audit: Arc<AuditService>,
    tz: Tz,
}

impl ReportService {
    pub fn new(pool: SqlitePool, audit: Arc<AuditService>, tz: Tz) -> Self {
        Self { pool, audit, tz }
    }

    /// 生成指定日期的日报
    pub async fn generate_daily_report(&self, date: NaiveDate) -> AppResult<DailyReport> {
        let date_str = date.format("%Y-%m-%d").to_string();
        tracing::info!(date = %date_str, "Generating daily report");

        let start = day_start_millis(date, self.tz);
        let end = day_end_millis(date, self.tz);
        let orders = order_repo::find_created_between(&self.pool, start, end).await?;

        let (total_amount, average_order_value) = totals(&orders)?;
        let report = DailyReport {
            date: date_str,
            total_orders: orders.len() as i64,
            total_amount,
            average_order_value,
            orders_by_status: OrdersByStatus::count(&orders),
        };

        // Audit after computing: a read followed by a best-effort write
        self.audit
            .success(
                AuditAction::ReportGenerated,
                "system",
                serde_json::json!({ "report": &report }),
            )
            .await;

        Ok(report)
    }

    /// 生成日期区间报表
    ///
    /// 起始日期晚于结束日期视为调用方错误，直接拒绝。
    pub async fn generate_date_range_report(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<DateRangeReport> {
        if start_date > end_date {
            return Err(AppError::validation(format!(
                "startDate {start_date} is after endDate {end_date}"
            )));
        }

        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();
        tracing::info!(start = %start_str, end = %end_str, "Generating date range report");

        let start = day_start_millis(start_date, self.tz);
        let end = day_end_millis(end_date, self.tz);
        let orders = order_repo::find_created_between(&self.pool, start, end).await?;

        let (total_amount, average_order_value) = totals(&orders)?;
        let report = DateRangeReport {
            date: today(self.tz).format("%Y-%m-%d").to_string(),
            start_date: start_str,
            end_date: end_str,
            total_orders: orders.len() as i64,
            total_amount,
            average_order_value,
            orders_by_status: OrdersByStatus::count(&orders),
            orders_by_day: self.group_by_day(&orders)?,
        };

        self.audit
            .success(
                AuditAction::ReportGenerated,
                "system",
                serde_json::json!({ "report": &report }),
            )
            .await;

        Ok(report)
    }

    /// 昨日报表定时任务 (每天业务时区零点)
    ///
    /// 错误由调度器边界捕获记录，这个任务绝不允许拖垮进程。
    pub async fn generate_automatic_daily_report(&self) -> AppResult<()> {
        tracing::info!("Running automatic daily report");

        let yesterday = today(self.tz)
            .pred_opt()
            .ok_or_else(|| AppError::internal("Date underflow computing yesterday"))?;

        let report = self.generate_daily_report(yesterday).await?;
        tracing::info!(
            report = %serde_json::to_string(&report).unwrap_or_default(),
            "Automatic daily report generated"
        );
        Ok(())
    }

    /// 按 createdAt 的业务时区日期分桶
    fn group_by_day(&self, orders: &[Order]) -> AppResult<BTreeMap<String, DayBucket>> {
        let mut days: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();
        for order in orders {
            let key = millis_to_date_string(order.created_at, self.tz);
            let amount = decimal_amount(order)?;
            let entry = days.entry(key).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += amount;
        }

        days.into_iter()
            .map(|(day, (count, amount))| {
                Ok((
                    day,
                    DayBucket {
                        count,
                        amount: to_money(amount)?,
                    },
                ))
            })
            .collect()
    }
}

fn decimal_amount(order: &Order) -> AppResult<Decimal> {
    Decimal::from_f64(order.total_amount).ok_or_else(|| {
        AppError::internal(format!(
            "Order {} has non-finite total_amount",
            order.id
        ))
    })
}

/// 总额与平均值 (空集时均为 0)
fn totals(orders: &[Order]) -> AppResult<(f64, f64)> {
    let mut total = Decimal::ZERO;
    for order in orders {
        total += decimal_amount(order)?;
    }

    let average = if orders.is_empty() {
        Decimal::ZERO
    } else {
        total / Decimal::from(orders.len() as i64)
    };

    Ok((to_money(total)?, to_money(average)?))
}

fn to_money(value: Decimal) -> AppResult<f64> {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .ok_or_else(|| AppError::internal("Report amount out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::OrderItem;
    use uuid::Uuid;

    fn order(status: OrderStatus, total: f64, created_at: i64) -> Order {
        Order {
            id: Uuid::new_v4().to_string(),
            customer_name: "Test".to_string(),
            customer_email: "test@example.com".to_string(),
            items: vec![OrderItem {
                name: "Item".to_string(),
                quantity: 1,
                price: total,
            }],
            total_amount: total,
            status,
            notes: None,
            version: 0,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_totals_empty() {
        let (total, average) = totals(&[]).unwrap();
        assert_eq!(total, 0.0);
        assert_eq!(average, 0.0);
    }

    #[test]
    fn test_totals_fixture() {
        // {completed: $100, pending: $50, completed: $100}
        let orders = vec![
            order(OrderStatus::Completed, 100.0, 0),
            order(OrderStatus::Pending, 50.0, 0),
            order(OrderStatus::Completed, 100.0, 0),
        ];

        let (total, average) = totals(&orders).unwrap();
        assert_eq!(total, 250.0);
        assert_eq!(average, 83.33);

        let by_status = OrdersByStatus::count(&orders);
        assert_eq!(by_status.pending, 1);
        assert_eq!(by_status.completed, 2);
        assert_eq!(by_status.processing, 0);
        assert_eq!(by_status.cancelled, 0);
        assert_eq!(by_status.total(), orders.len() as i64);
    }
}
