//! Order Repository
//!
//! The `items` column holds a JSON array; rows are hydrated into
//! [`Order`] on the way out. Status mutations are compare-and-swap on the
//! `version` column — callers must treat 0 affected rows as a lost race.

use sqlx::{FromRow, SqlitePool};

use super::{RepoError, RepoResult};
use crate::db::models::{Order, OrderItem, OrderStatus};

const SELECT_COLUMNS: &str = "id, customer_name, customer_email, items, total_amount, status, \
                              notes, version, created_at, updated_at";

/// Raw row before the JSON/enum columns are decoded
#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    customer_name: String,
    customer_email: String,
    items: String,
    total_amount: f64,
    status: String,
    notes: Option<String>,
    version: i64,
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    fn hydrate(self) -> RepoResult<Order> {
        let items: Vec<OrderItem> = serde_json::from_str(&self.items)
            .map_err(|e| RepoError::Database(format!("Corrupt items column: {e}")))?;
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|_| RepoError::Database(format!("Corrupt status column: {}", self.status)))?;

        Ok(Order {
            id: self.id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            items,
            total_amount: self.total_amount,
            status,
            notes: self.notes,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn hydrate_all(rows: Vec<OrderRow>) -> RepoResult<Vec<Order>> {
    rows.into_iter().map(OrderRow::hydrate).collect()
}

pub async fn insert(pool: &SqlitePool, order: &Order) -> RepoResult<()> {
    let items_json = serde_json::to_string(&order.items)
        .map_err(|e| RepoError::Validation(format!("Unserializable items: {e}")))?;

    sqlx::query(
        "INSERT INTO orders (id, customer_name, customer_email, items, total_amount, status, \
         notes, version, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&order.id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&items_json)
    .bind(order.total_amount)
    .bind(order.status.as_str())
    .bind(&order.notes)
    .bind(order.version)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(OrderRow::hydrate).transpose()
}

pub async fn count_all(pool: &SqlitePool) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Page of orders, newest first
pub async fn find_page(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    hydrate_all(rows)
}

/// Orders created inside `[start, end]` (both bounds inclusive, Unix millis)
pub async fn find_created_between(
    pool: &SqlitePool,
    start: i64,
    end: i64,
) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM orders WHERE created_at >= ? AND created_at <= ? \
         ORDER BY created_at ASC"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    hydrate_all(rows)
}

/// Pending orders created before `cutoff` (Unix millis), oldest first
pub async fn find_stale_pending(pool: &SqlitePool, cutoff: i64) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM orders WHERE status = ? AND created_at < ? \
         ORDER BY created_at ASC"
    ))
    .bind(OrderStatus::Pending.as_str())
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    hydrate_all(rows)
}

/// Compare-and-swap status transition
///
/// Returns `false` when the row was not found at `expected_version`
/// (concurrent writer won the race, or the id does not exist).
pub async fn update_status(
    pool: &SqlitePool,
    id: &str,
    expected_version: i64,
    new_status: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET status = ?, updated_at = ?, version = version + 1 \
         WHERE id = ? AND version = ?",
    )
    .bind(new_status.as_str())
    .bind(now)
    .bind(id)
    .bind(expected_version)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
