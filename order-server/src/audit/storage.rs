//! Audit Log Storage
//!
//! Append-only writes and filtered reads over the `audit_log` table.

use sqlx::{FromRow, SqlitePool};

use super::types::{AuditAction, AuditEntry, AuditQuery, AuditStatus};
use crate::db::repository::{RepoError, RepoResult};
use crate::utils::now_millis;

#[derive(Debug, FromRow)]
struct AuditRow {
    id: i64,
    timestamp: i64,
    action: String,
    resource_id: String,
    status: String,
    details: String,
    error_message: Option<String>,
}

impl AuditRow {
    fn hydrate(self) -> RepoResult<AuditEntry> {
        let action: AuditAction = self
            .action
            .parse()
            .map_err(|_| RepoError::Database(format!("Corrupt action column: {}", self.action)))?;
        let status = match self.status.as_str() {
            "success" => AuditStatus::Success,
            "error" => AuditStatus::Error,
            other => {
                return Err(RepoError::Database(format!(
                    "Corrupt status column: {other}"
                )));
            }
        };
        let details: serde_json::Value = serde_json::from_str(&self.details)
            .map_err(|e| RepoError::Database(format!("Corrupt details column: {e}")))?;

        Ok(AuditEntry {
            id: self.id,
            timestamp: self.timestamp,
            action,
            resource_id: self.resource_id,
            status,
            details,
            error_message: self.error_message,
        })
    }
}

/// Audit storage over the shared pool
#[derive(Clone)]
pub struct AuditStorage {
    pool: SqlitePool,
}

impl AuditStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an entry
    pub async fn append(
        &self,
        action: AuditAction,
        resource_id: &str,
        status: AuditStatus,
        details: serde_json::Value,
        error_message: Option<&str>,
    ) -> RepoResult<i64> {
        let details_json =
            serde_json::to_string(&details).unwrap_or_else(|_| "{}".to_string());

        let result = sqlx::query(
            "INSERT INTO audit_log (timestamp, action, resource_id, status, details, error_message) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(now_millis())
        .bind(action.as_str())
        .bind(resource_id)
        .bind(status.as_str())
        .bind(details_json)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Query entries, newest first
    pub async fn query(&self, q: &AuditQuery) -> RepoResult<(Vec<AuditEntry>, i64)> {
        let mut conditions = Vec::new();
        if q.from.is_some() {
            conditions.push("timestamp >= ?");
        }
        if q.to.is_some() {
            conditions.push("timestamp <= ?");
        }
        if q.resource_id.is_some() {
            conditions.push("resource_id = ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM audit_log{where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(from) = q.from {
            count_query = count_query.bind(from);
        }
        if let Some(to) = q.to {
            count_query = count_query.bind(to);
        }
        if let Some(resource_id) = &q.resource_id {
            count_query = count_query.bind(resource_id);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let rows_sql = format!(
            "SELECT id, timestamp, action, resource_id, status, details, error_message \
             FROM audit_log{where_clause} ORDER BY id DESC LIMIT ? OFFSET ?"
        );
        let mut rows_query = sqlx::query_as::<_, AuditRow>(&rows_sql);
        if let Some(from) = q.from {
            rows_query = rows_query.bind(from);
        }
        if let Some(to) = q.to {
            rows_query = rows_query.bind(to);
        }
        if let Some(resource_id) = &q.resource_id {
            rows_query = rows_query.bind(resource_id);
        }
        let rows = rows_query
            .bind(q.limit.clamp(1, 500))
            .bind(q.offset.max(0))
            .fetch_all(&self.pool)
            .await?;

        let entries = rows
            .into_iter()
            .map(AuditRow::hydrate)
            .collect::<RepoResult<Vec<_>>>()?;

        Ok((entries, total))
    }
}
