//! 审计日志服务
//!
//! `AuditService` 通过 mpsc 通道接收日志请求，由后台 worker 异步写入
//! SQLite。查询操作直接读取 storage。
//!
//! 写入是尽力而为的旁路记录：通道关闭或写入失败只产生错误日志，
//! 绝不让业务操作失败。

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::mpsc;

use super::storage::AuditStorage;
use super::types::{AuditAction, AuditEntry, AuditQuery, AuditStatus};
use crate::db::repository::RepoResult;

/// 发送到 AuditService 的日志请求
pub struct AuditLogRequest {
    pub action: AuditAction,
    pub resource_id: String,
    pub status: AuditStatus,
    pub details: serde_json::Value,
    pub error_message: Option<String>,
}

/// 审计日志服务
pub struct AuditService {
    storage: AuditStorage,
    tx: mpsc::Sender<AuditLogRequest>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    /// 创建审计服务
    ///
    /// 返回服务和后台 worker 的接收端，worker 由调用方 spawn。
    pub fn new(pool: SqlitePool, buffer_size: usize) -> (Arc<Self>, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let storage = AuditStorage::new(pool);
        let service = Arc::new(Self { storage, tx });
        (service, rx)
    }

    /// 异步记录一条成功条目（非阻塞旁路）
    pub async fn success(
        &self,
        action: AuditAction,
        resource_id: impl Into<String>,
        details: serde_json::Value,
    ) {
        self.log(action, resource_id, AuditStatus::Success, details, None)
            .await;
    }

    /// 异步记录一条失败条目
    pub async fn error(
        &self,
        action: AuditAction,
        resource_id: impl Into<String>,
        details: serde_json::Value,
        error_message: impl Into<String>,
    ) {
        self.log(
            action,
            resource_id,
            AuditStatus::Error,
            details,
            Some(error_message.into()),
        )
        .await;
    }

    /// 异步记录审计日志
    pub async fn log(
        &self,
        action: AuditAction,
        resource_id: impl Into<String>,
        status: AuditStatus,
        details: serde_json::Value,
        error_message: Option<String>,
    ) {
        let req = AuditLogRequest {
            action,
            resource_id: resource_id.into(),
            status,
            details,
            error_message,
        };

        if self.tx.send(req).await.is_err() {
            tracing::error!("Audit log channel closed — audit entry lost");
        }
    }

    /// 查询审计日志
    pub async fn query(&self, q: &AuditQuery) -> RepoResult<(Vec<AuditEntry>, i64)> {
        self.storage.query(q).await
    }

    /// 获取存储引用 (worker 使用)
    pub fn storage(&self) -> &AuditStorage {
        &self.storage
    }
}
