//! Audit Log Worker
//!
//! Drains the audit channel and persists entries. Runs until the channel
//! closes or the shutdown token fires; pending entries in the channel are
//! flushed before exit.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::service::AuditLogRequest;
use super::storage::AuditStorage;

pub async fn run(
    mut rx: mpsc::Receiver<AuditLogRequest>,
    storage: AuditStorage,
    shutdown: CancellationToken,
) {
    tracing::debug!("Audit worker started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                // Flush whatever is still queued
                while let Ok(req) = rx.try_recv() {
                    write_entry(&storage, req).await;
                }
                break;
            }
            req = rx.recv() => {
                match req {
                    Some(req) => write_entry(&storage, req).await,
                    None => break,
                }
            }
        }
    }

    tracing::debug!("Audit worker stopped");
}

async fn write_entry(storage: &AuditStorage, req: AuditLogRequest) {
    if let Err(e) = storage
        .append(
            req.action,
            &req.resource_id,
            req.status,
            req.details,
            req.error_message.as_deref(),
        )
        .await
    {
        tracing::error!(action = %req.action, error = %e, "Failed to write audit entry");
    }
}
