//! 后台任务管理
//!
//! 统一管理所有后台任务的注册、启动和关闭。
//!
//! # 任务类型
//!
//! - [`TaskKind::Worker`] - 长期后台工作者
//! - [`TaskKind::Listener`] - 事件监听器
//! - [`TaskKind::Periodic`] - 定时任务
//!
//! 定时任务通过 [`Schedule`] 注册 (周期 + 回调)。回调的错误在循环边界
//! 捕获并记录，绝不终止任务循环。

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::AppError;

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// 长期后台工作者
    Worker,
    /// 事件监听器
    Listener,
    /// 定时任务
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Worker => write!(f, "Worker"),
            TaskKind::Listener => write!(f, "Listener"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

/// 定时任务的触发计划
#[derive(Debug, Clone, Copy)]
pub enum Schedule {
    /// 固定间隔触发
    Every(Duration),
    /// 每天在业务时区的固定时刻触发
    DailyAt(NaiveTime, Tz),
}

impl Schedule {
    /// 距离下一次触发的等待时长
    fn next_delay(&self) -> Duration {
        match self {
            Schedule::Every(interval) => *interval,
            Schedule::DailyAt(time, tz) => {
                let now = chrono::Utc::now().with_timezone(tz);
                let mut next = now.date_naive().and_time(*time);
                if next <= now.naive_local() {
                    next = next + chrono::Duration::days(1);
                }
                (next - now.naive_local())
                    .to_std()
                    .unwrap_or(Duration::from_secs(60))
            }
        }
    }
}

/// 已注册的后台任务
struct RegisteredTask {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// 后台任务管理器
///
/// 统一管理所有后台任务的注册和生命周期。
///
/// # 使用示例
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
///
/// tasks.spawn("audit_writer", TaskKind::Worker, async move {
///     // 任务逻辑
/// });
///
/// tasks.spawn_recurring("pending_sweep", Schedule::Every(interval), move || {
///     let state = state.clone();
///     async move { state.processing.cleanup_old_pending_orders().await }
/// });
///
/// // Graceful shutdown
/// tasks.shutdown().await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    /// 创建新的任务管理器
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 获取取消令牌（用于任务内部监听 shutdown 信号）
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册并启动一个后台任务
    ///
    /// 任务会被包装以捕获 panic，如果任务异常退出会记录错误日志。
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let wrapped_future = async move {
            let result: Result<(), Box<dyn std::any::Any + Send>> =
                AssertUnwindSafe(future).catch_unwind().await;
            match result {
                Ok(()) => {
                    tracing::debug!(task = %name, kind = %kind, "Background task finished");
                }
                Err(panic_info) => {
                    let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(
                        task = %name,
                        kind = %kind,
                        panic = %panic_msg,
                        "Background task panicked! This is a bug that should be reported."
                    );
                }
            }
        };

        let handle = tokio::spawn(wrapped_future);
        tracing::debug!(task = %name, kind = %kind, "Registered background task");
        self.tasks.push(RegisteredTask { name, kind, handle });
    }

    /// 注册一个定时任务
    ///
    /// 按 [`Schedule`] 周期调用 `job`。回调返回的错误在这里捕获并记录，
    /// 不会向外传播，也不会终止循环 — 定时任务绝不允许拖垮进程。
    pub fn spawn_recurring<F, Fut>(&mut self, name: &'static str, schedule: Schedule, mut job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let token = self.shutdown.clone();
        self.spawn(name, TaskKind::Periodic, async move {
            loop {
                let delay = schedule.next_delay();
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::debug!(task = %name, "Recurring task cancelled");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {
                        if let Err(e) = job().await {
                            tracing::error!(task = %name, error = %e, "Recurring task failed");
                        }
                    }
                }
            }
        });
    }

    /// 打印任务摘要
    pub fn log_summary(&self) {
        let worker = self.tasks.iter().filter(|t| t.kind == TaskKind::Worker).count();
        let listener = self.tasks.iter().filter(|t| t.kind == TaskKind::Listener).count();
        let periodic = self.tasks.iter().filter(|t| t.kind == TaskKind::Periodic).count();
        tracing::info!(
            "Background tasks registered: {} total (Worker: {}, Listener: {}, Periodic: {})",
            self.tasks.len(),
            worker,
            listener,
            periodic
        );
    }

    /// Graceful shutdown - 取消所有任务并等待完成
    pub async fn shutdown(self) {
        tracing::info!("Shutting down {} background tasks...", self.tasks.len());

        self.shutdown.cancel();

        for task in self.tasks {
            match task.handle.await {
                Ok(()) => {
                    tracing::debug!(task = %task.name, "Task completed");
                }
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(task = %task.name, "Task cancelled");
                }
                Err(e) => {
                    tracing::error!(task = %task.name, error = ?e, "Task panicked");
                }
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_recurring_task_survives_errors() {
        let mut tasks = BackgroundTasks::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        tasks.spawn_recurring(
            "failing_job",
            Schedule::Every(Duration::from_millis(10)),
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::internal("boom"))
                }
            },
        );

        tokio::time::sleep(Duration::from_millis(60)).await;
        tasks.shutdown().await;

        // The job failed every time yet kept being rescheduled
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_tasks() {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        tasks.spawn("waiter", TaskKind::Worker, async move {
            token.cancelled().await;
        });

        tasks.shutdown().await;
    }
}
