//! 服务器状态
//!
//! [`ServerState`] 持有所有服务的共享引用，使用 Arc 实现浅拷贝，
//! 克隆成本极低。axum handler 通过 `State<ServerState>` 访问。

use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::AppError;
use crate::audit::{AuditLogRequest, AuditService, worker as audit_worker};
use crate::auth::JwtService;
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, Schedule, TaskKind};
use crate::db::DbService;
use crate::message::{MessageBus, MessageHandler};
use crate::orders::{OrderService, ProcessingService};
use crate::reports::ReportService;

/// 审计通道缓冲大小
const AUDIT_BUFFER_SIZE: usize = 256;

/// 服务器状态 - 持有所有服务的单例引用
///
/// # 服务组件
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | SQLite 连接池 |
/// | jwt_service | JWT 认证服务 |
/// | message_bus | 进程内消息总线 |
/// | audit | 审计日志服务 |
/// | orders | 订单生命周期服务 |
/// | processing | 订单处理服务 |
/// | reports | 报表服务 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub message_bus: Arc<MessageBus>,
    pub audit: Arc<AuditService>,
    pub orders: OrderService,
    pub processing: ProcessingService,
    pub reports: ReportService,
    /// 审计 worker 的接收端，`start_background_tasks` 取走后为 None
    audit_rx: Arc<Mutex<Option<mpsc::Receiver<AuditLogRequest>>>>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：工作目录结构 → 数据库 → 各服务。
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_dir().join("orders.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        Ok(Self::from_parts(config.clone(), db_service))
    }

    /// 从现成的数据库构造状态 (测试使用内存库)
    pub fn from_parts(config: Config, db_service: DbService) -> Self {
        let pool = db_service.pool;
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let message_bus = Arc::new(MessageBus::new());
        let (audit, audit_rx) = AuditService::new(pool.clone(), AUDIT_BUFFER_SIZE);

        let orders = OrderService::new(pool.clone(), message_bus.clone(), audit.clone());
        let processing = ProcessingService::new(
            pool.clone(),
            audit.clone(),
            config.processing_delay_ms,
            config.pending_retry_after_minutes,
        );
        let reports = ReportService::new(pool.clone(), audit.clone(), config.timezone);

        Self {
            config,
            db: pool,
            jwt_service,
            message_bus,
            audit,
            orders,
            processing,
            reports,
            audit_rx: Arc::new(Mutex::new(Some(audit_rx))),
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 开始服务之前调用。
    ///
    /// 注册的任务：
    /// - 审计日志 writer (Worker)
    /// - 消息处理器 (Listener) — 消费 order_created 事件
    /// - 滞留 pending 订单清理 (Periodic, 每小时)
    /// - 昨日报表 (Periodic, 每天业务时区零点)
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        // 1. Audit writer
        if let Some(rx) = self.audit_rx.lock().expect("audit_rx mutex poisoned").take() {
            let storage = self.audit.storage().clone();
            let token = tasks.shutdown_token();
            tasks.spawn("audit_writer", TaskKind::Worker, async move {
                audit_worker::run(rx, storage, token).await;
            });
        }

        // 2. Message handler — the consumer side of the event channel
        let handler = MessageHandler::with_default_processors(
            self.message_bus.subscribe(),
            tasks.shutdown_token(),
            self,
        );
        tasks.spawn("message_handler", TaskKind::Listener, async move {
            handler.run().await;
        });

        // 3. Hourly sweep of stale pending orders
        let processing = self.processing.clone();
        tasks.spawn_recurring(
            "pending_sweep",
            Schedule::Every(std::time::Duration::from_secs(
                self.config.cleanup_interval_minutes * 60,
            )),
            move || {
                let processing = processing.clone();
                async move { processing.cleanup_old_pending_orders().await }
            },
        );

        // 4. Nightly report for yesterday
        let reports = self.reports.clone();
        tasks.spawn_recurring(
            "nightly_report",
            Schedule::DailyAt(chrono::NaiveTime::MIN, self.config.timezone),
            move || {
                let reports = reports.clone();
                async move { reports.generate_automatic_daily_report().await }
            },
        );

        tasks.log_summary();
    }
}
