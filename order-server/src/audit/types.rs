//! 审计日志类型定义
//!
//! 订单生命周期、认证和报表生成的旁路记录。
//! 写入是尽力而为的：审计失败绝不影响业务操作本身。

use serde::{Deserialize, Serialize};

/// 审计操作类型（枚举，非自由文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 订单生命周期 ═══
    /// 订单创建
    OrderCreated,
    /// 订单取消
    OrderCancelled,
    /// 处理开始
    ProcessingStarted,
    /// 处理完成
    ProcessingCompleted,
    /// 处理失败
    ProcessingError,

    // ═══ 报表 ═══
    /// 报表生成
    ReportGenerated,

    // ═══ 认证 ═══
    /// 登录成功
    LoginSuccess,
    /// 登录失败
    LoginFailed,
    /// 用户注册
    UserRegistered,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::OrderCreated => "order_created",
            AuditAction::OrderCancelled => "order_cancelled",
            AuditAction::ProcessingStarted => "processing_started",
            AuditAction::ProcessingCompleted => "processing_completed",
            AuditAction::ProcessingError => "processing_error",
            AuditAction::ReportGenerated => "report_generated",
            AuditAction::LoginSuccess => "login_success",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::UserRegistered => "user_registered",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order_created" => Ok(AuditAction::OrderCreated),
            "order_cancelled" => Ok(AuditAction::OrderCancelled),
            "processing_started" => Ok(AuditAction::ProcessingStarted),
            "processing_completed" => Ok(AuditAction::ProcessingCompleted),
            "processing_error" => Ok(AuditAction::ProcessingError),
            "report_generated" => Ok(AuditAction::ReportGenerated),
            "login_success" => Ok(AuditAction::LoginSuccess),
            "login_failed" => Ok(AuditAction::LoginFailed),
            "user_registered" => Ok(AuditAction::UserRegistered),
            other => Err(format!("Unknown audit action: {other}")),
        }
    }
}

/// 条目结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Error,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Error => "error",
        }
    }
}

/// 审计日志条目（不可变，只追加）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 自增序列号
    pub id: i64,
    /// 时间戳（Unix 毫秒）
    pub timestamp: i64,
    /// 操作类型
    pub action: AuditAction,
    /// 资源 ID（订单 ID，系统事件为 "system"）
    pub resource_id: String,
    /// 结果状态
    pub status: AuditStatus,
    /// 结构化详情（JSON）
    pub details: serde_json::Value,
    /// 错误信息（失败条目）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    /// 起始时间（Unix 毫秒，含）
    pub from: Option<i64>,
    /// 截止时间（Unix 毫秒，含）
    pub to: Option<i64>,
    /// 资源 ID 过滤
    pub resource_id: Option<String>,
    /// 分页偏移
    #[serde(default)]
    pub offset: i64,
    /// 分页大小（默认 50）
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            resource_id: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

/// 审计日志列表响应
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: i64,
}
