use thiserror::Error;

/// 服务器启动/运行错误
///
/// HTTP handler 层使用 [`crate::AppError`]；这里只覆盖进程边界的失败。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("数据库初始化失败: {0}")]
    Database(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

/// 进程边界的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
