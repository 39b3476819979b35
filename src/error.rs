//! 错误处理模块
//!
//! 运行时的统一错误类型。会话过期、停机超时等“结果”不在这里，
//! 它们以结果值（`SessionStatus`、`StopOutcome`）返回给调用方。

use thiserror::Error;

/// 运行时错误类型
#[derive(Error, Debug)]
pub enum TakeawayError {
    /// 连接建立失败（工厂或驱动）
    #[error("连接错误: {message}")]
    ConnectionError { message: String },

    /// 失效连接重连失败，数据库不可用
    #[error("数据库不可用: {message}")]
    DatabaseUnavailable { message: String },

    /// 语句执行失败
    #[error("查询错误: {message}")]
    QueryError { message: String },

    /// 连接池已达上限（仅在配置了 max_size 且策略为拒绝或阻塞超时时出现）
    #[error("连接池已耗尽: 上限={max_size}")]
    PoolExhausted { max_size: usize },

    /// 连接池已被清空关闭
    #[error("连接池已关闭")]
    PoolClosed,

    /// 任务队列已关闭，不再接受新任务
    #[error("任务队列已关闭")]
    QueueClosed,

    /// 服务已在运行
    #[error("服务已在运行")]
    AlreadyRunning,

    /// 服务生命周期错误（线程创建失败等）
    #[error("服务错误: {message}")]
    ServerError { message: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    ConfigError { message: String },

    /// 验证错误
    #[error("验证错误: {field} - {message}")]
    ValidationError { field: String, message: String },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    SerializationError { message: String },

    /// IO 错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 运行时结果类型
pub type TakeawayResult<T> = Result<T, TakeawayError>;

impl TakeawayError {
    /// 是否属于可通过重连恢复的数据库错误
    ///
    /// 语句本身的错误（`QueryError`）不在其中，重连只会丢掉会话状态
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TakeawayError::ConnectionError { .. } | TakeawayError::DatabaseUnavailable { .. }
        )
    }
}

/// 快速构造错误的宏
#[macro_export]
macro_rules! quick_error {
    (connection, $msg:expr) => {
        $crate::error::TakeawayError::ConnectionError {
            message: $msg.to_string(),
        }
    };
    (unavailable, $msg:expr) => {
        $crate::error::TakeawayError::DatabaseUnavailable {
            message: $msg.to_string(),
        }
    };
    (query, $msg:expr) => {
        $crate::error::TakeawayError::QueryError {
            message: $msg.to_string(),
        }
    };
    (server, $msg:expr) => {
        $crate::error::TakeawayError::ServerError {
            message: $msg.to_string(),
        }
    };
    (config, $msg:expr) => {
        $crate::error::TakeawayError::ConfigError {
            message: $msg.to_string(),
        }
    };
    (validation, $field:expr, $msg:expr) => {
        $crate::error::TakeawayError::ValidationError {
            field: $field.to_string(),
            message: $msg.to_string(),
        }
    };
    (serialization, $msg:expr) => {
        $crate::error::TakeawayError::SerializationError {
            message: $msg.to_string(),
        }
    };
}
