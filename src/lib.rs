//! rat_takeaway - 外卖平台后端并发运行时
//!
//! 提供固定大小的工作线程池、可关闭的任务队列、弹性数据库连接池、
//! 带过期时间的会话存储，以及可限时停机的服务生命周期管理

// 导出所有公共模块
pub mod config;
pub mod error;
pub mod pool;
pub mod queue;
pub mod server;
pub mod session;
pub mod types;
pub mod utils;

// 重新导出常用类型和函数
pub use config::{
    AppConfig, AppConfigBuilder, DatabaseConfigBuilder, LogLevel, LoggingConfig,
    LoggingConfigBuilder, MAX_SESSION_TTL_SECS, PoolConfigBuilder, ServerConfig,
    ServerConfigBuilder, SessionConfig, SessionConfigBuilder, init_logging, mysql_config, postgres_config, sqlite_config,
};
pub use error::{TakeawayError, TakeawayResult};
pub use pool::{
    ConnectionFactory, ConnectionHandle, ConnectionPool, DatabaseConnection, KeepaliveReport,
    PoolStats, PooledConnection, create_connection_factory,
};
pub use queue::{Task, TaskQueue, WorkerPool, WorkerPoolStats};
pub use server::{
    HealthStatus, ProbeHandler, RequestContext, RequestHandler, Server, ServerState, ServerStats,
    StopOutcome,
};
pub use session::{Clock, ManualClock, SessionRecord, SessionStatus, SessionStore, SystemClock};
pub use types::*;

// 日志系统导入
use rat_logger::info;

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 初始化 rat_takeaway 库
///
/// 注意：日志系统由调用者自行初始化（见 `config::init_logging`），本库不会自动初始化日志
pub fn init() {
    info!("{} 初始化", get_info());
}

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
