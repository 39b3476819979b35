//! 连接池模块
//!
//! 独占式数据库连接句柄的缓存：按需创建、跨请求复用，
//! 默认弹性增长，可选上限与拒绝/阻塞策略，借出前探活并在失效时重连

pub mod factory;
pub mod pool;
pub mod stats;
#[cfg(any(
    feature = "sqlite-support",
    feature = "postgres-support",
    feature = "mysql-support"
))]
pub mod sqlx_driver;
pub mod types;

// 重新导出主要的公共类型和结构体
pub use factory::create_connection_factory;
pub use pool::{ConnectionPool, PooledConnection};
#[cfg(any(
    feature = "sqlite-support",
    feature = "postgres-support",
    feature = "mysql-support"
))]
pub use sqlx_driver::{SqlxConnection, SqlxConnectionFactory};
pub use stats::{KeepaliveReport, PoolStats};
pub use types::{ConnectionFactory, ConnectionHandle, DatabaseConnection};
