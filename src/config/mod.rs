//! # 配置管理模块
//!
//! 服务、数据库、连接池、会话和日志配置，支持构建器模式和配置文件

pub mod builders;
pub mod convenience;
pub mod core;

pub use builders::{
    AppConfigBuilder, DatabaseConfigBuilder, LoggingConfigBuilder, PoolConfigBuilder,
    ServerConfigBuilder, SessionConfigBuilder,
};
pub use convenience::{mysql_config, postgres_config, sqlite_config};
pub use self::core::{
    AppConfig, LogLevel, LoggingConfig, MAX_SESSION_TTL_SECS, ServerConfig, SessionConfig,
    init_logging,
};
