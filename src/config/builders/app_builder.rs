//! # 应用配置构建器模块
//!
//! 组合各分节配置，数据库配置必须设置

use crate::config::core::{AppConfig, LoggingConfig, ServerConfig, SessionConfig};
use crate::error::TakeawayResult;
use crate::types::{DatabaseConfig, PoolConfig};
use rat_logger::info;

/// 应用配置构建器
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server: Option<ServerConfig>,
    database: Option<DatabaseConfig>,
    pool: Option<PoolConfig>,
    session: Option<SessionConfig>,
    logging: Option<LoggingConfig>,
}

impl AppConfig {
    /// 创建应用配置构建器
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }
}

impl AppConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置服务配置
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// 设置数据库配置
    ///
    /// # 参数
    ///
    /// * `database` - 数据库配置
    pub fn database(mut self, database: DatabaseConfig) -> Self {
        self.database = Some(database);
        self
    }

    /// 设置连接池配置
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = Some(pool);
        self
    }

    /// 设置会话配置
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = Some(session);
        self
    }

    /// 设置日志配置
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// 构建应用配置
    ///
    /// # 错误
    ///
    /// 数据库配置未设置或任一分节校验失败时返回错误
    pub fn build(self) -> TakeawayResult<AppConfig> {
        let database = self
            .database
            .ok_or_else(|| crate::quick_error!(config, "数据库配置必须设置"))?;

        let config = AppConfig {
            server: self.server.unwrap_or_default(),
            database,
            pool: self.pool.unwrap_or_default(),
            session: self.session.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        };
        config.validate()?;

        info!(
            "创建应用配置: 端口={}, 数据库={}",
            config.server.port, config.database.alias
        );
        Ok(config)
    }
}
