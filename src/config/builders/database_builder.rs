//! # 数据库配置构建器模块
//!
//! 提供数据库配置的构建器实现，支持链式调用和严格验证

use crate::error::TakeawayResult;
use crate::types::{ConnectionConfig, DatabaseConfig, DatabaseType};
use rat_logger::info;

/// 数据库配置构建器
///
/// 数据库类型、连接参数和别名都必须显式设置
#[derive(Debug, Default)]
pub struct DatabaseConfigBuilder {
    db_type: Option<DatabaseType>,
    connection: Option<ConnectionConfig>,
    alias: Option<String>,
}

impl DatabaseConfig {
    /// 创建数据库配置构建器
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::new()
    }
}

impl DatabaseConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置数据库类型
    ///
    /// # 参数
    ///
    /// * `db_type` - 数据库类型
    pub fn db_type(mut self, db_type: DatabaseType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    /// 设置连接配置
    ///
    /// # 参数
    ///
    /// * `connection` - 连接配置
    pub fn connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = Some(connection);
        self
    }

    /// 设置数据库别名
    ///
    /// # 参数
    ///
    /// * `alias` - 数据库别名
    pub fn alias<S: Into<String>>(mut self, alias: S) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// 构建数据库配置
    ///
    /// # 错误
    ///
    /// 必需项未设置，或数据库类型与连接参数不匹配时返回错误
    pub fn build(self) -> TakeawayResult<DatabaseConfig> {
        let db_type = self
            .db_type
            .ok_or_else(|| crate::quick_error!(config, "数据库类型必须设置"))?;

        let connection = self
            .connection
            .ok_or_else(|| crate::quick_error!(config, "连接配置必须设置"))?;

        let alias = self
            .alias
            .ok_or_else(|| crate::quick_error!(config, "数据库别名必须设置"))?;

        let config = DatabaseConfig {
            db_type,
            connection,
            alias,
        };
        config.validate()?;

        info!(
            "创建数据库配置: 别名={}, 类型={}",
            config.alias,
            config.db_type.as_str()
        );
        Ok(config)
    }
}
