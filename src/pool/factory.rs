//! 连接工厂选择

use std::sync::Arc;

use super::types::ConnectionFactory;
use crate::error::TakeawayResult;
use crate::types::{DatabaseConfig, DatabaseType};

/// 根据数据库配置创建连接工厂
///
/// 对应的数据库特性未启用时返回配置错误
#[allow(unreachable_patterns)]
pub fn create_connection_factory(config: &DatabaseConfig) -> TakeawayResult<Arc<dyn ConnectionFactory>> {
    config.validate()?;

    match config.db_type {
        #[cfg(feature = "sqlite-support")]
        DatabaseType::SQLite => Ok(Arc::new(super::SqlxConnectionFactory::new(config)?)),
        #[cfg(feature = "postgres-support")]
        DatabaseType::PostgreSQL => Ok(Arc::new(super::SqlxConnectionFactory::new(config)?)),
        #[cfg(feature = "mysql-support")]
        DatabaseType::MySQL => Ok(Arc::new(super::SqlxConnectionFactory::new(config)?)),
        _ => Err(crate::quick_error!(
            config,
            format!(
                "不支持的数据库类型 {}（可能需要启用相应的feature）",
                config.db_type.as_str()
            )
        )),
    }
}
