//! 数据库类型定义和配置
//!
//! 定义支持的数据库类型、连接配置、连接池配置和查询结果行

pub mod database_config;
pub mod row;

// 重新导出所有公共类型
pub use database_config::{ConnectionConfig, DatabaseConfig, DatabaseType, ExhaustionPolicy, PoolConfig};
pub use row::{Row, Rows};
