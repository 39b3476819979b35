//! 基于 sqlx 的数据库驱动
//!
//! 运行时核心是同步线程模型，这里用工厂持有的 tokio 运行时把 sqlx 的异步调用就地阻塞执行

use rat_logger::{debug, info, warn};
use serde_json::{Number, Value};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Column as _, Connection as _, Row as _};
use std::sync::Arc;
use tokio::runtime::Runtime;

use super::types::{ConnectionFactory, DatabaseConnection};
use crate::error::TakeawayResult;
use crate::types::{DatabaseConfig, Row, Rows};

/// sqlx 连接工厂
pub struct SqlxConnectionFactory {
    url: String,
    target: String,
    runtime: Arc<Runtime>,
}

impl SqlxConnectionFactory {
    pub fn new(config: &DatabaseConfig) -> TakeawayResult<Self> {
        config.validate()?;
        sqlx::any::install_default_drivers();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(format!("takeaway-sqlx-{}", config.alias))
            .enable_all()
            .build()?;

        info!("初始化sqlx驱动: 别名={}, 目标={}", config.alias, config.target());

        Ok(Self {
            url: config.connection_url(),
            target: config.target(),
            runtime: Arc::new(runtime),
        })
    }

    fn open(&self) -> TakeawayResult<AnyConnection> {
        open_connection(&self.runtime, &self.url, &self.target)
    }
}

impl ConnectionFactory for SqlxConnectionFactory {
    fn connect(&self) -> TakeawayResult<Box<dyn DatabaseConnection>> {
        let connection = self.open()?;
        Ok(Box::new(SqlxConnection {
            connection: Some(connection),
            url: self.url.clone(),
            target: self.target.clone(),
            runtime: self.runtime.clone(),
        }))
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}

/// 单个 sqlx 会话
pub struct SqlxConnection {
    connection: Option<AnyConnection>,
    url: String,
    target: String,
    runtime: Arc<Runtime>,
}

impl DatabaseConnection for SqlxConnection {
    fn execute(&mut self, statement: &str) -> TakeawayResult<Rows> {
        debug!("执行SQL: {}", statement);
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| crate::quick_error!(connection, "会话已关闭"))?;

        let rows = self
            .runtime
            .block_on(sqlx::query(statement).fetch_all(&mut *connection))
            .map_err(|e| crate::quick_error!(query, format!("执行SQL失败: {}", e)))?;

        Ok(rows.iter().map(row_to_json).collect())
    }

    fn is_alive(&mut self) -> bool {
        match self.connection.as_mut() {
            Some(connection) => self.runtime.block_on(connection.ping()).is_ok(),
            None => false,
        }
    }

    fn reconnect(&mut self) -> TakeawayResult<()> {
        self.close();
        let connection = open_connection(&self.runtime, &self.url, &self.target)?;
        self.connection = Some(connection);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = self.runtime.block_on(connection.close()) {
                warn!("关闭数据库会话失败: {}", e);
            }
        }
    }
}

impl Drop for SqlxConnection {
    fn drop(&mut self) {
        self.close();
    }
}

fn open_connection(runtime: &Runtime, url: &str, target: &str) -> TakeawayResult<AnyConnection> {
    runtime
        .block_on(AnyConnection::connect(url))
        .map_err(|e| crate::quick_error!(connection, format!("连接 {} 失败: {}", target, e)))
}

/// 按列把结果行转成 JSON，依次尝试整数、浮点、字符串、布尔
fn row_to_json(row: &AnyRow) -> Row {
    let mut json_row = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        json_row.insert(column.name().to_string(), column_value(row, index));
    }
    json_row
}

fn column_value(row: &AnyRow, index: usize) -> Value {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return value.map(Value::Bool).unwrap_or(Value::Null);
    }
    Value::String("UNSUPPORTED_TYPE".to_string())
}

#[cfg(all(test, feature = "sqlite-support"))]
mod tests {
    use super::*;
    use crate::types::{ConnectionConfig, DatabaseType};

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            db_type: DatabaseType::SQLite,
            connection: ConnectionConfig::SQLite {
                path: ":memory:".to_string(),
                create_if_missing: true,
            },
            alias: "test".to_string(),
        }
    }

    #[test]
    fn test_sqlite_execute_returns_json_rows() {
        let factory = SqlxConnectionFactory::new(&memory_config()).unwrap();
        let mut connection = factory.connect().unwrap();

        assert!(connection.is_alive());
        connection
            .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT)")
            .unwrap();
        connection
            .execute("INSERT INTO users (id, username) VALUES (1, 'alice')")
            .unwrap();

        let rows = connection.execute("SELECT id, username FROM users").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], Value::from(1));
        assert_eq!(rows[0]["username"], Value::from("alice"));
    }

    #[test]
    fn test_sqlite_reconnect_after_close() {
        let factory = SqlxConnectionFactory::new(&memory_config()).unwrap();
        let mut connection = factory.connect().unwrap();

        connection.close();
        assert!(!connection.is_alive());
        assert!(connection.execute("SELECT 1").is_err());

        connection.reconnect().unwrap();
        assert!(connection.is_alive());
    }
}
