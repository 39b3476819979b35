use serde::{Deserialize, Serialize};

use crate::error::TakeawayResult;

/// 支持的数据库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    /// SQLite 数据库
    SQLite,
    /// PostgreSQL 数据库
    PostgreSQL,
    /// MySQL 数据库
    MySQL,
}

impl DatabaseType {
    /// 获取数据库类型的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SQLite => "sqlite",
            DatabaseType::PostgreSQL => "postgresql",
            DatabaseType::MySQL => "mysql",
        }
    }

    /// 从字符串解析数据库类型
    pub fn parse(s: &str) -> TakeawayResult<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::SQLite),
            "postgresql" | "postgres" | "pg" => Ok(DatabaseType::PostgreSQL),
            "mysql" => Ok(DatabaseType::MySQL),
            _ => Err(crate::quick_error!(
                config,
                format!("不支持的数据库类型: {}", s)
            )),
        }
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库类型
    pub db_type: DatabaseType,
    /// 连接参数
    pub connection: ConnectionConfig,
    /// 数据库别名，用于日志与连接命名
    pub alias: String,
}

/// 连接参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConnectionConfig {
    /// SQLite 文件路径
    SQLite {
        /// 数据库文件路径，`:memory:` 表示内存库
        path: String,
        /// 文件不存在时是否创建
        create_if_missing: bool,
    },
    /// PostgreSQL 连接配置
    PostgreSQL {
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        /// SSL 模式 (disable, prefer, require ...)
        ssl_mode: Option<String>,
    },
    /// MySQL 连接配置
    MySQL {
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        /// SSL 模式 (DISABLED, PREFERRED, REQUIRED ...)
        ssl_mode: Option<String>,
    },
}

impl DatabaseConfig {
    /// 校验数据库类型与连接参数是否匹配
    pub fn validate(&self) -> TakeawayResult<()> {
        let matched = matches!(
            (&self.db_type, &self.connection),
            (DatabaseType::SQLite, ConnectionConfig::SQLite { .. })
                | (DatabaseType::PostgreSQL, ConnectionConfig::PostgreSQL { .. })
                | (DatabaseType::MySQL, ConnectionConfig::MySQL { .. })
        );
        if !matched {
            return Err(crate::quick_error!(
                config,
                format!("{}连接配置类型不匹配", self.db_type.as_str())
            ));
        }
        if self.alias.is_empty() {
            return Err(crate::quick_error!(validation, "alias", "数据库别名不能为空"));
        }
        Ok(())
    }

    /// 生成驱动可用的连接 URL
    ///
    /// 密码会做 URL 编码以处理特殊字符
    pub fn connection_url(&self) -> String {
        match &self.connection {
            ConnectionConfig::SQLite {
                path,
                create_if_missing,
            } => {
                if path == ":memory:" {
                    "sqlite::memory:".to_string()
                } else if *create_if_missing {
                    format!("sqlite://{}?mode=rwc", path)
                } else {
                    format!("sqlite://{}", path)
                }
            }
            ConnectionConfig::PostgreSQL {
                host,
                port,
                database,
                username,
                password,
                ssl_mode,
            } => {
                let encoded_password = urlencoding::encode(password);
                let mut url = format!(
                    "postgresql://{}:{}@{}:{}/{}",
                    username, encoded_password, host, port, database
                );
                if let Some(mode) = ssl_mode {
                    url.push_str(&format!("?sslmode={}", mode));
                }
                url
            }
            ConnectionConfig::MySQL {
                host,
                port,
                database,
                username,
                password,
                ssl_mode,
            } => {
                let encoded_password = urlencoding::encode(password);
                let mut url = format!(
                    "mysql://{}:{}@{}:{}/{}",
                    username, encoded_password, host, port, database
                );
                if let Some(mode) = ssl_mode {
                    url.push_str(&format!("?ssl-mode={}", mode));
                }
                url
            }
        }
    }

    /// 用于日志输出的目标描述（不含密码）
    pub fn target(&self) -> String {
        match &self.connection {
            ConnectionConfig::SQLite { path, .. } => format!("sqlite:{}", path),
            ConnectionConfig::PostgreSQL {
                host, port, database, ..
            } => format!("postgresql://{}:{}/{}", host, port, database),
            ConnectionConfig::MySQL {
                host, port, database, ..
            } => format!("mysql://{}:{}/{}", host, port, database),
        }
    }
}

/// 连接池满载时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExhaustionPolicy {
    /// 弹性增长：没有空闲连接就新建，永不阻塞、永不拒绝
    Grow,
    /// 达到上限后立即返回 `PoolExhausted`
    Reject,
    /// 达到上限后等待归还，超时返回 `PoolExhausted`
    Block {
        /// 最长等待时间（毫秒）
        timeout_ms: u64,
    },
}

/// 连接池配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// 启动时预先创建的连接数
    pub initial_size: usize,
    /// 连接总数上限（空闲 + 借出），`None` 表示不设上限
    pub max_size: Option<usize>,
    /// 达到上限时的策略；`max_size` 为 `None` 时不生效
    pub exhaustion_policy: ExhaustionPolicy,
    /// 借出空闲连接前是否先 ping 一次
    pub validate_on_acquire: bool,
    /// 失效连接的最大重连次数
    pub max_retries: u32,
    /// 重连间隔（毫秒）
    pub retry_interval_ms: u64,
    /// 空闲连接保活检测间隔（秒），0 表示不启动保活
    pub keepalive_interval_sec: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: 10,
            max_size: None,
            exhaustion_policy: ExhaustionPolicy::Grow,
            validate_on_acquire: true,
            max_retries: 1,
            retry_interval_ms: 100,
            keepalive_interval_sec: 30,
        }
    }
}
