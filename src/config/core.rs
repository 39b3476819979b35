//! # 配置管理模块 - 核心配置类型
//!
//! 服务、数据库、连接池、会话和日志的配置，支持从 TOML / JSON 文件加载

use crate::error::{TakeawayError, TakeawayResult};
use crate::types::{DatabaseConfig, PoolConfig};
use rat_logger::{LevelFilter, LoggerBuilder, handler::term::TermConfig, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 应用配置
///
/// 对应配置文件的顶层结构，`database` 必须出现，其余分节缺省时取默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 连接池配置
    #[serde(default)]
    pub pool: PoolConfig,
    /// 会话配置
    #[serde(default)]
    pub session: SessionConfig,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 工作线程数，`None` 表示使用硬件并行度
    pub worker_threads: Option<usize>,
    /// 停机时等待接收循环退出的最长时间（毫秒）
    pub shutdown_timeout_ms: u64,
    /// 接收循环检查停止信号的间隔（毫秒）
    pub accept_poll_interval_ms: u64,
    /// 根路径返回的欢迎文本
    pub banner: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9090,
            worker_threads: None,
            shutdown_timeout_ms: 5000,
            accept_poll_interval_ms: 50,
            banner: "TakeAwayPlatform is running!".to_string(),
        }
    }
}

/// 会话超时上限（秒），超过后无法以毫秒精度表示
pub const MAX_SESSION_TTL_SECS: u64 = (i64::MAX / 1000) as u64;

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 会话空闲超时（秒）
    pub ttl_secs: u64,
    /// 定时清理间隔（秒），0 表示不启动定时清理
    pub sweep_interval_sec: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_interval_sec: 300,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 是否输出到控制台
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 错误级别
    Error,
    /// 警告级别
    Warn,
    /// 信息级别
    Info,
    /// 调试级别
    Debug,
    /// 跟踪级别
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl AppConfig {
    /// 从配置文件加载配置
    ///
    /// 扩展名为 `.toml` 时按 TOML 解析，否则按 JSON 解析
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> TakeawayResult<Self> {
        let path = config_path.as_ref();
        let content = std::fs::read_to_string(path).map_err(TakeawayError::IoError)?;

        let config: AppConfig = if is_toml(path) {
            toml::from_str(&content).map_err(|e| {
                crate::quick_error!(serialization, format!("解析TOML配置文件失败: {}", e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                crate::quick_error!(serialization, format!("解析JSON配置文件失败: {}", e))
            })?
        };

        config.validate()?;
        info!("从文件加载配置: {:?}", path);
        Ok(config)
    }

    /// 保存配置到文件
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径
    pub fn save_to_file<P: AsRef<Path>>(&self, config_path: P) -> TakeawayResult<()> {
        let path = config_path.as_ref();
        let content = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| {
                crate::quick_error!(serialization, format!("序列化TOML配置失败: {}", e))
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| {
                crate::quick_error!(serialization, format!("序列化JSON配置失败: {}", e))
            })?
        };

        std::fs::write(path, content).map_err(TakeawayError::IoError)?;
        info!("保存配置到文件: {:?}", path);
        Ok(())
    }

    /// 校验各分节的取值
    pub fn validate(&self) -> TakeawayResult<()> {
        self.database.validate()?;

        if self.server.shutdown_timeout_ms == 0 {
            return Err(crate::quick_error!(config, "停机等待时间不能为零"));
        }
        if self.server.accept_poll_interval_ms == 0 {
            return Err(crate::quick_error!(config, "接收循环轮询间隔不能为零"));
        }
        if self.server.worker_threads == Some(0) {
            return Err(crate::quick_error!(config, "工作线程数不能为零"));
        }
        if self.session.ttl_secs == 0 {
            return Err(crate::quick_error!(config, "会话超时时间不能为零"));
        }
        if self.session.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(crate::quick_error!(
                config,
                format!("会话超时时间不能超过 {} 秒", MAX_SESSION_TTL_SECS)
            ));
        }
        if let Some(max_size) = self.pool.max_size {
            if max_size == 0 || self.pool.initial_size > max_size {
                return Err(crate::quick_error!(config, "连接池上限必须大于零且不小于初始连接数"));
            }
        }
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

/// 按配置初始化终端日志
///
/// 库本身从不初始化日志，由二进制或调用者决定是否调用；`console` 关闭时不安装日志器
pub fn init_logging(config: &LoggingConfig) -> TakeawayResult<()> {
    if !config.console {
        return Ok(());
    }
    LoggerBuilder::new()
        .with_level(config.level.to_level_filter())
        .add_terminal_with_config(TermConfig::default())
        .init()
        .map(|_| ())
        .map_err(|e| crate::quick_error!(config, format!("初始化日志失败: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sqlite_config;

    #[test]
    fn test_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.port, 9090);
        assert_eq!(server.shutdown_timeout_ms, 5000);

        let session = SessionConfig::default();
        assert_eq!(session.ttl_secs, 3600);
        assert_eq!(session.sweep_interval_sec, 300);
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let content = r#"
            [database]
            db_type = "SQLite"
            alias = "default"

            [database.connection.SQLite]
            path = ":memory:"
            create_if_missing = true

            [pool]
            initial_size = 2
        "#;
        let config: AppConfig = toml::from_str(content).unwrap();
        assert_eq!(config.pool.initial_size, 2);
        assert!(config.pool.validate_on_acquire);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = AppConfig::builder()
            .database(sqlite_config("default", ":memory:").unwrap())
            .build()
            .unwrap();
        config.session.ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_ttl() {
        let mut config = AppConfig::builder()
            .database(sqlite_config("default", ":memory:").unwrap())
            .build()
            .unwrap();

        config.session.ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(config.validate().is_ok());

        for ttl_secs in [MAX_SESSION_TTL_SECS + 1, 10_000_000_000_000_000, u64::MAX] {
            config.session.ttl_secs = ttl_secs;
            assert!(matches!(
                config.validate(),
                Err(TakeawayError::ConfigError { .. })
            ));
        }
    }
}
