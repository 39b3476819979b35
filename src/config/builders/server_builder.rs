//! # 服务配置构建器模块

use crate::config::core::ServerConfig;
use crate::error::TakeawayResult;
use rat_logger::info;

/// 服务配置构建器
///
/// 未设置的项沿用 `ServerConfig::default()`
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfig {
    /// 创建服务配置构建器
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }
}

impl ServerConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// 设置监听地址
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// 设置监听端口，0 表示由系统分配
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// 设置工作线程数
    ///
    /// # 参数
    ///
    /// * `threads` - 工作线程数
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.config.worker_threads = Some(threads);
        self
    }

    /// 设置停机等待时间（毫秒）
    ///
    /// # 参数
    ///
    /// * `timeout_ms` - 等待接收循环退出的最长时间
    pub fn shutdown_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.shutdown_timeout_ms = timeout_ms;
        self
    }

    /// 设置接收循环轮询间隔（毫秒）
    pub fn accept_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.accept_poll_interval_ms = interval_ms;
        self
    }

    /// 设置根路径欢迎文本
    pub fn banner<S: Into<String>>(mut self, banner: S) -> Self {
        self.config.banner = banner.into();
        self
    }

    /// 构建服务配置
    ///
    /// # 错误
    ///
    /// 工作线程数、停机等待时间或轮询间隔为零时返回错误
    pub fn build(self) -> TakeawayResult<ServerConfig> {
        let config = self.config;

        if config.worker_threads == Some(0) {
            return Err(crate::quick_error!(config, "工作线程数不能为零"));
        }
        if config.shutdown_timeout_ms == 0 {
            return Err(crate::quick_error!(config, "停机等待时间不能为零"));
        }
        if config.accept_poll_interval_ms == 0 {
            return Err(crate::quick_error!(config, "接收循环轮询间隔不能为零"));
        }

        info!(
            "创建服务配置: 地址={}:{}, 停机等待={}ms",
            config.host, config.port, config.shutdown_timeout_ms
        );
        Ok(config)
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
