//! # 会话配置构建器模块

use crate::config::core::{MAX_SESSION_TTL_SECS, SessionConfig};
use crate::error::TakeawayResult;
use rat_logger::info;

/// 会话配置构建器
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfig {
    /// 创建会话配置构建器
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }
}

impl SessionConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// 设置会话空闲超时（秒）
    ///
    /// # 参数
    ///
    /// * `ttl_secs` - 最后一次访问之后的存活时间
    pub fn ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.config.ttl_secs = ttl_secs;
        self
    }

    /// 设置定时清理间隔（秒），0 表示不启动
    pub fn sweep_interval_sec(mut self, interval: u64) -> Self {
        self.config.sweep_interval_sec = interval;
        self
    }

    /// 构建会话配置
    pub fn build(self) -> TakeawayResult<SessionConfig> {
        if self.config.ttl_secs == 0 {
            return Err(crate::quick_error!(validation, "ttl_secs", "会话超时时间不能为零"));
        }
        if self.config.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(crate::quick_error!(
                validation,
                "ttl_secs",
                format!("会话超时时间不能超过 {} 秒", MAX_SESSION_TTL_SECS)
            ));
        }
        info!(
            "创建会话配置: 超时={}s, 清理间隔={}s",
            self.config.ttl_secs, self.config.sweep_interval_sec
        );
        Ok(self.config)
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
