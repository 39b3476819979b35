//! # 连接池配置构建器模块
//!
//! 未设置的项沿用 `PoolConfig::default()`，`build` 时统一校验

use crate::error::TakeawayResult;
use crate::types::{ExhaustionPolicy, PoolConfig};
use rat_logger::info;

/// 连接池配置构建器
#[derive(Debug)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfig {
    /// 创建连接池配置构建器
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }
}

impl PoolConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    /// 设置初始连接数
    ///
    /// # 参数
    ///
    /// * `size` - 启动时预先创建的连接数
    pub fn initial_size(mut self, size: usize) -> Self {
        self.config.initial_size = size;
        self
    }

    /// 设置连接总数上限
    ///
    /// # 参数
    ///
    /// * `max_size` - 空闲与借出连接的总数上限
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.config.max_size = Some(max_size);
        self
    }

    /// 设置满载策略
    ///
    /// # 参数
    ///
    /// * `policy` - 达到上限时的处理策略
    pub fn exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.config.exhaustion_policy = policy;
        self
    }

    /// 设置借出前是否检测连接
    pub fn validate_on_acquire(mut self, validate: bool) -> Self {
        self.config.validate_on_acquire = validate;
        self
    }

    /// 设置最大重试次数
    ///
    /// # 参数
    ///
    /// * `retries` - 最大重试次数
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// 设置重试间隔（毫秒）
    ///
    /// # 参数
    ///
    /// * `interval` - 重试间隔（毫秒）
    pub fn retry_interval_ms(mut self, interval: u64) -> Self {
        self.config.retry_interval_ms = interval;
        self
    }

    /// 设置保活检测间隔（秒），0 表示关闭
    ///
    /// # 参数
    ///
    /// * `interval` - 保活检测间隔（秒）
    pub fn keepalive_interval_sec(mut self, interval: u64) -> Self {
        self.config.keepalive_interval_sec = interval;
        self
    }

    /// 构建连接池配置
    ///
    /// # 错误
    ///
    /// 上限为零、小于初始连接数，或策略需要上限却未设置时返回错误
    pub fn build(self) -> TakeawayResult<PoolConfig> {
        let config = self.config;

        match config.max_size {
            Some(0) => {
                return Err(crate::quick_error!(config, "连接池上限不能为零"));
            }
            Some(max_size) if config.initial_size > max_size => {
                return Err(crate::quick_error!(config, "初始连接数不能大于连接池上限"));
            }
            None if config.exhaustion_policy != ExhaustionPolicy::Grow => {
                return Err(crate::quick_error!(config, "拒绝或阻塞策略必须设置连接池上限"));
            }
            _ => {}
        }

        info!(
            "创建连接池配置: 初始连接数={}, 上限={:?}, 策略={:?}",
            config.initial_size, config.max_size, config.exhaustion_policy
        );
        Ok(config)
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_policy_requires_max_size() {
        let result = PoolConfig::builder()
            .exhaustion_policy(ExhaustionPolicy::Reject)
            .build();
        assert!(result.is_err());

        let config = PoolConfig::builder()
            .initial_size(2)
            .max_size(4)
            .exhaustion_policy(ExhaustionPolicy::Block { timeout_ms: 50 })
            .build()
            .unwrap();
        assert_eq!(config.max_size, Some(4));
    }

    #[test]
    fn test_initial_size_above_max_is_rejected() {
        let result = PoolConfig::builder().initial_size(8).max_size(4).build();
        assert!(result.is_err());
    }
}
