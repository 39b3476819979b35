//! 连接池统计模块

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 连接池统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// 空闲连接数
    pub idle: usize,
    /// 借出中的连接数
    pub in_use: usize,
    /// 通过工厂创建的连接总数
    pub created: u64,
    /// 复用空闲连接的次数
    pub reused: u64,
    /// 被丢弃的连接总数（清空、重连失败、归还到已关闭的池）
    pub discarded: u64,
    /// 成功重连次数
    pub reconnects: u64,
    /// 连接池是否已关闭
    pub closed: bool,
}

impl PoolStats {
    /// 连接总数（空闲 + 借出）
    pub fn total(&self) -> usize {
        self.idle + self.in_use
    }

    /// 计算复用率
    pub fn reuse_rate(&self) -> f64 {
        let total = self.created + self.reused;
        if total == 0 {
            0.0
        } else {
            self.reused as f64 / total as f64
        }
    }
}

/// 一次保活检测的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepaliveReport {
    /// 检测的空闲连接数
    pub checked: usize,
    /// 重连后恢复的连接数
    pub revived: usize,
    /// 无法恢复而被丢弃的连接数
    pub discarded: usize,
}

#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub(crate) created: AtomicU64,
    pub(crate) reused: AtomicU64,
    pub(crate) discarded: AtomicU64,
    pub(crate) reconnects: AtomicU64,
}

impl PoolCounters {
    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
