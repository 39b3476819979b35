//! 连接池核心模块

use parking_lot::{Condvar, Mutex};
use rat_logger::{debug, info, warn};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::stats::{KeepaliveReport, PoolCounters, PoolStats};
use super::types::{ConnectionFactory, ConnectionHandle};
use crate::error::{TakeawayError, TakeawayResult};
use crate::types::{ExhaustionPolicy, PoolConfig};

struct PoolState {
    /// 空闲句柄，栈顶是最近归还的
    idle: Vec<ConnectionHandle>,
    /// 已借出（或正在为借出而创建/校验）的句柄数
    in_use: usize,
    /// 保活检测期间从空闲栈中取出的句柄数
    checking: usize,
    closed: bool,
}

impl PoolState {
    /// 计入上限的句柄数
    fn occupied(&self) -> usize {
        self.in_use + self.checking
    }
}

/// 数据库连接池
///
/// 默认是弹性池：有空闲连接就复用，没有就通过工厂新建，`acquire` 不阻塞也不因容量拒绝。
/// 配置了 `max_size` 之后可选择拒绝或阻塞等待。
pub struct ConnectionPool {
    factory: Arc<dyn ConnectionFactory>,
    config: PoolConfig,
    state: Mutex<PoolState>,
    released: Condvar,
    next_id: AtomicU64,
    counters: PoolCounters,
}

impl ConnectionPool {
    /// 创建连接池并预先建立 `initial_size` 个连接
    pub fn new(factory: Arc<dyn ConnectionFactory>, config: PoolConfig) -> TakeawayResult<Self> {
        if let Some(max_size) = config.max_size {
            if max_size == 0 {
                return Err(crate::quick_error!(validation, "max_size", "连接池上限不能为零"));
            }
            if config.initial_size > max_size {
                return Err(crate::quick_error!(
                    validation,
                    "initial_size",
                    "初始连接数不能大于连接池上限"
                ));
            }
        }

        let pool = Self {
            factory,
            config,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                in_use: 0,
                checking: 0,
                closed: false,
            }),
            released: Condvar::new(),
            next_id: AtomicU64::new(1),
            counters: PoolCounters::default(),
        };

        let mut initial = Vec::with_capacity(pool.config.initial_size);
        for _ in 0..pool.config.initial_size {
            initial.push(pool.connect_new()?);
        }
        // 先创建的在栈底
        initial.reverse();
        pool.state.lock().idle = initial;

        info!(
            "连接池创建完成: 目标={}, 初始连接数={}, 上限={:?}, 策略={:?}",
            pool.factory.describe(),
            pool.config.initial_size,
            pool.config.max_size,
            pool.config.exhaustion_policy
        );
        Ok(pool)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// 借出一个连接
    ///
    /// 优先复用最近归还的空闲连接，没有空闲连接时新建。
    /// 开启 `validate_on_acquire` 时会先探活，失效连接重连失败返回 `DatabaseUnavailable`。
    pub fn acquire(&self) -> TakeawayResult<ConnectionHandle> {
        match self.reserve()? {
            Some(handle) => self.check_out(handle),
            None => match self.connect_new() {
                Ok(handle) => {
                    debug!("新建连接: id={}", handle.id());
                    Ok(handle)
                }
                Err(e) => {
                    self.free_slot();
                    Err(e)
                }
            },
        }
    }

    /// 借出连接并在离开作用域时自动归还
    pub fn get(&self) -> TakeawayResult<PooledConnection<'_>> {
        let handle = self.acquire()?;
        Ok(PooledConnection {
            pool: self,
            handle: Some(handle),
        })
    }

    /// 归还连接
    ///
    /// 连接池已关闭时直接关闭该连接
    pub fn release(&self, mut handle: ConnectionHandle) {
        let mut state = self.state.lock();
        state.in_use = state.in_use.saturating_sub(1);
        if state.closed {
            drop(state);
            debug!("连接池已关闭，丢弃归还的连接: id={}", handle.id());
            handle.close();
            PoolCounters::add(&self.counters.discarded, 1);
            return;
        }
        state.idle.push(handle);
        drop(state);
        self.released.notify_one();
    }

    /// 清空连接池
    ///
    /// 丢弃所有空闲连接并关闭连接池，之后的 `acquire` 返回 `PoolClosed`。
    /// 借出中的连接不会被主动关闭，归还时再丢弃。
    pub fn drain(&self) -> usize {
        let idle = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.idle)
        };
        self.released.notify_all();

        let count = idle.len();
        for mut handle in idle {
            handle.close();
        }
        PoolCounters::add(&self.counters.discarded, count as u64);
        info!("连接池已清空: 丢弃空闲连接={}", count);
        count
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// 对所有空闲连接做一次保活检测
    ///
    /// 检测在锁外进行。被检测的句柄仍计入 `max_size`，
    /// 期间到来的 `acquire` 按耗尽策略处理，不会越过上限新建连接
    pub fn keepalive(&self) -> KeepaliveReport {
        let idle = {
            let mut state = self.state.lock();
            if state.closed {
                return KeepaliveReport::default();
            }
            let idle = std::mem::take(&mut state.idle);
            state.checking += idle.len();
            idle
        };
        let taken = idle.len();

        let mut report = KeepaliveReport {
            checked: idle.len(),
            ..Default::default()
        };
        let mut healthy = Vec::with_capacity(idle.len());
        for mut handle in idle {
            if handle.is_alive() {
                healthy.push(handle);
                continue;
            }
            match self.revive(&mut handle) {
                Ok(()) => {
                    report.revived += 1;
                    healthy.push(handle);
                }
                Err(e) => {
                    warn!("保活检测丢弃失效连接: id={}, 错误={}", handle.id(), e);
                    handle.close();
                    report.discarded += 1;
                }
            }
        }
        PoolCounters::add(&self.counters.discarded, report.discarded as u64);

        let mut state = self.state.lock();
        state.checking = state.checking.saturating_sub(taken);
        if state.closed {
            drop(state);
            for mut handle in healthy {
                handle.close();
            }
        } else {
            // 检测期间被归还的连接更新，放在栈顶
            let returned = std::mem::replace(&mut state.idle, healthy);
            state.idle.extend(returned);
            drop(state);
        }
        // 丢弃的句柄让出了名额，阻塞中的 acquire 可以新建
        self.released.notify_all();

        if report.revived > 0 || report.discarded > 0 {
            info!(
                "保活检测完成: 检测={}, 恢复={}, 丢弃={}",
                report.checked, report.revived, report.discarded
            );
        }
        report
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            idle: state.idle.len(),
            in_use: state.in_use,
            created: PoolCounters::get(&self.counters.created),
            reused: PoolCounters::get(&self.counters.reused),
            discarded: PoolCounters::get(&self.counters.discarded),
            reconnects: PoolCounters::get(&self.counters.reconnects),
            closed: state.closed,
        }
    }

    /// 占用一个借出名额，返回可复用的空闲连接，`None` 表示需要新建
    fn reserve(&self) -> TakeawayResult<Option<ConnectionHandle>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TakeawayError::PoolClosed);
        }
        if let Some(handle) = state.idle.pop() {
            state.in_use += 1;
            return Ok(Some(handle));
        }

        let max_size = match self.config.max_size {
            Some(max_size) if state.occupied() >= max_size => max_size,
            _ => {
                state.in_use += 1;
                return Ok(None);
            }
        };

        match self.config.exhaustion_policy {
            ExhaustionPolicy::Grow => {
                state.in_use += 1;
                Ok(None)
            }
            ExhaustionPolicy::Reject => Err(TakeawayError::PoolExhausted { max_size }),
            ExhaustionPolicy::Block { timeout_ms } => {
                let deadline = Instant::now() + Duration::from_millis(timeout_ms);
                while !state.closed && state.idle.is_empty() && state.occupied() >= max_size {
                    if self.released.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }

                if state.closed {
                    return Err(TakeawayError::PoolClosed);
                }
                if let Some(handle) = state.idle.pop() {
                    state.in_use += 1;
                    Ok(Some(handle))
                } else if state.occupied() < max_size {
                    state.in_use += 1;
                    Ok(None)
                } else {
                    warn!("等待连接超时: 上限={}, 等待={}ms", max_size, timeout_ms);
                    Err(TakeawayError::PoolExhausted { max_size })
                }
            }
        }
    }

    /// 归还未能交付的借出名额
    fn free_slot(&self) {
        let mut state = self.state.lock();
        state.in_use = state.in_use.saturating_sub(1);
        drop(state);
        self.released.notify_one();
    }

    fn check_out(&self, mut handle: ConnectionHandle) -> TakeawayResult<ConnectionHandle> {
        if self.config.validate_on_acquire && !handle.is_alive() {
            warn!("空闲连接已失效，尝试重连: id={}", handle.id());
            if let Err(e) = self.revive(&mut handle) {
                handle.close();
                PoolCounters::add(&self.counters.discarded, 1);
                self.free_slot();
                return Err(e);
            }
        }
        PoolCounters::add(&self.counters.reused, 1);
        Ok(handle)
    }

    /// 按配置的次数与间隔重连
    fn revive(&self, handle: &mut ConnectionHandle) -> TakeawayResult<()> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match handle.reconnect() {
                Ok(()) => {
                    PoolCounters::add(&self.counters.reconnects, 1);
                    info!("连接重连成功: id={}, 第{}次", handle.id(), attempt);
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "连接重连失败: id={}, 第{}/{}次, 错误={}",
                        handle.id(),
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        std::thread::sleep(Duration::from_millis(self.config.retry_interval_ms));
                    }
                }
            }
        }
        Err(crate::quick_error!(
            unavailable,
            format!(
                "连接 {} 重连{}次均失败: {}",
                handle.id(),
                attempts,
                last_error.map(|e| e.to_string()).unwrap_or_default()
            )
        ))
    }

    fn connect_new(&self) -> TakeawayResult<ConnectionHandle> {
        let connection = self.factory.connect()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        PoolCounters::add(&self.counters.created, 1);
        Ok(ConnectionHandle::new(id, connection))
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("target", &self.factory.describe())
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// 作用域内借出的连接，离开作用域时自动归还
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    handle: Option<ConnectionHandle>,
}

impl PooledConnection<'_> {
    /// 放弃自动归还，取出句柄
    pub fn detach(mut self) -> ConnectionHandle {
        // handle 只在 drop 或这里被取走
        self.handle.take().expect("句柄已被取走")
    }
}

impl Deref for PooledConnection<'_> {
    type Target = ConnectionHandle;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref().expect("句柄已被取走")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.handle.as_mut().expect("句柄已被取走")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.release(handle);
        }
    }
}
