//! 服务生命周期
//!
//! 状态机 `Stopped → Starting → Running → Stopping → Stopped`。启动时绑定端口、创建连接池、
//! 启动会话清理与连接保活，再启动接收循环，这些耗时步骤在状态锁之外进行；
//! 停止时在限定时间内等待接收循环确认退出，超时则放弃等待并计数。

use parking_lot::Mutex;
use rat_logger::{debug, info, warn};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::handler::{HealthStatus, RequestContext, RequestHandler};
use super::listener::Acceptor;
use super::signals::LoopSignals;
use crate::config::{AppConfig, ServerConfig, SessionConfig};
use crate::error::{TakeawayError, TakeawayResult};
use crate::pool::{ConnectionFactory, ConnectionPool, PoolStats};
use crate::queue::{WorkerPool, WorkerPoolStats, default_worker_count};
use crate::session::{SessionStore, SessionSweeper};
use crate::types::PoolConfig;
use crate::utils::PeriodicTask;

/// 服务生命周期管理器
pub type ServerLifecycle = Server;

/// 服务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    /// 正在绑定端口与建立连接池
    Starting,
    Running,
    Stopping,
}

/// `stop` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// 接收循环在等待时间内确认退出并已回收
    Graceful,
    /// 等待超时，接收循环线程被放弃
    Detached,
    /// 服务不在运行，什么也没做
    NotRunning,
}

/// 服务统计
#[derive(Debug, Clone)]
pub struct ServerStats {
    pub state: ServerState,
    /// 累计接受的连接数
    pub accepted: u64,
    /// 停机超时被放弃的接收循环线程数
    pub detached_threads: u64,
    pub workers: WorkerPoolStats,
    /// 运行中才有连接池
    pub pool: Option<PoolStats>,
}

struct Lifecycle {
    state: ServerState,
    signals: Option<Arc<LoopSignals>>,
    local_addr: Option<SocketAddr>,
}

/// 一次运行期间持有的资源
struct RunningParts {
    acceptor: JoinHandle<()>,
    pool: Arc<ConnectionPool>,
    keepalive: Option<PeriodicTask>,
    sweeper: Option<SessionSweeper>,
}

impl RunningParts {
    fn release(self, detach: bool) {
        if let Some(keepalive) = &self.keepalive {
            keepalive.stop();
        }
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }

        if detach {
            drop(self.acceptor);
        } else if self.acceptor.join().is_err() {
            warn!("接收循环线程异常退出");
        }

        let closed = self.pool.drain();
        debug!("连接池已清空: 关闭连接数={}", closed);
    }
}

/// 服务
///
/// 组合根：持有工作线程池、会话存储、连接工厂和请求处理器。
/// 工作线程池跨多次启停复用，在 `shutdown` 或析构时停止。
pub struct Server {
    config: ServerConfig,
    pool_config: PoolConfig,
    sweep_interval: Duration,
    factory: Arc<dyn ConnectionFactory>,
    handler: Arc<dyn RequestHandler>,
    sessions: Arc<SessionStore>,
    workers: Arc<WorkerPool>,
    lifecycle: Mutex<Lifecycle>,
    parts: Mutex<Option<RunningParts>>,
    accepted: Arc<AtomicU64>,
    detached_threads: AtomicU64,
}

impl Server {
    /// 创建服务
    ///
    /// # 参数
    ///
    /// * `config` - 服务配置
    /// * `pool_config` - 每次启动时创建连接池所用的配置
    /// * `session_config` - 会话超时与清理间隔
    /// * `factory` - 连接工厂
    /// * `handler` - 请求处理器
    pub fn new(
        config: ServerConfig,
        pool_config: PoolConfig,
        session_config: &SessionConfig,
        factory: Arc<dyn ConnectionFactory>,
        handler: Arc<dyn RequestHandler>,
    ) -> TakeawayResult<Self> {
        let sessions = Arc::new(SessionStore::new(session_config)?);
        let worker_count = config.worker_threads.unwrap_or_else(default_worker_count);
        let workers = Arc::new(WorkerPool::new(worker_count)?);

        info!(
            "创建服务: 地址={}, 工作线程={}, 停机等待={}ms",
            config.host, worker_count, config.shutdown_timeout_ms
        );

        Ok(Self {
            config,
            pool_config,
            sweep_interval: Duration::from_secs(session_config.sweep_interval_sec),
            factory,
            handler,
            sessions,
            workers,
            lifecycle: Mutex::new(Lifecycle {
                state: ServerState::Stopped,
                signals: None,
                local_addr: None,
            }),
            parts: Mutex::new(None),
            accepted: Arc::new(AtomicU64::new(0)),
            detached_threads: AtomicU64::new(0),
        })
    }

    /// 按应用配置创建服务
    pub fn from_app_config(
        config: &AppConfig,
        factory: Arc<dyn ConnectionFactory>,
        handler: Arc<dyn RequestHandler>,
    ) -> TakeawayResult<Self> {
        Self::new(
            config.server.clone(),
            config.pool.clone(),
            &config.session,
            factory,
            handler,
        )
    }

    /// 替换会话存储，例如注入使用手动时钟的存储
    pub fn with_session_store(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// 启动服务
    ///
    /// 端口为 0 时由系统分配，返回实际监听地址。
    /// 不处于 `Stopped` 状态时返回 `AlreadyRunning`；绑定或建立连接池失败时状态回到 `Stopped`。
    /// 启动期间状态为 `Starting`，`is_running` 等查询不会被阻塞。
    pub fn start(&self, port: u16) -> TakeawayResult<SocketAddr> {
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state != ServerState::Stopped {
                return Err(TakeawayError::AlreadyRunning);
            }
            if self.workers.is_shutdown() {
                return Err(crate::quick_error!(server, "工作线程池已停止，服务不能再启动"));
            }
            lifecycle.state = ServerState::Starting;
        }

        let (parts, signals, local_addr) = match self.launch(port) {
            Ok(launched) => launched,
            Err(e) => {
                self.lifecycle.lock().state = ServerState::Stopped;
                warn!("服务启动失败: {}", e);
                return Err(e);
            }
        };

        *self.parts.lock() = Some(parts);
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.state = ServerState::Running;
        lifecycle.signals = Some(signals);
        lifecycle.local_addr = Some(local_addr);
        drop(lifecycle);

        info!("服务已启动: {}", local_addr);
        Ok(local_addr)
    }

    /// 绑定端口、建立连接池并启动后台线程
    fn launch(&self, port: u16) -> TakeawayResult<(RunningParts, Arc<LoopSignals>, SocketAddr)> {
        let listener = TcpListener::bind((self.config.host.as_str(), port))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let pool = Arc::new(ConnectionPool::new(
            self.factory.clone(),
            self.pool_config.clone(),
        )?);

        let keepalive = match self.pool_config.keepalive_interval_sec {
            0 => None,
            secs => {
                let pool = pool.clone();
                Some(PeriodicTask::spawn(
                    "takeaway-pool-keepalive",
                    Duration::from_secs(secs),
                    move || {
                        let report = pool.keepalive();
                        if report.discarded > 0 {
                            warn!("连接保活: {:?}", report);
                        } else {
                            debug!("连接保活: {:?}", report);
                        }
                    },
                )?)
            }
        };

        let sweeper = if self.sweep_interval.is_zero() {
            None
        } else {
            Some(SessionSweeper::start(
                self.sessions.clone(),
                self.sweep_interval,
            )?)
        };

        let signals = Arc::new(LoopSignals::new());
        let acceptor = Acceptor {
            listener,
            workers: self.workers.clone(),
            handler: self.handler.clone(),
            context: RequestContext::new(pool.clone(), self.sessions.clone(), signals.clone()),
            signals: signals.clone(),
            accepted: self.accepted.clone(),
            poll_interval: Duration::from_millis(self.config.accept_poll_interval_ms),
        };

        let handle = match thread::Builder::new()
            .name("takeaway-acceptor".to_string())
            .spawn(move || acceptor.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                if let Some(keepalive) = &keepalive {
                    keepalive.stop();
                }
                if let Some(sweeper) = &sweeper {
                    sweeper.stop();
                }
                pool.drain();
                return Err(crate::quick_error!(
                    server,
                    format!("创建接收循环线程失败: {}", e)
                ));
            }
        };

        let parts = RunningParts {
            acceptor: handle,
            pool,
            keepalive,
            sweeper,
        };
        Ok((parts, signals, local_addr))
    }

    /// 停止服务，可重复调用
    ///
    /// 只有 `Running` 状态会被停止，其余状态返回 `NotRunning`。
    /// 等待接收循环确认退出最多 `shutdown_timeout_ms`，超时则放弃该线程并计数。
    /// 两种情况下都会停止后台任务并清空连接池。
    pub fn stop(&self) -> StopOutcome {
        let signals = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state != ServerState::Running {
                return StopOutcome::NotRunning;
            }
            lifecycle.state = ServerState::Stopping;
            lifecycle.signals.clone()
        };

        info!("正在停止服务");
        let confirmed = match &signals {
            Some(signals) => {
                signals.request_stop();
                signals.wait_exited(Duration::from_millis(self.config.shutdown_timeout_ms))
            }
            None => true,
        };

        let outcome = if confirmed {
            StopOutcome::Graceful
        } else {
            let detached = self.detached_threads.fetch_add(1, Ordering::SeqCst) + 1;
            warn!(
                "接收循环在 {}ms 内未退出，放弃等待: 累计放弃线程数={}",
                self.config.shutdown_timeout_ms, detached
            );
            StopOutcome::Detached
        };

        let parts = self.parts.lock().take();
        if let Some(parts) = parts {
            parts.release(!confirmed);
        }

        let mut lifecycle = self.lifecycle.lock();
        lifecycle.state = ServerState::Stopped;
        lifecycle.signals = None;
        lifecycle.local_addr = None;
        drop(lifecycle);

        info!("服务已停止: {:?}", outcome);
        outcome
    }

    /// 停止服务并停止工作线程池，之后不能再启动
    pub fn shutdown(&self) -> StopOutcome {
        let outcome = self.stop();
        self.workers.shutdown();
        outcome
    }

    /// 是否正在运行
    ///
    /// 接收循环自行退出后返回 false，此时仍需调用 `stop` 回收资源
    pub fn is_running(&self) -> bool {
        let lifecycle = self.lifecycle.lock();
        lifecycle.state == ServerState::Running
            && lifecycle
                .signals
                .as_ref()
                .is_some_and(|signals| !signals.has_exited())
    }

    pub fn state(&self) -> ServerState {
        self.lifecycle.lock().state
    }

    pub fn health(&self) -> HealthStatus {
        let lifecycle = self.lifecycle.lock();
        match (&lifecycle.state, &lifecycle.signals) {
            (ServerState::Running, Some(signals)) => signals.health(),
            _ => HealthStatus::ShuttingDown,
        }
    }

    /// 实际监听地址，未运行时为 `None`
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle.lock().local_addr
    }

    pub fn detached_threads(&self) -> u64 {
        self.detached_threads.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> ServerStats {
        let state = self.state();
        let pool = self.parts.lock().as_ref().map(|parts| parts.pool.stats());
        ServerStats {
            state,
            accepted: self.accepted.load(Ordering::Relaxed),
            detached_threads: self.detached_threads(),
            workers: self.workers.stats(),
            pool,
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("host", &self.config.host)
            .field("state", &self.state())
            .field("local_addr", &self.local_addr())
            .finish()
    }
}
