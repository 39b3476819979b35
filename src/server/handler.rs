//! 请求分发接口
//!
//! 接收循环把每个连接交给 `RequestHandler`，处理器通过 `RequestContext`
//! 拿到连接池、会话存储和健康状态

use std::net::TcpStream;
use std::sync::Arc;

use super::signals::LoopSignals;
use crate::error::TakeawayResult;
use crate::pool::ConnectionPool;
use crate::session::SessionStore;

/// 服务健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// 正常服务
    Ok,
    /// 已请求停机或接收循环已退出
    ShuttingDown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Ok => "OK",
            HealthStatus::ShuttingDown => "SHUTTING_DOWN",
        }
    }
}

/// 处理器可见的共享资源
#[derive(Clone)]
pub struct RequestContext {
    /// 本次运行的连接池
    pub pool: Arc<ConnectionPool>,
    /// 会话存储
    pub sessions: Arc<SessionStore>,
    signals: Arc<LoopSignals>,
}

impl RequestContext {
    pub(crate) fn new(
        pool: Arc<ConnectionPool>,
        sessions: Arc<SessionStore>,
        signals: Arc<LoopSignals>,
    ) -> Self {
        Self {
            pool,
            sessions,
            signals,
        }
    }

    /// 当前运行的健康状态
    pub fn health(&self) -> HealthStatus {
        self.signals.health()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("pool", &self.pool)
            .field("sessions", &self.sessions)
            .field("health", &self.health())
            .finish()
    }
}

/// 连接处理器
///
/// 在工作线程上执行，返回的错误由线程池记录，不影响其他连接
pub trait RequestHandler: Send + Sync {
    fn handle(&self, stream: TcpStream, context: &RequestContext) -> TakeawayResult<()>;
}

impl<F> RequestHandler for F
where
    F: Fn(TcpStream, &RequestContext) -> TakeawayResult<()> + Send + Sync,
{
    fn handle(&self, stream: TcpStream, context: &RequestContext) -> TakeawayResult<()> {
        self(stream, context)
    }
}
