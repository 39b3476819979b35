//! 服务模块
//!
//! 生命周期管理、接收循环、请求分发接口和存活探测处理器

pub mod handler;
pub mod lifecycle;
mod listener;
pub mod probe;
mod signals;

pub use handler::{HealthStatus, RequestContext, RequestHandler};
pub use lifecycle::{Server, ServerLifecycle, ServerState, ServerStats, StopOutcome};
pub use probe::ProbeHandler;
