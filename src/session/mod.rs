//! 会话管理模块
//!
//! 令牌到用户身份的内存映射，按最后访问时间过期，支持主动注销与定时清理

pub mod clock;
pub mod store;
pub mod sweeper;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{SessionRecord, SessionStatus, SessionStore};
pub use sweeper::SessionSweeper;
pub use token::{TOKEN_LEN, generate_session_token};
