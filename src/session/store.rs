//! 会话存储

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rat_logger::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::token::{generate_session_token, is_well_formed};
use crate::config::SessionConfig;
use crate::error::TakeawayResult;

/// 会话记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
}

/// 会话校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// 会话有效，最后访问时间已刷新
    Valid { user_id: i64 },
    /// 会话已过期并已移除
    Expired,
    /// 令牌不存在
    Missing,
}

impl SessionStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionStatus::Valid { .. })
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            SessionStatus::Valid { user_id } => Some(*user_id),
            _ => None,
        }
    }

    /// `(是否有效, 用户ID)` 形式
    pub fn into_pair(self) -> (bool, Option<i64>) {
        (self.is_valid(), self.user_id())
    }
}

/// 内存会话存储
///
/// 令牌到会话记录的映射，按最后访问时间计算过期。所有操作经由同一把锁串行化，
/// 校验时“读取-判断-刷新”是一个原子步骤。由服务的组装根创建并注入到各处理器。
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> TakeawayResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// 使用指定时间源创建存储
    ///
    /// `ttl_secs` 超出可表示范围时返回配置错误
    pub fn with_clock(config: &SessionConfig, clock: Arc<dyn Clock>) -> TakeawayResult<Self> {
        let ttl = i64::try_from(config.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                crate::quick_error!(
                    config,
                    format!("会话超时时间超出范围: {}s", config.ttl_secs)
                )
            })?;

        Ok(Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            clock,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 创建会话并返回新令牌
    pub fn create_session(&self, user_id: i64, username: &str) -> String {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();

        let mut token = generate_session_token();
        while sessions.contains_key(&token) {
            token = generate_session_token();
        }

        sessions.insert(
            token.clone(),
            SessionRecord {
                token: token.clone(),
                user_id,
                username: username.to_string(),
                created_at: now,
                last_access: now,
            },
        );
        drop(sessions);

        debug!("创建会话: user_id={}, username={}", user_id, username);
        token
    }

    /// 校验令牌
    ///
    /// 过期的记录在这里被移除；有效的记录刷新最后访问时间
    pub fn validate_session(&self, token: &str) -> SessionStatus {
        if !is_well_formed(token) {
            return SessionStatus::Missing;
        }

        let now = self.clock.now();
        let mut sessions = self.sessions.lock();

        let Some(record) = sessions.get_mut(token) else {
            return SessionStatus::Missing;
        };

        if now - record.last_access > self.ttl {
            let user_id = record.user_id;
            sessions.remove(token);
            drop(sessions);
            debug!("会话已过期: user_id={}", user_id);
            return SessionStatus::Expired;
        }

        // 系统时间回拨时不让最后访问时间倒退
        if now > record.last_access {
            record.last_access = now;
        }
        SessionStatus::Valid {
            user_id: record.user_id,
        }
    }

    /// 移除会话，令牌不存在时什么也不做
    pub fn destroy_session(&self, token: &str) -> bool {
        self.sessions.lock().remove(token).is_some()
    }

    /// 移除某个用户的全部会话，返回移除数量
    pub fn destroy_user_sessions(&self, user_id: i64) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, record| record.user_id != user_id);
        before - sessions.len()
    }

    /// 清理所有过期会话，返回清理数量
    pub fn clean_expired_sessions(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, record| now - record.last_access <= self.ttl);
        let removed = before - sessions.len();
        drop(sessions);

        if removed > 0 {
            info!("清理过期会话: {}", removed);
        }
        removed
    }

    /// 当前会话数量（近似的在线用户数）
    pub fn online_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// 读取会话快照，不刷新访问时间
    pub fn get_session(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.lock().get(token).cloned()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.online_count())
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;

    fn store() -> (SessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let config = SessionConfig::default();
        (SessionStore::with_clock(&config, clock.clone()).unwrap(), clock)
    }

    #[test]
    fn test_out_of_range_ttl_is_a_config_error() {
        let clock = Arc::new(ManualClock::starting_now());
        for ttl_secs in [10_000_000_000_000_000, u64::MAX] {
            let config = SessionConfig {
                ttl_secs,
                ..SessionConfig::default()
            };
            assert!(matches!(
                SessionStore::with_clock(&config, clock.clone()),
                Err(crate::error::TakeawayError::ConfigError { .. })
            ));
        }

        let config = SessionConfig {
            ttl_secs: crate::config::MAX_SESSION_TTL_SECS,
            ..SessionConfig::default()
        };
        let store = SessionStore::with_clock(&config, clock).unwrap();
        assert!(store.ttl() > Duration::zero());
    }

    #[test]
    fn test_create_then_validate() {
        let (store, _) = store();
        let token = store.create_session(42, "alice");

        assert_eq!(token.len(), 32);
        assert_eq!(store.validate_session(&token), SessionStatus::Valid { user_id: 42 });
        assert_eq!(store.online_count(), 1);

        let record = store.get_session(&token).unwrap();
        assert_eq!(record.username, "alice");
        assert_eq!(record.created_at, record.last_access);
    }

    #[test]
    fn test_unknown_token_is_missing() {
        let (store, _) = store();
        assert_eq!(store.validate_session("nope"), SessionStatus::Missing);
        assert_eq!(SessionStatus::Missing.into_pair(), (false, None));
    }

    #[test]
    fn test_validate_refreshes_last_access() {
        let (store, clock) = store();
        let token = store.create_session(1, "bob");
        let created = store.get_session(&token).unwrap().last_access;

        clock.advance(Duration::seconds(10));
        assert!(store.validate_session(&token).is_valid());
        let refreshed = store.get_session(&token).unwrap();
        assert_eq!(refreshed.last_access - created, Duration::seconds(10));
        assert_eq!(refreshed.created_at, created);
    }

    #[test]
    fn test_clock_going_backwards_keeps_last_access() {
        let (store, clock) = store();
        let token = store.create_session(1, "bob");
        let created = store.get_session(&token).unwrap().last_access;

        clock.advance(Duration::seconds(-30));
        assert!(store.validate_session(&token).is_valid());
        assert_eq!(store.get_session(&token).unwrap().last_access, created);
    }

    #[test]
    fn test_expired_session_is_evicted_on_validate() {
        let (store, clock) = store();
        let token = store.create_session(7, "carol");

        clock.advance(Duration::seconds(3601));
        assert_eq!(store.validate_session(&token), SessionStatus::Expired);
        assert_eq!(store.online_count(), 0);
        assert_eq!(store.validate_session(&token), SessionStatus::Missing);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (store, _) = store();
        let token = store.create_session(1, "dave");
        assert!(store.destroy_session(&token));
        assert!(!store.destroy_session(&token));
        assert_eq!(store.validate_session(&token), SessionStatus::Missing);
    }

    #[test]
    fn test_destroy_user_sessions() {
        let (store, _) = store();
        store.create_session(1, "erin");
        store.create_session(1, "erin");
        let other = store.create_session(2, "frank");

        assert_eq!(store.destroy_user_sessions(1), 2);
        assert_eq!(store.online_count(), 1);
        assert!(store.validate_session(&other).is_valid());
    }
}
