//! 过期会话定时清理

use std::sync::Arc;
use std::time::Duration;

use super::store::SessionStore;
use crate::error::TakeawayResult;
use crate::utils::PeriodicTask;

/// 后台定时调用 `clean_expired_sessions` 的清理器
pub struct SessionSweeper {
    task: PeriodicTask,
}

impl SessionSweeper {
    pub fn start(store: Arc<SessionStore>, interval: Duration) -> TakeawayResult<Self> {
        let task = PeriodicTask::spawn("takeaway-session-sweeper", interval, move || {
            store.clean_expired_sessions();
        })?;
        Ok(Self { task })
    }

    pub fn stop(&self) {
        self.task.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::session::clock::ManualClock;
    use chrono::Duration as ChronoDuration;
    use std::time::Instant;

    #[test]
    fn test_sweeper_removes_expired_sessions() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(SessionStore::with_clock(
            &SessionConfig::default(),
            clock.clone(),
        )
        .unwrap());
        store.create_session(1, "alice");
        clock.advance(ChronoDuration::seconds(3601));

        let sweeper = SessionSweeper::start(store.clone(), Duration::from_millis(10)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while store.online_count() > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        sweeper.stop();

        assert_eq!(store.online_count(), 0);
    }
}
