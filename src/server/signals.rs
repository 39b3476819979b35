//! 接收循环与生命周期之间的停止信号

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::handler::HealthStatus;

/// 每次启动新建一份
pub(crate) struct LoopSignals {
    stop_requested: AtomicBool,
    exited: Mutex<bool>,
    exited_cv: Condvar,
}

impl LoopSignals {
    pub(crate) fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            exited: Mutex::new(false),
            exited_cv: Condvar::new(),
        }
    }

    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_exited(&self) {
        *self.exited.lock() = true;
        self.exited_cv.notify_all();
    }

    pub(crate) fn has_exited(&self) -> bool {
        *self.exited.lock()
    }

    /// 等待接收循环确认退出，返回是否在超时前确认
    pub(crate) fn wait_exited(&self, timeout: Duration) -> bool {
        let mut exited = self.exited.lock();
        let _ = self
            .exited_cv
            .wait_while_for(&mut exited, |exited| !*exited, timeout);
        *exited
    }

    pub(crate) fn health(&self) -> HealthStatus {
        if self.stop_requested() || self.has_exited() {
            HealthStatus::ShuttingDown
        } else {
            HealthStatus::Ok
        }
    }
}

/// 接收循环退出时（包括 panic 展开）发出确认
pub(crate) struct ExitGuard<'a>(pub(crate) &'a LoopSignals);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_exited();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wait_exited_times_out() {
        let signals = LoopSignals::new();
        assert!(!signals.wait_exited(Duration::from_millis(10)));
        assert_eq!(signals.health(), HealthStatus::Ok);
    }

    #[test]
    fn test_exit_guard_confirms_on_drop() {
        let signals = Arc::new(LoopSignals::new());
        let worker = signals.clone();
        let handle = thread::spawn(move || {
            let _guard = ExitGuard(&worker);
            thread::sleep(Duration::from_millis(20));
        });

        assert!(signals.wait_exited(Duration::from_secs(5)));
        assert_eq!(signals.health(), HealthStatus::ShuttingDown);
        handle.join().unwrap();
    }
}
