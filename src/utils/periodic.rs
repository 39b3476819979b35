//! 可停止的周期任务线程

use parking_lot::{Condvar, Mutex};
use rat_logger::{debug, error};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::TakeawayResult;

struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// 在独立线程上按固定间隔执行回调
///
/// `stop` 会立即唤醒等待中的线程并等待其退出，不需要等满一个间隔。
/// 回调中的 panic 会被捕获记录，线程继续运行。
pub struct PeriodicTask {
    name: String,
    signal: Arc<StopSignal>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTask {
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> TakeawayResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let signal = Arc::new(StopSignal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });

        let thread_signal = signal.clone();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut stopped = thread_signal.stopped.lock();
                while !*stopped {
                    let timed_out = thread_signal
                        .wake
                        .wait_for(&mut stopped, interval)
                        .timed_out();
                    if *stopped {
                        break;
                    }
                    if timed_out {
                        drop(stopped);
                        if panic::catch_unwind(AssertUnwindSafe(&mut tick)).is_err() {
                            error!("周期任务 {} 执行时发生 panic", thread_name);
                        }
                        stopped = thread_signal.stopped.lock();
                    }
                }
                debug!("周期任务 {} 退出", thread_name);
            })
            .map_err(|e| crate::quick_error!(server, format!("创建周期任务线程失败: {}", e)))?;

        debug!("周期任务 {} 已启动: 间隔={:?}", name, interval);
        Ok(Self {
            name: name.to_string(),
            signal,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// 停止并等待线程退出，可重复调用
    pub fn stop(&self) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();

        if let Some(handle) = self.handle.lock().take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("周期任务 {} 线程异常退出", self.name);
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}
