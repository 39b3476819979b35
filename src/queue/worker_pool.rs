//! 固定大小的工作线程池

use parking_lot::Mutex;
use rat_logger::{debug, error, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use super::task_queue::TaskQueue;
use crate::error::{TakeawayError, TakeawayResult};

/// 工作线程池统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolStats {
    /// 工作线程数量
    pub workers: usize,
    /// 已执行完成的任务数（包含失败的）
    pub executed: u64,
    /// 执行失败（panic 或返回错误）的任务数
    pub failed: u64,
    /// 停机时被丢弃、从未执行的任务数
    pub discarded: u64,
    /// 当前排队中的任务数
    pub pending: usize,
}

#[derive(Default)]
struct Counters {
    executed: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
}

/// 工作线程池
///
/// 每个工作线程循环地从共享队列取任务并执行。任务中的 panic 会在任务边界被捕获，
/// 记录日志后线程继续工作，单个任务的失败不会让工作线程退出。
pub struct WorkerPool {
    queue: Arc<TaskQueue>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
    size: usize,
}

impl WorkerPool {
    /// 按硬件并行度创建线程池
    pub fn with_default_size() -> TakeawayResult<Self> {
        Self::new(default_worker_count())
    }

    /// 创建包含 `size` 个工作线程的线程池
    pub fn new(size: usize) -> TakeawayResult<Self> {
        if size == 0 {
            return Err(crate::quick_error!(validation, "size", "工作线程数量不能为零"));
        }

        let queue = Arc::new(TaskQueue::new());
        let counters = Arc::new(Counters::default());
        let mut workers = Vec::with_capacity(size);

        for index in 0..size {
            let worker_queue = queue.clone();
            let worker_counters = counters.clone();
            let spawned = thread::Builder::new()
                .name(format!("takeaway-worker-{}", index))
                .spawn(move || worker_loop(index, worker_queue, worker_counters));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // 已启动的线程需要收回，避免泄漏
                    queue.close_and_discard();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(crate::quick_error!(
                        server,
                        format!("创建工作线程失败: {}", e)
                    ));
                }
            }
        }

        info!("工作线程池已启动: 线程数={}", size);

        Ok(Self {
            queue,
            workers: Mutex::new(workers),
            counters,
            size,
        })
    }

    /// 提交任务，由某个工作线程稍后执行
    pub fn submit<F>(&self, task: F) -> TakeawayResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(task))
    }

    /// 提交可能失败的任务，返回的错误会在任务边界记录并计入失败数
    pub fn submit_fallible<F>(&self, task: F) -> TakeawayResult<()>
    where
        F: FnOnce() -> TakeawayResult<()> + Send + 'static,
    {
        let counters = self.counters.clone();
        self.submit(move || {
            if let Err(e) = task() {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!("任务执行失败: {}", e);
            }
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_shutdown(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn stats(&self) -> WorkerPoolStats {
        WorkerPoolStats {
            workers: self.size,
            executed: self.counters.executed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
            pending: self.queue.len(),
        }
    }

    /// 停止线程池
    ///
    /// 丢弃尚未开始的任务，关闭队列唤醒空闲线程，然后等待所有线程退出。
    /// 正在执行的任务会运行完毕。重复调用是安全的，返回本次丢弃的任务数。
    pub fn shutdown(&self) -> usize {
        let discarded = self.queue.close_and_discard();
        if discarded > 0 {
            self.counters
                .discarded
                .fetch_add(discarded as u64, Ordering::Relaxed);
            warn!("停机时丢弃未执行的任务: {}", discarded);
        }

        let workers = std::mem::take(&mut *self.workers.lock());
        if workers.is_empty() {
            return discarded;
        }

        let current = thread::current().id();
        for handle in workers {
            if handle.thread().id() == current {
                // 在工作线程内部触发的停机，不能自己等待自己
                continue;
            }
            if handle.join().is_err() {
                error!("工作线程异常退出");
            }
        }

        info!("工作线程池已停止");
        discarded
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("queue", &self.queue)
            .finish()
    }
}

/// 默认工作线程数：硬件并行度，至少为 1
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn worker_loop(index: usize, queue: Arc<TaskQueue>, counters: Arc<Counters>) {
    debug!("工作线程 {} 开始运行", index);

    while let Some(task) = queue.pop() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(task));
        counters.executed.fetch_add(1, Ordering::Relaxed);

        if let Err(payload) = outcome {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(
                "工作线程 {} 捕获任务 panic: {}",
                index,
                panic_message(payload.as_ref())
            );
        }
    }

    debug!("工作线程 {} 退出", index);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(e) = payload.downcast_ref::<TakeawayError>() {
        e.to_string()
    } else {
        "未知的 panic".to_string()
    }
}
