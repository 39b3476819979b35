//! 可关闭的阻塞任务队列

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

use crate::error::{TakeawayError, TakeawayResult};

/// 延迟执行的工作单元，执行后不保留结果
pub type Task = Box<dyn FnOnce() + Send + 'static>;

struct QueueState {
    tasks: VecDeque<Task>,
    closed: bool,
}

/// 多生产者多消费者的 FIFO 队列
///
/// 所有操作经由同一把锁串行化。`pop` 在队列为空时阻塞，
/// 队列关闭并取空后返回 `None`，空闲的消费者因此能及时醒来退出。
pub struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// 追加到队尾并唤醒一个等待中的消费者
    ///
    /// 只有在队列关闭后才会失败，此时任务被丢弃、不会执行
    pub fn push(&self, task: Task) -> TakeawayResult<()> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(TakeawayError::QueueClosed);
            }
            state.tasks.push_back(task);
        }
        self.available.notify_one();
        Ok(())
    }

    /// 取出队首任务，队列为空时阻塞
    pub fn pop(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// 非阻塞地取出队首任务
    pub fn try_pop(&self) -> Option<Task> {
        self.state.lock().tasks.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// 关闭队列，已排队的任务仍可被取出
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// 关闭队列并丢弃所有尚未开始的任务，返回丢弃数量
    pub fn close_and_discard(&self) -> usize {
        let discarded = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.tasks)
        };
        self.available.notify_all();
        // 在锁外析构，避免任务捕获的资源在持锁期间释放
        let count = discarded.len();
        drop(discarded);
        count
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TaskQueue")
            .field("pending", &state.tasks.len())
            .field("closed", &state.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_pop_preserves_push_order() {
        let queue = TaskQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            queue.push(Box::new(move || order.lock().push(i))).unwrap();
        }
        assert_eq!(queue.len(), 5);

        while let Some(task) = queue.try_pop() {
            task();
        }
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue = Arc::new(TaskQueue::new());
        let ran = Arc::new(AtomicUsize::new(0));

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.pop().map(|task| task()).is_some())
        };

        thread::sleep(Duration::from_millis(50));
        let ran_clone = ran.clone();
        queue
            .push(Box::new(move || {
                ran_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(consumer.join().unwrap());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_wakes_blocked_consumers() {
        let queue = Arc::new(TaskQueue::new());
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || queue.pop().is_none())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        queue.close();

        for consumer in consumers {
            assert!(consumer.join().unwrap());
        }
    }

    #[test]
    fn test_close_keeps_pending_but_rejects_new() {
        let queue = TaskQueue::new();
        queue.push(Box::new(|| {})).unwrap();
        queue.close();

        assert!(matches!(
            queue.push(Box::new(|| {})),
            Err(TakeawayError::QueueClosed)
        ));
        assert!(queue.pop().is_some());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_close_and_discard_drops_pending() {
        let queue = TaskQueue::new();
        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let ran = ran.clone();
            queue
                .push(Box::new(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }

        assert_eq!(queue.close_and_discard(), 4);
        assert!(queue.pop().is_none());
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
