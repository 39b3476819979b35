//! 任务队列模块
//!
//! 基于生产者/消费者模式的任务执行：可关闭的阻塞 FIFO 队列，
//! 以及从队列中持续取任务执行的固定大小工作线程池

pub mod task_queue;
pub mod worker_pool;

pub use task_queue::{Task, TaskQueue};
pub use worker_pool::{WorkerPool, WorkerPoolStats, default_worker_count};
