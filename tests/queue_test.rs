//! 任务队列与工作线程池集成测试

use parking_lot::Mutex;
use rat_takeaway::{TakeawayError, TaskQueue, WorkerPool};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + deadline;
    while !done() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    true
}

#[test]
fn test_many_producers_all_tasks_run() {
    let pool = Arc::new(WorkerPool::new(4).unwrap());
    let counter = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    let counter = counter.clone();
                    pool.submit(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert!(wait_until(Duration::from_secs(10), || {
        counter.load(Ordering::SeqCst) == 2000
    }));
    pool.shutdown();
    assert_eq!(pool.stats().executed, 2000);
}

#[test]
fn test_per_producer_order_with_single_worker() {
    let pool = WorkerPool::new(1).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for i in 0..100 {
        let seen = seen.clone();
        pool.submit(move || seen.lock().push(i)).unwrap();
    }
    assert!(wait_until(Duration::from_secs(5), || seen.lock().len() == 100));
    assert_eq!(*seen.lock(), (0..100).collect::<Vec<_>>());
}

#[test]
fn test_shutdown_wakes_idle_workers_promptly() {
    let pool = WorkerPool::new(8).unwrap();
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    assert_eq!(pool.shutdown(), 0);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(pool.submit(|| {}), Err(TakeawayError::QueueClosed)));
}

#[test]
fn test_blocked_consumer_sees_close() {
    let queue = Arc::new(TaskQueue::new());
    let consumer = {
        let queue = queue.clone();
        thread::spawn(move || queue.pop().is_none())
    };

    thread::sleep(Duration::from_millis(20));
    queue.close();
    assert!(consumer.join().unwrap());
}
