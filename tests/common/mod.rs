//! 集成测试共用的模拟连接与工厂

#![allow(dead_code)]

use parking_lot::Mutex;
use rat_takeaway::{ConnectionFactory, DatabaseConnection, Row, Rows, TakeawayResult};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// 可以人为制造失效与故障的模拟连接
pub struct MockConnection {
    alive: Arc<AtomicBool>,
    outage: Arc<AtomicBool>,
    reconnects: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    ping_delay_ms: Arc<AtomicU64>,
}

/// 以此开头的语句在存活的连接上也会失败
pub const BAD_STATEMENT_PREFIX: &str = "SELEC ";

impl DatabaseConnection for MockConnection {
    fn execute(&mut self, statement: &str) -> TakeawayResult<Rows> {
        if !self.alive.load(Ordering::SeqCst) || self.outage.load(Ordering::SeqCst) {
            return Err(rat_takeaway::quick_error!(query, "连接已断开"));
        }
        if statement.starts_with(BAD_STATEMENT_PREFIX) {
            return Err(rat_takeaway::quick_error!(
                query,
                format!("语法错误: {}", statement)
            ));
        }
        let mut row = Row::new();
        row.insert("statement".to_string(), Value::String(statement.to_string()));
        row.insert("ok".to_string(), Value::from(1));
        Ok(vec![row])
    }

    fn is_alive(&mut self) -> bool {
        let delay = self.ping_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        self.alive.load(Ordering::SeqCst) && !self.outage.load(Ordering::SeqCst)
    }

    fn reconnect(&mut self) -> TakeawayResult<()> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(rat_takeaway::quick_error!(connection, "数据库不可达"));
        }
        self.alive.store(true, Ordering::SeqCst);
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// 统计调用次数的模拟工厂
#[derive(Default)]
pub struct MockFactory {
    connects: AtomicUsize,
    fail_connect: AtomicBool,
    outage: Arc<AtomicBool>,
    reconnects: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    ping_delay_ms: Arc<AtomicU64>,
    connect_delay_ms: AtomicU64,
    connections: Mutex<Vec<Arc<AtomicBool>>>,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn reconnects(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// 让已创建的连接全部失效（可重连恢复）
    pub fn kill_all(&self) {
        for alive in self.connections.lock().iter() {
            alive.store(false, Ordering::SeqCst);
        }
    }

    /// 模拟数据库整体不可达：探活与重连都失败
    pub fn set_outage(&self, outage: bool) {
        self.outage.store(outage, Ordering::SeqCst);
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// 每次探活前的人为延迟
    pub fn set_ping_delay(&self, delay: Duration) {
        self.ping_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// 每次建立连接前的人为延迟
    pub fn set_connect_delay(&self, delay: Duration) {
        self.connect_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

impl ConnectionFactory for MockFactory {
    fn connect(&self) -> TakeawayResult<Box<dyn DatabaseConnection>> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(rat_takeaway::quick_error!(connection, "工厂拒绝创建连接"));
        }
        let delay = self.connect_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);

        let alive = Arc::new(AtomicBool::new(true));
        self.connections.lock().push(alive.clone());
        Ok(Box::new(MockConnection {
            alive,
            outage: self.outage.clone(),
            reconnects: self.reconnects.clone(),
            closed: self.closed.clone(),
            ping_delay_ms: self.ping_delay_ms.clone(),
        }))
    }

    fn describe(&self) -> String {
        "mock://takeaway".to_string()
    }
}
