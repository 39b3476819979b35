//! 连接池类型定义模块

use std::fmt;
use std::time::Instant;

use crate::error::TakeawayResult;
use crate::types::Rows;

/// 一个数据库会话
///
/// 由驱动实现。连接在借出期间只被一个调用方独占使用，所以方法都取 `&mut self`。
pub trait DatabaseConnection: Send {
    /// 执行一条语句并返回结果行
    fn execute(&mut self, statement: &str) -> TakeawayResult<Rows>;

    /// 轻量探活（通常是 `SELECT 1`）
    fn is_alive(&mut self) -> bool;

    /// 关闭旧会话并重新建立
    fn reconnect(&mut self) -> TakeawayResult<()>;

    /// 主动关闭会话，默认什么都不做
    fn close(&mut self) {}
}

/// 连接工厂，持有目标地址与凭据，按需生产新连接
pub trait ConnectionFactory: Send + Sync {
    fn connect(&self) -> TakeawayResult<Box<dyn DatabaseConnection>>;

    /// 用于日志的目标描述，不应包含密码
    fn describe(&self) -> String {
        "database".to_string()
    }
}

/// 池化连接句柄
///
/// 同一时刻只属于连接池或当前借用者之一。`ConnectionPool::release` 按值接收句柄，
/// 借出与归还因此一一对应。
pub struct ConnectionHandle {
    id: u64,
    connection: Box<dyn DatabaseConnection>,
    created_at: Instant,
    last_used: Instant,
}

impl ConnectionHandle {
    pub(crate) fn new(id: u64, connection: Box<dyn DatabaseConnection>) -> Self {
        let now = Instant::now();
        Self {
            id,
            connection,
            created_at: now,
            last_used: now,
        }
    }

    /// 池内唯一的句柄编号
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_used(&self) -> Instant {
        self.last_used
    }

    /// 执行语句
    ///
    /// 句柄在借出时可能已经失效，错误会在这里第一次暴露，调用方可以选择 `reconnect` 后重试
    pub fn execute(&mut self, statement: &str) -> TakeawayResult<Rows> {
        self.last_used = Instant::now();
        self.connection.execute(statement)
    }

    pub fn is_alive(&mut self) -> bool {
        self.connection.is_alive()
    }

    pub fn reconnect(&mut self) -> TakeawayResult<()> {
        self.last_used = Instant::now();
        self.connection.reconnect()
    }

    /// 执行语句，连接失效导致的失败会重连一次再重试
    ///
    /// 连接仍然存活时的语句错误原样返回，不重连也不重试
    pub fn execute_with_reconnect(&mut self, statement: &str) -> TakeawayResult<Rows> {
        match self.execute(statement) {
            Ok(rows) => Ok(rows),
            Err(e) if e.is_transient() || !self.is_alive() => {
                self.reconnect().map_err(|reconnect_err| {
                    crate::quick_error!(
                        unavailable,
                        format!("执行失败({})后重连失败: {}", e, reconnect_err)
                    )
                })?;
                self.execute(statement)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn close(&mut self) {
        self.connection.close();
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("last_used", &self.last_used)
            .field("connection", &"<DatabaseConnection>")
            .finish()
    }
}
