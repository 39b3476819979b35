//! 接收循环
//!
//! 非阻塞监听，按固定间隔检查停止信号；每个连接作为任务投递到工作线程池

use rat_logger::{error, info, warn};
use std::io::ErrorKind;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use super::handler::{RequestContext, RequestHandler};
use super::signals::{ExitGuard, LoopSignals};
use crate::queue::WorkerPool;

pub(crate) struct Acceptor {
    pub(crate) listener: TcpListener,
    pub(crate) workers: Arc<WorkerPool>,
    pub(crate) handler: Arc<dyn RequestHandler>,
    pub(crate) context: RequestContext,
    pub(crate) signals: Arc<LoopSignals>,
    pub(crate) accepted: Arc<AtomicU64>,
    pub(crate) poll_interval: Duration,
}

impl Acceptor {
    pub(crate) fn run(self) {
        let _guard = ExitGuard(&self.signals);
        info!("接收循环启动: {:?}", self.listener.local_addr().ok());

        while !self.signals.stop_requested() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nonblocking(false) {
                        warn!("设置连接为阻塞模式失败: peer={}, 错误={}", peer, e);
                        continue;
                    }
                    self.accepted.fetch_add(1, Ordering::Relaxed);
                    crate::debug_log!("接受连接: {}", peer);

                    let handler = self.handler.clone();
                    let context = self.context.clone();
                    let submitted = self
                        .workers
                        .submit_fallible(move || handler.handle(stream, &context));
                    if let Err(e) = submitted {
                        error!("投递连接任务失败，接收循环退出: {}", e);
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(self.poll_interval);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("接受连接失败: {}", e);
                    thread::sleep(self.poll_interval);
                }
            }
        }

        info!("接收循环退出");
    }
}
