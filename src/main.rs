//! takeaway-server - 外卖平台后端服务
//!
//! 用法: `takeaway-server [配置文件路径]`，默认读取 `config.json`，
//! 文件不存在时使用内置默认配置和本地 SQLite 数据库

use anyhow::Context;
use rat_logger::{error, info, warn};
use rat_takeaway::{
    AppConfig, ProbeHandler, Server, StopOutcome, create_connection_factory, init_logging,
    sqlite_config,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

const DEFAULT_CONFIG_PATH: &str = "config.json";
const RUNNING_CHECK_INTERVAL: Duration = Duration::from_millis(500);

fn load_config(path: &str) -> anyhow::Result<AppConfig> {
    if Path::new(path).exists() {
        return AppConfig::from_file(path).with_context(|| format!("加载配置文件 {} 失败", path));
    }
    let database = sqlite_config("default", "takeaway.db")?;
    Ok(AppConfig::builder().database(database).build()?)
}

async fn shutdown_signal(server: &Server) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装 Ctrl-C 处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("安装 SIGTERM 处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let stopped = async {
        while server.is_running() {
            tokio::time::sleep(RUNNING_CHECK_INTERVAL).await;
        }
        warn!("服务意外停止");
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("收到 Ctrl-C");
        }
        _ = terminate => {
            info!("收到 SIGTERM");
        }
        _ = stopped => {},
    }
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;

    init_logging(&config.logging)?;
    rat_takeaway::init();

    let factory = create_connection_factory(&config.database)?;
    let handler = Arc::new(ProbeHandler::new(config.server.banner.clone()));
    let server = Server::from_app_config(&config, factory, handler)?;

    let addr = server
        .start(config.server.port)
        .with_context(|| format!("在端口 {} 启动服务失败", config.server.port))?;
    info!("TakeAwayPlatform 监听于 {}", addr);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("创建信号处理运行时失败")?;
    runtime.block_on(shutdown_signal(&server));

    match server.shutdown() {
        StopOutcome::Graceful => {
            info!("服务已正常停止");
        }
        StopOutcome::Detached => {
            warn!("服务停止超时，接收循环线程已被放弃");
        }
        StopOutcome::NotRunning => {
            info!("服务此前已停止");
        }
    }
    let stats = server.stats();
    info!(
        "累计接受连接={}, 已执行任务={}, 失败任务={}",
        stats.accepted, stats.workers.executed, stats.workers.failed
    );
    Ok(())
}
