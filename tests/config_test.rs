//! 配置文件读写集成测试

use rat_takeaway::{
    AppConfig, ConnectionConfig, DatabaseType, ExhaustionPolicy, LogLevel, LoggingConfigBuilder,
    PoolConfig, ServerConfig, TakeawayError, mysql_config,
};
use tempfile::TempDir;

fn sample_config() -> AppConfig {
    let database = mysql_config("default", "127.0.0.1", 3306, "takeaway", "root", "p@ss")
        .unwrap();
    let pool = PoolConfig::builder()
        .initial_size(4)
        .max_size(16)
        .exhaustion_policy(ExhaustionPolicy::Block { timeout_ms: 250 })
        .build()
        .unwrap();
    let server = ServerConfig::builder().port(8088).worker_threads(8).build().unwrap();
    let logging = LoggingConfigBuilder::new()
        .level(LogLevel::Debug)
        .console(false)
        .build()
        .unwrap();

    AppConfig::builder()
        .server(server)
        .database(database)
        .pool(pool)
        .logging(logging)
        .build()
        .unwrap()
}

fn assert_same(loaded: &AppConfig) {
    assert_eq!(loaded.server.port, 8088);
    assert_eq!(loaded.server.worker_threads, Some(8));
    assert_eq!(loaded.database.db_type, DatabaseType::MySQL);
    assert!(matches!(
        loaded.database.connection,
        ConnectionConfig::MySQL { port: 3306, .. }
    ));
    assert_eq!(loaded.pool.max_size, Some(16));
    assert_eq!(
        loaded.pool.exhaustion_policy,
        ExhaustionPolicy::Block { timeout_ms: 250 }
    );
    assert_eq!(loaded.logging.level, LogLevel::Debug);
    assert!(!loaded.logging.console);
    assert_eq!(loaded.session.ttl_secs, 3600);
}

#[test]
fn test_json_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    sample_config().save_to_file(&path).unwrap();
    let loaded = AppConfig::from_file(&path).unwrap();
    assert_same(&loaded);
}

#[test]
fn test_toml_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("takeaway.toml");

    sample_config().save_to_file(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[server]"));

    let loaded = AppConfig::from_file(&path).unwrap();
    assert_same(&loaded);
}

#[test]
fn test_minimal_json_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "database": {
                "db_type": "SQLite",
                "alias": "default",
                "connection": { "SQLite": { "path": "takeaway.db", "create_if_missing": true } }
            }
        }"#,
    )
    .unwrap();

    let loaded = AppConfig::from_file(&path).unwrap();
    assert_eq!(loaded.server.port, 9090);
    assert_eq!(loaded.server.shutdown_timeout_ms, 5000);
    assert_eq!(loaded.pool.initial_size, 10);
    assert_eq!(loaded.pool.keepalive_interval_sec, 30);
    assert_eq!(loaded.session.sweep_interval_sec, 300);
    assert_eq!(loaded.database.connection_url(), "sqlite://takeaway.db?mode=rwc");
}

#[test]
fn test_config_errors() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        AppConfig::from_file(&missing),
        Err(TakeawayError::IoError(_))
    ));

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "server = [").unwrap();
    assert!(matches!(
        AppConfig::from_file(&broken),
        Err(TakeawayError::SerializationError { .. })
    ));

    let invalid = dir.path().join("invalid.json");
    let mut config = sample_config();
    config.server.shutdown_timeout_ms = 0;
    config.save_to_file(&invalid).unwrap();
    assert!(matches!(
        AppConfig::from_file(&invalid),
        Err(TakeawayError::ConfigError { .. })
    ));
}
