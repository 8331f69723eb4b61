#![cfg(feature = "sqlite")]

use std::time::Duration;

use sql_session::pool::{DEFAULT_POOL_NAME, DataSourceRegistry, PoolOptions};
use sql_session::prelude::*;
use sql_session::{named_params, params};
use tempfile::tempdir;

#[tokio::test]
async fn named_pools_hand_out_sessions() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("pooled.db").display());

    let registry = DataSourceRegistry::new();
    let source = registry
        .init("orders", &url, Some("app"), Some("unused"), |opts| {
            opts.max_size = 2;
            opts.busy_timeout_ms = Some(2_000);
            opts.init_sql = Some("PRAGMA foreign_keys = ON;".to_string());
        })
        .await?;
    assert_eq!(source.name(), "orders");
    assert_eq!(source.username(), Some("app"));

    let mut session = source.session(SessionOptions::default()).await?;
    session.execute(&query_of(
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, item TEXT NOT NULL)",
        params![],
    ))?;
    session.update(&named_query_of(
        "INSERT INTO orders (item) VALUES (:item)",
        named_params! { "item" => "widget" },
    ))?;
    session.close()?;

    // a second checkout from the same registry sees the committed row
    let mut again = registry
        .data_source("orders")?
        .session(SessionOptions::strict())
        .await?;
    let item = again.single(&query_of("SELECT item FROM orders", params![]), |row| {
        row.string("item")
    })?;
    assert_eq!(item.as_deref(), Some("widget"));
    let foreign_keys = again.single(&query_of("PRAGMA foreign_keys", params![]), |row| {
        row.boolean(0_usize)
    })?;
    assert_eq!(foreign_keys, Some(true));
    drop(again);

    registry.close("orders")?;
    // closing twice is harmless
    registry.close("orders")?;
    assert!(source.is_closed());
    assert!(matches!(
        source.connection().await,
        Err(SqlSessionError::ConnectionError(_))
    ));
    assert!(matches!(
        registry.data_source("orders"),
        Err(SqlSessionError::DataSourceAbsent(_))
    ));
    Ok(())
}

#[tokio::test]
async fn memory_pools_share_one_database() -> Result<(), Box<dyn std::error::Error>> {
    let registry = DataSourceRegistry::new();
    let source = registry
        .init("scratch", "sqlite::memory:", None, None, |opts| opts.max_size = 3)
        .await?;

    let first = source.connection().await?;
    let second = source.connection().await?;
    let mut writer = Session::new(first, SessionOptions::default())?;
    let mut reader = Session::new(second, SessionOptions::default())?;

    writer.execute(&query_of("CREATE TABLE t (n INTEGER)", params![]))?;
    writer.update(&query_of("INSERT INTO t VALUES (?)", params![5_i64]))?;
    let n = reader.single(&query_of("SELECT n FROM t", params![]), |row| row.i64("n"))?;
    assert_eq!(n, Some(5));

    // transactions work over pooled connections too
    reader.transaction(|tx| {
        tx.update(&query_of("UPDATE t SET n = n + 1", params![]))?;
        Ok::<_, SqlSessionError>(())
    })?;
    let n = writer.single(&query_of("SELECT n FROM t", params![]), |row| row.i64("n"))?;
    assert_eq!(n, Some(6));

    using(writer, |_| Ok::<_, SqlSessionError>(()))?;
    reader.close()?;
    registry.close_all();
    assert!(registry.names().is_empty());
    Ok(())
}

#[tokio::test]
async fn reinitializing_replaces_the_pool() -> Result<(), Box<dyn std::error::Error>> {
    let registry = DataSourceRegistry::new();
    let old = registry
        .init_default("sqlite::memory:", None, None, |_| {})
        .await?;
    let new = registry
        .init_default("sqlite::memory:", None, None, |opts| opts.max_size = 1)
        .await?;

    assert!(old.is_closed());
    assert!(!new.is_closed());
    assert_eq!(registry.default_source()?.name(), DEFAULT_POOL_NAME);
    assert_eq!(registry.names(), vec![DEFAULT_POOL_NAME.to_string()]);
    Ok(())
}

#[tokio::test]
async fn invalid_configuration_is_rejected() {
    let registry = DataSourceRegistry::new();
    let err = registry
        .init("bad", "sqlite::memory:", None, None, |opts| opts.max_size = 0)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::ConfigError(_)));

    let err = registry.init("empty", "sqlite:", None, None, |_| {}).await.unwrap_err();
    assert!(matches!(err, SqlSessionError::ConfigError(_)));

    assert_eq!(
        registry.close("never-opened").unwrap_err().to_string(),
        "DataSource (never-opened) is absent."
    );
}

#[test]
fn pool_options_from_json() -> Result<(), Box<dyn std::error::Error>> {
    let opts: PoolOptions = serde_json::from_str(
        r#"{
            "max_size": 4,
            "min_idle": 1,
            "connection_timeout_ms": 1500,
            "init_sql": "PRAGMA journal_mode = WAL;"
        }"#,
    )?;
    assert_eq!(opts.max_size, 4);
    assert_eq!(opts.connection_timeout(), Duration::from_millis(1_500));
    assert_eq!(opts.statement_cache_capacity, 250);
    assert!(opts.validate().is_ok());
    Ok(())
}
