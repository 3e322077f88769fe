pub mod transaction;

use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::migrator::Migrator;

pub use transaction::with_transaction;

/// Shared connection pool. Postgres in production, SQLite in tests.
pub type DbPool = DatabaseConnection;

/// Pool tuning, resolved from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    /// Echo every statement at debug level.
    pub log_statements: bool,
}

impl PoolSettings {
    /// A single long-lived connection; required for `sqlite::memory:`,
    /// where every new connection opens an empty database.
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            log_statements: false,
        }
    }
}

impl From<&AppConfig> for PoolSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            log_statements: !cfg.is_production(),
        }
    }
}

pub async fn connect(settings: &PoolSettings) -> Result<DbPool, ServiceError> {
    debug!(
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        "Opening procurement database pool"
    );

    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .connect_timeout(settings.connect_timeout)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .sqlx_logging(settings.log_statements);

    let pool = Database::connect(options).await.map_err(|e| {
        counter!("procurement_db.connection_failures", 1);
        error!(error = %e, "Could not open database pool");
        ServiceError::DatabaseError(e)
    })?;

    gauge!("procurement_db.max_connections", f64::from(settings.max_connections));
    info!("Database pool ready");
    Ok(pool)
}

pub async fn connect_from_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    connect(&PoolSettings::from(cfg)).await
}

/// Brings the schema up to date with the embedded migrator.
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbErr> {
    let started = Instant::now();
    let result = Migrator::up(pool, None).await;

    match &result {
        Ok(()) => info!(elapsed = ?started.elapsed(), "Schema migrations applied"),
        Err(e) => error!(elapsed = ?started.elapsed(), error = %e, "Schema migrations failed"),
    }
    result
}

/// Round-trip to the database; backs `/health`.
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let started = Instant::now();
    pool.ping().await.map_err(|e| {
        counter!("procurement_db.connection_failures", 1);
        ServiceError::DatabaseError(e)
    })?;
    histogram!("procurement_db.ping_duration", started.elapsed());
    Ok(())
}
