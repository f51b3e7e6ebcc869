use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::migrator::Migrator;

/// Shared handle to the sea-orm connection pool.
pub type DbPool = DatabaseConnection;

/// Pool tuning knobs, independent of where the values come from.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl DbConfig {
    fn connect_options(&self) -> ConnectOptions {
        let mut opts = ConnectOptions::new(self.url.clone());
        opts.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .acquire_timeout(self.acquire_timeout)
            .sqlx_logging(true);
        opts
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Connects with default pool tuning. Works for sqlite and postgres URLs alike.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, AppError> {
    establish_connection_with_config(&DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    })
    .await
}

/// Connects with explicit pool tuning.
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, AppError> {
    debug!(?config, "Opening database pool");
    let pool = Database::connect(config.connect_options())
        .await
        .map_err(AppError::DatabaseError)?;
    info!(
        max_connections = config.max_connections,
        "Database pool ready"
    );
    Ok(pool)
}

/// Connects using the pool tuning carried in [`AppConfig`].
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, AppError> {
    establish_connection_with_config(&DbConfig::from(cfg)).await
}

/// Applies any pending embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    let started = std::time::Instant::now();
    Migrator::up(pool, None)
        .await
        .map_err(AppError::DatabaseError)?;
    info!(elapsed = ?started.elapsed(), "Migrations up to date");
    Ok(())
}

/// Round-trips a ping, the readiness probe's definition of "healthy".
pub async fn check_connection(pool: &DbPool) -> Result<(), AppError> {
    pool.ping().await.map_err(AppError::DatabaseError)
}

pub async fn close_pool(pool: DbPool) -> Result<(), AppError> {
    info!("Closing database pool");
    pool.close().await.map_err(AppError::DatabaseError)
}
