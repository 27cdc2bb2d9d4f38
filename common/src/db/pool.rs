// SQLite connection pool implementation

use crate::config::DatabaseConfig;
use crate::errors::DatabaseError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

/// Idempotent schema applied on every start
const SCHEMA: &str = include_str!("schema.sql");

/// Database connection pool wrapper
/// Provides a managed connection pool to SQLite with health checking
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: SqlitePool,
}

impl DbPool {
    /// Open (creating if missing) the database file and bootstrap the schema
    ///
    /// # Errors
    /// Returns `DatabaseError::ConnectionFailed` if unable to open the database
    /// and `DatabaseError::MigrationFailed` if the schema cannot be applied
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        info!(url = %config.url, "Initializing database connection pool");

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        // SQLite creates the file but not its directory
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DatabaseError::ConnectionFailed(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create database pool");
                DatabaseError::ConnectionFailed(e.to_string())
            })?;

        let db = Self { pool };
        db.bootstrap().await?;

        info!(
            max_connections = config.max_connections,
            "Database connection pool initialized successfully"
        );

        Ok(db)
    }

    /// Private in-memory database, used by tests
    ///
    /// A single connection that never expires keeps the database alive for
    /// the lifetime of the pool.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { pool };
        db.bootstrap().await?;
        Ok(db)
    }

    /// Create missing tables and indexes
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<(), DatabaseError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Schema bootstrap failed");
                DatabaseError::MigrationFailed(e.to_string())
            })?;

        tracing::debug!("Database schema is up to date");
        Ok(())
    }

    /// Get a reference to the underlying pool
    ///
    /// This is used by repositories to execute queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Perform a health check on the database connection
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Database health check failed");
                DatabaseError::HealthCheckFailed(e.to_string())
            })?;

        tracing::debug!("Database health check passed");
        Ok(())
    }

    /// Number of user tables in the database
    #[instrument(skip(self))]
    pub async fn table_count(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Get the current number of connections in the pool
    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    /// Close the connection pool gracefully
    #[instrument(skip(self))]
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_pool_bootstraps_schema() {
        let db = DbPool::in_memory().await.unwrap();
        assert!(db.health_check().await.is_ok());
        assert_eq!(db.table_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let db = DbPool::in_memory().await.unwrap();
        assert!(db.bootstrap().await.is_ok());
        assert_eq!(db.table_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_file_pool_creates_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("planning.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 2,
            connect_timeout_seconds: 5,
            seed_sample_agents: false,
        };

        let db = DbPool::new(&config).await.unwrap();
        assert!(path.exists());
        db.close().await;
    }
}
