//! Database module for handling SQLite connections and operations
//!
//! This module provides connection pooling, configuration, and health checks
//! for the catalog database.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::env;
use tracing::info;

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `DATABASE_URL`: SQLite connection URL (default: "sqlite://chinook.db")
    /// - `DATABASE_MAX_CONNECTIONS`: Maximum number of connections (default: 5)
    pub fn from_env() -> DatabaseResult<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://chinook.db".to_string());

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        if max_connections == 0 {
            return Err(DatabaseError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
        })
    }

    /// Configuration for a private in-memory database.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// capped at a single connection.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// Initialize a SQLite connection pool
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<SqlitePool>` - SQLite connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let options: SqliteConnectOptions = config
        .database_url
        .parse()
        .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?;

    let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
    if config.database_url.contains(":memory:") {
        // Closing the only connection would drop the database with it.
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options.create_if_missing(true))
        .await
        .map_err(DatabaseError::Connection)?;

    info!(
        "Database pool initialized for {} ({} connections)",
        config.database_url, config.max_connections
    );
    Ok(pool)
}

/// Check database connectivity
///
/// # Arguments
///
/// * `pool` - SQLite connection pool
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if connection is successful
pub async fn health_check(pool: &SqlitePool) -> DatabaseResult<bool> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(true)
}
