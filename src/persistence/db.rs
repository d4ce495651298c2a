//! `SQLite` connection pool for the seen store.

use std::fs;
use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::{AppError, Result};

use super::schema;

/// Alias for the shared `SQLite` pool.
pub type Database = SqlitePool;

/// Endpoint value selecting a throwaway in-memory database.
pub const MEMORY_ENDPOINT: &str = ":memory:";

/// Open `{endpoint}/{database}.db`, creating it if needed, and apply schema.
///
/// An `endpoint` of `:memory:` opens an in-memory database instead.
///
/// # Errors
///
/// Returns `AppError::Store` if the directory, connection, or schema
/// application fails.
pub async fn connect(endpoint: &str, database: &str) -> Result<Database> {
    if endpoint == MEMORY_ENDPOINT {
        return connect_memory().await;
    }

    let dir = Path::new(endpoint);
    fs::create_dir_all(dir)
        .map_err(|err| AppError::Store(format!("failed to create db dir: {err}")))?;

    let options = SqliteConnectOptions::new()
        .filename(dir.join(format!("{database}.db")))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await?;

    schema::bootstrap_schema(&pool).await?;
    Ok(pool)
}

/// Open an in-memory database with the schema applied.
///
/// The pool keeps a single connection alive so every query sees the same
/// database.
///
/// # Errors
///
/// Returns `AppError::Store` if the connection or schema application fails.
pub async fn connect_memory() -> Result<Database> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    schema::bootstrap_schema(&pool).await?;
    Ok(pool)
}
