//! `SQLite` schema bootstrap logic.
//!
//! Uses `CREATE TABLE IF NOT EXISTS`, so it is safe to re-run on every
//! connection.

use sqlx::SqlitePool;

use crate::Result;

/// Apply the seen-entry table definition to the connected database.
///
/// # Errors
///
/// Returns `AppError::Store` if the DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS seen_entry (
    collection      TEXT NOT NULL,
    id              TEXT NOT NULL CHECK(id <> ''),
    link            TEXT NOT NULL,
    notified_at     TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
