//! Seen-entry repository for `SQLite` persistence.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::models::SeenEntry;
use crate::{AppError, Result};

use super::db::Database;

/// Repository for the identifiers already notified, scoped to one collection.
#[derive(Clone)]
pub struct SeenRepo {
    db: Arc<Database>,
    collection: String,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct SeenRow {
    id: String,
    link: String,
    notified_at: String,
}

impl SeenRow {
    fn into_entry(self) -> Result<SeenEntry> {
        let notified_at = chrono::DateTime::parse_from_rfc3339(&self.notified_at)
            .map_err(|e| AppError::Store(format!("invalid notified_at: {e}")))?
            .with_timezone(&Utc);

        Ok(SeenEntry {
            id: self.id,
            link: self.link,
            notified_at,
        })
    }
}

impl SeenRepo {
    /// Create a repository bound to `collection`.
    #[must_use]
    pub fn new(db: Arc<Database>, collection: impl Into<String>) -> Self {
        Self {
            db,
            collection: collection.into(),
        }
    }

    /// Every identifier recorded in this collection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the query fails.
    pub async fn list_ids(&self) -> Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM seen_entry WHERE collection = ?1")
            .bind(&self.collection)
            .fetch_all(self.db.as_ref())
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Every entry in this collection, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the query fails or a row is corrupt.
    pub async fn list(&self) -> Result<Vec<SeenEntry>> {
        let rows: Vec<SeenRow> = sqlx::query_as(
            "SELECT id, link, notified_at FROM seen_entry
             WHERE collection = ?1
             ORDER BY notified_at ASC, id ASC",
        )
        .bind(&self.collection)
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(SeenRow::into_entry).collect()
    }

    /// Append entries in a single transaction.
    ///
    /// An identifier already present is left untouched. Returns the number
    /// of rows actually inserted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if any insert fails; nothing is written then.
    pub async fn insert_many(&self, entries: &[SeenEntry]) -> Result<u64> {
        let mut tx = self.db.begin().await?;
        let mut inserted = 0;

        for entry in entries {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO seen_entry (collection, id, link, notified_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&self.collection)
            .bind(&entry.id)
            .bind(&entry.link)
            .bind(entry.notified_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Number of entries in this collection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen_entry WHERE collection = ?1")
            .bind(&self.collection)
            .fetch_one(self.db.as_ref())
            .await?;
        Ok(count)
    }
}
