//! `SQLite`-backed [`SeenStore`].

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::db::{self, Database};
use super::seen_repo::SeenRepo;
use super::{SeenStore, StoreConnector};
use crate::config::StoreConfig;
use crate::models::{IdentifiedRecord, SeenEntry};
use crate::{BoxFuture, Result};

/// Connects to the database named by a [`StoreConfig`].
#[derive(Debug, Clone)]
pub struct SqliteStoreConnector {
    config: StoreConfig,
}

impl SqliteStoreConnector {
    /// Create a connector for `config`.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl StoreConnector for SqliteStoreConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn SeenStore>>> {
        Box::pin(async move {
            let pool = db::connect(&self.config.endpoint, &self.config.database).await?;
            debug!(
                database = %self.config.database,
                collection = %self.config.collection,
                "seen store connected"
            );
            let store: Box<dyn SeenStore> =
                Box::new(SqliteSeenStore::new(Arc::new(pool), &self.config.collection));
            Ok(store)
        })
    }
}

/// Seen store over an open `SQLite` pool.
pub struct SqliteSeenStore {
    db: Arc<Database>,
    repo: SeenRepo,
}

impl SqliteSeenStore {
    /// Wrap an open pool, scoped to `collection`.
    #[must_use]
    pub fn new(db: Arc<Database>, collection: &str) -> Self {
        let repo = SeenRepo::new(Arc::clone(&db), collection);
        Self { db, repo }
    }
}

impl SeenStore for SqliteSeenStore {
    fn load_seen_ids(&self) -> BoxFuture<'_, Result<HashSet<String>>> {
        Box::pin(async move {
            let ids = self.repo.list_ids().await?;
            debug!(seen = ids.len(), "seen identifiers loaded");
            Ok(ids)
        })
    }

    fn persist<'a>(&'a self, records: &'a [IdentifiedRecord]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let entries: Vec<SeenEntry> = records
                .iter()
                .filter(|record| record.has_id())
                .map(SeenEntry::from_record)
                .collect();

            let skipped = records.len() - entries.len();
            if skipped > 0 {
                debug!(skipped, "records without identifier not persisted");
            }
            if entries.is_empty() {
                return Ok(());
            }

            let inserted = self.repo.insert_many(&entries).await?;
            info!(inserted, "seen entries persisted");
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.db.close().await;
        })
    }
}
