//! Persistence layer: the seen store used for deduplication.
//!
//! The orchestrator talks to the store only through [`StoreConnector`] and
//! [`SeenStore`]; the `SQLite` implementation lives in [`sqlite_store`].

pub mod db;
pub mod schema;
pub mod seen_repo;
pub mod sqlite_store;

use std::collections::HashSet;

use crate::models::IdentifiedRecord;
use crate::{BoxFuture, Result};

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;

/// An open connection to the set of already-notified identifiers.
pub trait SeenStore: Send + Sync {
    /// Every identifier previously persisted. The full set is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`](crate::AppError::Store) on any connectivity or query failure.
    fn load_seen_ids(&self) -> BoxFuture<'_, Result<HashSet<String>>>;

    /// Append one seen entry per record. Call only after a confirmed send.
    ///
    /// Records without an identifier are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`](crate::AppError::Store) on any connectivity or insert failure.
    fn persist<'a>(&'a self, records: &'a [IdentifiedRecord]) -> BoxFuture<'a, Result<()>>;

    /// Release the connection.
    fn close(&self) -> BoxFuture<'_, ()>;
}

/// Opens a [`SeenStore`] scoped to one run's diff and persist phases.
pub trait StoreConnector: Send + Sync {
    /// Open the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`](crate::AppError::Store) if the store is unreachable.
    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn SeenStore>>>;
}
