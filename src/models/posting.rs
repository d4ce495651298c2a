//! Posting records as they flow through a single run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::identify;

/// A listing entry as read from one page of the registry.
///
/// Exists only for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawRecord {
    /// Relative or absolute link to the posting's detail view.
    pub href: String,
    /// Flattened text content of the listing entry.
    pub title: String,
}

impl RawRecord {
    /// Construct a raw record.
    #[must_use]
    pub fn new(href: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: title.into(),
        }
    }

    /// Attach the identifier derived from the detail link.
    #[must_use]
    pub fn identify(self) -> IdentifiedRecord {
        IdentifiedRecord {
            id: identify(&self.href),
            href: self.href,
            title: self.title,
        }
    }
}

/// A raw record paired with its deduplication key.
///
/// An empty `id` means the link carried no `id` parameter; such a record
/// never matches the seen set but is still eligible for notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifiedRecord {
    /// Value of the `id` query parameter, empty when absent.
    pub id: String,
    /// Link to the posting's detail view.
    pub href: String,
    /// Flattened text content of the listing entry.
    pub title: String,
}

impl IdentifiedRecord {
    /// Whether the record carries a usable deduplication key.
    #[must_use]
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

/// A persisted marker that a notification was sent for an identifier.
///
/// Written once after a confirmed send and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeenEntry {
    /// Deduplication key.
    pub id: String,
    /// Detail link at the time of notification.
    pub link: String,
    /// When the notification was confirmed.
    pub notified_at: DateTime<Utc>,
}

impl SeenEntry {
    /// Build the entry recorded for a notified posting.
    #[must_use]
    pub fn from_record(record: &IdentifiedRecord) -> Self {
        Self {
            id: record.id.clone(),
            link: record.href.clone(),
            notified_at: Utc::now(),
        }
    }
}
