//! Diffing step: scraped postings against the seen set.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::models::{IdentifiedRecord, RawRecord};
use crate::persistence::SeenStore;

/// Result of the diffing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// The seen set was read; these postings have not been notified yet.
    Fresh(Vec<IdentifiedRecord>),
    /// The seen set was unavailable; every scraped posting is to be sent.
    DegradedAll(Vec<IdentifiedRecord>),
}

/// Identify raw records, collapsing repeats of the same identifier.
///
/// The first occurrence wins. Records without an identifier are never
/// collapsed.
#[must_use]
pub fn identify_all(raw: Vec<RawRecord>) -> Vec<IdentifiedRecord> {
    let mut seen_in_run = HashSet::new();
    let mut records = Vec::with_capacity(raw.len());

    for record in raw.into_iter().map(RawRecord::identify) {
        if record.has_id() && !seen_in_run.insert(record.id.clone()) {
            debug!(id = %record.id, "duplicate posting within run collapsed");
            continue;
        }
        records.push(record);
    }
    records
}

/// Postings whose identifier is not in `seen`, in scrape order.
///
/// A posting without an identifier never matches and is always kept.
#[must_use]
pub fn new_postings(records: &[IdentifiedRecord], seen: &HashSet<String>) -> Vec<IdentifiedRecord> {
    records
        .iter()
        .filter(|record| !record.has_id() || !seen.contains(&record.id))
        .cloned()
        .collect()
}

/// Load the seen set and diff `records` against it.
///
/// A load failure degrades to sending every scraped posting.
pub async fn diff_against_store(
    store: &dyn SeenStore,
    records: Vec<IdentifiedRecord>,
) -> DiffOutcome {
    match store.load_seen_ids().await {
        Ok(seen) => DiffOutcome::Fresh(new_postings(&records, &seen)),
        Err(err) => {
            warn!(%err, "failed to load seen set; falling back to notify-all");
            DiffOutcome::DegradedAll(records)
        }
    }
}
