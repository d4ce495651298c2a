//! Diffing scraped postings against the seen set.

use std::collections::HashSet;

use posting_watch::models::{IdentifiedRecord, RawRecord};
use posting_watch::orchestrator::{identify_all, new_postings};

fn scraped() -> Vec<IdentifiedRecord> {
    identify_all(vec![
        RawRecord::new("https://x/d?id=1", "Asilo nido A"),
        RawRecord::new("https://x/d?id=2", "Asilo nido B"),
        RawRecord::new("https://x/d?id=3", "Scuola infanzia C"),
        RawRecord::new("https://x/d", "Educatrice senza id"),
    ])
}

fn seen(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|id| (*id).to_owned()).collect()
}

#[test]
fn only_unseen_postings_are_new() {
    let new = new_postings(&scraped(), &seen(&["1", "3"]));
    let ids: Vec<&str> = new.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["2", ""]);
}

#[test]
fn no_seen_identifier_survives_the_diff() {
    let seen = seen(&["2", "3", "99"]);
    let new = new_postings(&scraped(), &seen);
    assert!(new.iter().all(|r| !seen.contains(&r.id)));
}

#[test]
fn every_unseen_posting_appears_exactly_once() {
    let records = scraped();
    let seen = seen(&["1"]);
    let new = new_postings(&records, &seen);

    for record in records.iter().filter(|r| !seen.contains(&r.id)) {
        assert_eq!(new.iter().filter(|n| *n == record).count(), 1);
    }
}

#[test]
fn empty_seen_set_keeps_everything_in_order() {
    let records = scraped();
    assert_eq!(new_postings(&records, &HashSet::new()), records);
}

#[test]
fn marking_new_as_seen_leaves_only_keyless() {
    let records = scraped();
    let mut seen = seen(&[]);
    seen.extend(new_postings(&records, &seen).into_iter().filter(|r| r.has_id()).map(|r| r.id));

    let second = new_postings(&records, &seen);
    assert_eq!(second.len(), 1);
    assert!(!second[0].has_id());
}

#[test]
fn identify_all_collapses_repeated_ids() {
    let records = identify_all(vec![
        RawRecord::new("d?id=5", "first"),
        RawRecord::new("other?id=5", "second"),
        RawRecord::new("d?id=6", "third"),
    ]);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "first");
    assert_eq!(records[1].id, "6");
}
