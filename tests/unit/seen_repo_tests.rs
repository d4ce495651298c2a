//! `SeenRepo` against an in-memory database.

use std::sync::Arc;

use chrono::{Duration, Utc};

use posting_watch::models::SeenEntry;
use posting_watch::persistence::db;
use posting_watch::persistence::seen_repo::SeenRepo;

fn entry(id: &str, minutes_ago: i64) -> SeenEntry {
    SeenEntry {
        id: id.to_owned(),
        link: format!("dettaglio.php?id={id}"),
        notified_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

#[tokio::test]
async fn insert_and_list_ids() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = SeenRepo::new(database, "notified");

    let inserted = repo
        .insert_many(&[entry("1", 2), entry("2", 1)])
        .await
        .expect("insert");
    assert_eq!(inserted, 2);

    let ids = repo.list_ids().await.expect("ids");
    assert_eq!(ids.len(), 2);
    assert!(ids.contains("1"));
    assert!(ids.contains("2"));
}

#[tokio::test]
async fn list_returns_oldest_first() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = SeenRepo::new(database, "notified");
    repo.insert_many(&[entry("late", 1), entry("early", 30)])
        .await
        .expect("insert");

    let entries = repo.list().await.expect("list");
    assert_eq!(entries[0].id, "early");
    assert_eq!(entries[1].id, "late");
    assert_eq!(entries[1].link, "dettaglio.php?id=late");
}

#[tokio::test]
async fn duplicate_ids_are_ignored() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = SeenRepo::new(database, "notified");

    repo.insert_many(&[entry("1", 5)]).await.expect("first insert");
    let inserted = repo
        .insert_many(&[entry("1", 0), entry("2", 0)])
        .await
        .expect("second insert");

    assert_eq!(inserted, 1);
    assert_eq!(repo.count().await.expect("count"), 2);
}

#[tokio::test]
async fn collections_are_isolated() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let notified = SeenRepo::new(Arc::clone(&database), "notified");
    let archive = SeenRepo::new(database, "archive");

    notified.insert_many(&[entry("1", 0)]).await.expect("insert");

    assert_eq!(notified.count().await.expect("count"), 1);
    assert_eq!(archive.count().await.expect("count"), 0);
    assert!(archive.list_ids().await.expect("ids").is_empty());
}

#[tokio::test]
async fn empty_id_is_rejected_by_schema() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = SeenRepo::new(database, "notified");

    let result = repo.insert_many(&[entry("ok", 0), entry("", 0)]).await;
    assert!(result.is_err());
    // The batch is one transaction.
    assert_eq!(repo.count().await.expect("count"), 0);
}
