//! `SQLite` seen store through its connector.

use posting_watch::config::StoreConfig;
use posting_watch::models::RawRecord;
use posting_watch::persistence::sqlite_store::SqliteStoreConnector;
use posting_watch::persistence::StoreConnector;

fn store_config(endpoint: &str) -> StoreConfig {
    StoreConfig {
        endpoint: endpoint.to_owned(),
        database: "bandi".into(),
        collection: "notified".into(),
    }
}

#[tokio::test]
async fn persisted_ids_survive_reconnect() {
    let temp = tempfile::tempdir().expect("tempdir");
    let endpoint = temp.path().join("state");
    let connector = SqliteStoreConnector::new(&store_config(&endpoint.to_string_lossy()));

    let store = connector.connect().await.expect("connect");
    assert!(store.load_seen_ids().await.expect("load").is_empty());

    let records = vec![
        RawRecord::new("d?id=1", "Asilo").identify(),
        RawRecord::new("d?id=2", "Nido").identify(),
    ];
    store.persist(&records).await.expect("persist");
    store.close().await;

    assert!(endpoint.join("bandi.db").exists());

    let reopened = connector.connect().await.expect("reconnect");
    let ids = reopened.load_seen_ids().await.expect("load");
    assert_eq!(ids.len(), 2);
    assert!(ids.contains("1") && ids.contains("2"));
    reopened.close().await;
}

#[tokio::test]
async fn keyless_records_are_not_persisted() {
    let connector = SqliteStoreConnector::new(&store_config(":memory:"));
    let store = connector.connect().await.expect("connect");

    let records = vec![
        RawRecord::new("d", "senza id").identify(),
        RawRecord::new("d?id=3", "Infanzia").identify(),
    ];
    store.persist(&records).await.expect("persist");

    let ids = store.load_seen_ids().await.expect("load");
    assert_eq!(ids.len(), 1);
    assert!(ids.contains("3"));
    assert!(!ids.contains(""));
}

#[tokio::test]
async fn persisting_only_keyless_records_is_a_no_op() {
    let connector = SqliteStoreConnector::new(&store_config(":memory:"));
    let store = connector.connect().await.expect("connect");

    store
        .persist(&[RawRecord::new("d", "senza id").identify()])
        .await
        .expect("persist");
    assert!(store.load_seen_ids().await.expect("load").is_empty());
}

#[tokio::test]
async fn unusable_endpoint_is_store_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let blocker = temp.path().join("file");
    std::fs::write(&blocker, b"not a directory").expect("write");

    let connector =
        SqliteStoreConnector::new(&store_config(&blocker.join("nested").to_string_lossy()));
    let err = match connector.connect().await {
        Ok(_) => panic!("connect must fail"),
        Err(err) => err,
    };
    assert!(err.to_string().starts_with("store:"));
}
