//! Snapshot listings: one-shot, subscribed, and every early exit.

use std::sync::Arc;
use std::time::Duration;

use netcfg_admin::admin::{ListSnapshots, SnapshotQuery};
use netcfg_admin::model::{DeviceSnapshot, NetworkSnapshot, WatchEvent};
use netcfg_admin::store::StoreError;
use netcfg_admin::AdminError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::support::{change_created, snapshot_created, MockStore};

async fn list(
    store: &Arc<MockStore>,
    request: ListSnapshots,
) -> (Result<(), AdminError>, Vec<String>) {
    let query = SnapshotQuery::new(store.clone());
    let (tx, mut rx) = mpsc::channel::<DeviceSnapshot>(16);
    let result = query
        .list_snapshots(&request, &tx, &CancellationToken::new())
        .await;
    drop(tx);

    let mut ids = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        ids.push(snapshot.id.to_string());
    }
    (result, ids)
}

#[tokio::test]
async fn lists_matching_snapshots_in_store_order() {
    let store = Arc::new(MockStore::new().with_snapshots(&["d2:1", "x1:1", "d1:1"]));

    let (result, ids) = list(&store, ListSnapshots::matching("d*")).await;

    assert!(result.is_ok());
    assert_eq!(ids, vec!["d2:1", "d1:1"]);
    assert_eq!(store.opens(), 1);
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn empty_pattern_lists_everything() {
    let store = Arc::new(MockStore::new().with_snapshots(&["a:1", "b:1", "c:1"]));

    let (result, ids) = list(&store, ListSnapshots::all()).await;

    assert!(result.is_ok());
    assert_eq!(ids, vec!["a:1", "b:1", "c:1"]);
}

#[tokio::test]
async fn literal_pattern_is_a_prefix_unless_exact() {
    let store = Arc::new(MockStore::new().with_snapshots(&["d1:1", "d10:1", "d2:1"]));

    let (_, prefixed) = list(&store, ListSnapshots::matching("d1")).await;
    assert_eq!(prefixed, vec!["d1:1", "d10:1"]);

    let (_, exact) = list(&store, ListSnapshots::matching("d1:1").exact()).await;
    assert_eq!(exact, vec!["d1:1"]);

    assert_eq!(store.closes(), 2);
}

#[tokio::test]
async fn empty_store_ends_immediately() {
    let store = Arc::new(MockStore::new());

    let (result, ids) = list(&store, ListSnapshots::all()).await;

    assert!(result.is_ok());
    assert!(ids.is_empty());
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn malformed_pattern_fails_before_opening_the_store() {
    let store = Arc::new(MockStore::new().with_snapshots(&["d1:1"]));

    let (result, ids) = list(&store, ListSnapshots::matching("d[1]")).await;

    assert!(matches!(result, Err(AdminError::InvalidArgument(_))));
    assert!(ids.is_empty());
    assert_eq!(store.opens(), 0);
}

#[tokio::test]
async fn open_failure_is_returned_without_streaming() {
    let store = Arc::new(
        MockStore::new()
            .with_snapshots(&["d1:1"])
            .failing_open(StoreError::Unavailable("store offline".into())),
    );

    let (result, ids) = list(&store, ListSnapshots::all()).await;
    assert_eq!(
        result,
        Err(AdminError::Store(StoreError::Unavailable("store offline".into())))
    );
    assert!(ids.is_empty());

    let (result, _) = list(&store, ListSnapshots::all().subscribe()).await;
    assert!(matches!(result, Err(AdminError::Store(_))));
    assert_eq!(store.opens(), 0);
    assert_eq!(store.closes(), 0);
}

#[tokio::test]
async fn subscription_forwards_only_matching_snapshot_events() {
    let script: Vec<WatchEvent> = vec![
        snapshot_created("d1:1"),
        change_created("change-1"),
        snapshot_created("x1:1"),
        WatchEvent::created(NetworkSnapshot::default().into()),
        snapshot_created("d2:1"),
    ];
    let store = Arc::new(MockStore::new().with_script(script));
    let query = SnapshotQuery::new(store.clone());
    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            query
                .list_snapshots(&ListSnapshots::matching("d*").subscribe(), &tx, &cancel)
                .await
        }
    });

    assert_eq!(rx.recv().await.unwrap().id.as_str(), "d1:1");
    assert_eq!(rx.recv().await.unwrap().id.as_str(), "d2:1");
    assert_eq!(store.closes(), 0);

    cancel.cancel();
    assert!(task.await.unwrap().is_ok());
    assert!(rx.recv().await.is_none());
    assert_eq!(store.opens(), 1);
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn subscription_ends_when_the_store_closes_the_watch() {
    let store = Arc::new(
        MockStore::new()
            .with_script(vec![snapshot_created("d1:1")])
            .ends_after_script(),
    );

    let (result, ids) = list(&store, ListSnapshots::all().subscribe()).await;

    assert!(result.is_ok());
    assert_eq!(ids, vec!["d1:1"]);
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn caller_going_away_releases_the_subscription() {
    let store = Arc::new(MockStore::new());
    let query = SnapshotQuery::new(store.clone());
    let (tx, rx) = mpsc::channel::<DeviceSnapshot>(16);

    let task = tokio::spawn(async move {
        query
            .list_snapshots(&ListSnapshots::all().subscribe(), &tx, &CancellationToken::new())
            .await
    });
    drop(rx);

    assert!(task.await.unwrap().is_ok());
    assert_eq!(store.opens(), 1);
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn cancelled_listing_sends_nothing() {
    let store = Arc::new(MockStore::new().with_snapshots(&["d1:1", "d2:1"]));
    let query = SnapshotQuery::new(store.clone());
    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = query.list_snapshots(&ListSnapshots::all(), &tx, &cancel).await;
    drop(tx);

    assert!(result.is_ok());
    assert!(rx.recv().await.is_none());
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn cancel_interrupts_a_send_blocked_on_a_stalled_caller() {
    let store = Arc::new(MockStore::new().with_snapshots(&["d1:1", "d2:1", "d3:1"]));
    let query = SnapshotQuery::new(store.clone());
    // Capacity one and never drained: the second send waits forever.
    let (tx, _rx) = mpsc::channel::<DeviceSnapshot>(1);
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move { query.list_snapshots(&ListSnapshots::all(), &tx, &cancel).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!task.is_finished());

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("listing returns after cancellation")
        .unwrap();

    assert!(result.is_ok());
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn subscription_cancelled_after_k_of_n_events_stops_forwarding() {
    let script: Vec<WatchEvent> = (1..=6)
        .map(|n| snapshot_created(&format!("d{n}:1")))
        .collect();
    let store = Arc::new(MockStore::new().with_script(script));
    let query = SnapshotQuery::new(store.clone());
    let (tx, mut rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            query
                .list_snapshots(&ListSnapshots::all().subscribe(), &tx, &cancel)
                .await
        }
    });

    assert_eq!(rx.recv().await.unwrap().id.as_str(), "d1:1");
    assert_eq!(rx.recv().await.unwrap().id.as_str(), "d2:1");
    cancel.cancel();

    assert!(task.await.unwrap().is_ok());
    let mut trailing = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        trailing.push(snapshot.id.to_string());
    }
    // Only the item already buffered or in flight may follow the cancel.
    assert!(trailing.len() <= 1, "forwarded after cancel: {trailing:?}");
    if let Some(id) = trailing.first() {
        assert_eq!(id, "d3:1");
    }
    assert_eq!(store.opens(), 1);
    assert_eq!(store.closes(), 1);
}

#[test]
fn opening_reports_store_failure_before_any_sink_exists() {
    let store = Arc::new(
        MockStore::new().failing_open(StoreError::Unavailable("store offline".into())),
    );
    let query = SnapshotQuery::new(store.clone());

    let result = query.open(&ListSnapshots::all().subscribe());

    assert!(matches!(
        result,
        Err(AdminError::Store(StoreError::Unavailable(_)))
    ));
}

#[test]
fn unrun_listing_releases_on_drop() {
    let store = Arc::new(MockStore::new());
    let query = SnapshotQuery::new(store.clone());

    let listing = query.open(&ListSnapshots::all().subscribe()).unwrap();
    assert_eq!(store.closes(), 0);
    drop(listing);

    assert_eq!(store.opens(), 1);
    assert_eq!(store.closes(), 1);
}
