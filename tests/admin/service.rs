//! Authorization and caller handling at the service boundary.

use std::sync::Arc;
use std::time::Duration;

use netcfg_admin::admin::{AdminService, Caller, ListSnapshots, Operation};
use netcfg_admin::model::{ChangeId, DeviceSnapshot, Phase, SnapshotState};
use netcfg_admin::AdminError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::support::{status_event, MockStore};

fn admins_only(caller: &Caller, operation: Operation) -> Result<(), AdminError> {
    if caller.groups().contains(&"admins") {
        Ok(())
    } else {
        Err(AdminError::PermissionDenied(format!(
            "{} requires the admins group",
            operation
        )))
    }
}

fn caller(name: &str, groups: &str) -> Caller {
    let mut caller = Caller::new();
    caller.set("name", name);
    caller.set("groups", groups);
    caller
}

fn service(store: &Arc<MockStore>) -> AdminService {
    AdminService::from_parts(store.clone(), store.clone(), store.clone())
        .with_authorizer(admins_only)
}

#[test]
fn identified_caller_outside_policy_is_refused() {
    let store = Arc::new(MockStore::new());

    let err = service(&store)
        .rollback(&caller("operator", "netops"), &ChangeId::from("change-1"))
        .unwrap_err();

    assert!(matches!(err, AdminError::PermissionDenied(_)));
    assert_eq!(err.status_code(), 7);
    assert!(store.rolled_back().is_empty());
}

#[test]
fn permitted_caller_is_admitted() {
    let store = Arc::new(MockStore::new());

    let result = service(&store).rollback(&caller("root", "netops, admins"), &"change-1".into());

    assert!(result.is_ok());
    assert_eq!(store.rolled_back().len(), 1);
}

#[test]
fn anonymous_caller_skips_authorization() {
    let store = Arc::new(MockStore::new());

    assert!(service(&store)
        .rollback(&Caller::new(), &"change-1".into())
        .is_ok());
}

#[tokio::test]
async fn refused_compaction_creates_nothing() {
    let store = Arc::new(MockStore::new());

    let result = service(&store)
        .compact(&caller("operator", ""), Duration::ZERO, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(AdminError::PermissionDenied(_))));
    assert_eq!(store.opens(), 0);
    assert!(store.created().is_empty());
}

#[tokio::test]
async fn compaction_honours_fail_fast_setting() {
    let store = Arc::new(MockStore::new().with_script(vec![status_event(
        "snapshot-1",
        Phase::Create,
        SnapshotState::Failed,
    )]));

    let result = AdminService::from_parts(store.clone(), store.clone(), store.clone())
        .with_compaction_fail_fast(true)
        .compact(&Caller::new(), Duration::ZERO, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(AdminError::CompactionFailed { .. })));
}

#[tokio::test]
async fn listing_is_not_subject_to_authorization() {
    let store = Arc::new(MockStore::new().with_snapshots(&["d1:1"]));
    let (tx, mut rx) = mpsc::channel::<DeviceSnapshot>(4);

    let result = service(&store)
        .list_snapshots(
            &caller("operator", "netops"),
            &ListSnapshots::all(),
            &tx,
            &CancellationToken::new(),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(rx.recv().await.unwrap().id.as_str(), "d1:1");
}
