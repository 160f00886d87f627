//! Scripted store double that counts subscription opens and releases.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use netcfg_admin::model::{
    ChangeId, DeviceSnapshot, NetworkChange, NetworkSnapshot, NetworkSnapshotId, Phase,
    SnapshotState, SnapshotStatus, WatchEvent,
};
use netcfg_admin::store::{
    ChangeStore, DeviceSnapshotStore, NetworkSnapshotStore, StoreError, Subscription,
    WatchOptions,
};
use tokio::sync::mpsc;

/// Store double. Every watch it opens is fed `script` up front and then stays
/// open (until [`MockStore::end_watches`]) unless `ends_after_script` is set.
#[derive(Default)]
pub struct MockStore {
    snapshots: Vec<DeviceSnapshot>,
    script: Vec<WatchEvent>,
    ends_after_script: bool,
    create_id: NetworkSnapshotId,
    fail_open: Option<StoreError>,
    fail_create: Option<StoreError>,
    rollback_error: Option<StoreError>,
    live: Mutex<Vec<mpsc::UnboundedSender<WatchEvent>>>,
    opens: AtomicUsize,
    closes: Arc<AtomicUsize>,
    created: Mutex<Vec<NetworkSnapshot>>,
    rolled_back: Mutex<Vec<ChangeId>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            create_id: "snapshot-1".into(),
            ..Default::default()
        }
    }

    pub fn with_snapshots(mut self, ids: &[&str]) -> Self {
        self.snapshots = ids.iter().map(|id| snapshot(id)).collect();
        self
    }

    pub fn with_script(mut self, script: Vec<WatchEvent>) -> Self {
        self.script = script;
        self
    }

    pub fn ends_after_script(mut self) -> Self {
        self.ends_after_script = true;
        self
    }

    pub fn with_create_id(mut self, id: &str) -> Self {
        self.create_id = id.into();
        self
    }

    pub fn failing_open(mut self, err: StoreError) -> Self {
        self.fail_open = Some(err);
        self
    }

    pub fn failing_create(mut self, err: StoreError) -> Self {
        self.fail_create = Some(err);
        self
    }

    pub fn failing_rollback(mut self, err: StoreError) -> Self {
        self.rollback_error = Some(err);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<NetworkSnapshot> {
        self.created.lock().unwrap().clone()
    }

    pub fn rolled_back(&self) -> Vec<ChangeId> {
        self.rolled_back.lock().unwrap().clone()
    }

    /// Close the store side of every open watch.
    pub fn end_watches(&self) {
        self.live.lock().unwrap().clear();
    }

    fn track<T>(&self, receiver: mpsc::UnboundedReceiver<T>) -> Subscription<T> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let closes = self.closes.clone();
        Subscription::new(receiver, move || {
            closes.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn open_watch(&self) -> Result<Subscription<WatchEvent>, StoreError> {
        if let Some(err) = &self.fail_open {
            return Err(err.clone());
        }
        let (tx, rx) = mpsc::unbounded_channel();
        for event in &self.script {
            tx.send(event.clone()).unwrap();
        }
        if !self.ends_after_script {
            self.live.lock().unwrap().push(tx);
        }
        Ok(self.track(rx))
    }
}

impl DeviceSnapshotStore for MockStore {
    fn load_all(&self) -> Result<Subscription<DeviceSnapshot>, StoreError> {
        if let Some(err) = &self.fail_open {
            return Err(err.clone());
        }
        let (tx, rx) = mpsc::unbounded_channel();
        for snapshot in &self.snapshots {
            tx.send(snapshot.clone()).unwrap();
        }
        Ok(self.track(rx))
    }

    fn watch_all(&self) -> Result<Subscription<WatchEvent>, StoreError> {
        self.open_watch()
    }
}

impl NetworkSnapshotStore for MockStore {
    fn create(&self, mut snapshot: NetworkSnapshot) -> Result<NetworkSnapshot, StoreError> {
        if let Some(err) = &self.fail_create {
            return Err(err.clone());
        }
        snapshot.id = self.create_id.clone();
        self.created.lock().unwrap().push(snapshot.clone());
        Ok(snapshot)
    }

    fn watch(&self, _options: WatchOptions) -> Result<Subscription<WatchEvent>, StoreError> {
        self.open_watch()
    }
}

impl ChangeStore for MockStore {
    fn rollback_target_config(&self, id: &ChangeId) -> Result<(), StoreError> {
        self.rolled_back.lock().unwrap().push(id.clone());
        match &self.rollback_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

pub fn snapshot(id: &str) -> DeviceSnapshot {
    let (device, version) = id.split_once(':').unwrap_or((id, "1.0.0"));
    DeviceSnapshot::new(device, version)
}

pub fn snapshot_created(id: &str) -> WatchEvent {
    WatchEvent::created(snapshot(id).into())
}

pub fn change_created(id: &str) -> WatchEvent {
    WatchEvent::created(NetworkChange::new(id, Vec::new()).into())
}

pub fn status_event(id: &str, phase: Phase, state: SnapshotState) -> WatchEvent {
    WatchEvent::updated(
        NetworkSnapshot {
            id: id.into(),
            status: SnapshotStatus::new(phase, state),
            ..Default::default()
        }
        .into(),
    )
}
