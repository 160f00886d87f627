use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::SystemTime;

use tokio::sync::mpsc;

use crate::model::{
    ChangeId, ChangeState, DeviceSnapshot, EventKind, NetworkChange, NetworkSnapshot,
    NetworkSnapshotId, WatchEvent, WatchObject,
};

use super::error::StoreError;
use super::store::{ChangeStore, DeviceSnapshotStore, NetworkSnapshotStore, WatchOptions};
use super::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    NetworkChanges,
    DeviceSnapshots,
    NetworkSnapshots,
}

impl Topic {
    fn of(object: &WatchObject) -> Self {
        match object {
            WatchObject::NetworkChange(_) => Topic::NetworkChanges,
            WatchObject::DeviceSnapshot(_) => Topic::DeviceSnapshots,
            WatchObject::NetworkSnapshot(_) => Topic::NetworkSnapshots,
        }
    }
}

struct Watcher {
    topic: Topic,
    sender: mpsc::UnboundedSender<WatchEvent>,
}

#[derive(Default)]
struct Watchers {
    next_id: u64,
    active: HashMap<u64, Watcher>,
}

impl Watchers {
    fn register(&mut self, topic: Topic, sender: mpsc::UnboundedSender<WatchEvent>) -> u64 {
        self.next_id += 1;
        self.active.insert(self.next_id, Watcher { topic, sender });
        self.next_id
    }

    /// Fan the event out to every watcher of its topic, dropping watchers
    /// whose receiving side is gone.
    fn publish(&mut self, event: &WatchEvent) {
        let topic = Topic::of(&event.object);
        self.active.retain(|_, watcher| {
            watcher.topic != topic || watcher.sender.send(event.clone()).is_ok()
        });
    }
}

#[derive(Default)]
struct State {
    changes: Vec<NetworkChange>,
    device_snapshots: Vec<DeviceSnapshot>,
    network_snapshots: Vec<NetworkSnapshot>,
    last_change_index: u64,
    last_snapshot_index: u64,
}

#[derive(Default)]
struct Inner {
    state: RwLock<State>,
    watchers: Mutex<Watchers>,
}

/// In-memory configuration store backed by `Arc<RwLock<..>>`.
///
/// Clone-friendly (cloning shares the same underlying storage). Watchers get
/// their own unbounded channel; events are published while the state lock is
/// held, so a replaying watch never misses a mutation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change in the log, assigning its index.
    pub fn record_change(&self, mut change: NetworkChange) -> Result<NetworkChange, StoreError> {
        let mut state = self.write("change record")?;
        if state.changes.iter().any(|c| c.id == change.id) {
            return Err(StoreError::Conflict(format!("change '{}'", change.id)));
        }
        state.last_change_index += 1;
        change.index = state.last_change_index;
        state.changes.push(change.clone());
        self.publish(WatchEvent::created(change.clone().into()))?;
        Ok(change)
    }

    pub fn get_change(&self, id: &ChangeId) -> Result<Option<NetworkChange>, StoreError> {
        let state = self.read("change read")?;
        Ok(state.changes.iter().find(|c| &c.id == id).cloned())
    }

    /// All recorded changes in index order.
    pub fn changes(&self) -> Result<Vec<NetworkChange>, StoreError> {
        Ok(self.read("change read")?.changes.clone())
    }

    /// Remove changes created before `cutoff`. Returns how many were pruned.
    pub fn prune_changes(&self, cutoff: SystemTime) -> Result<usize, StoreError> {
        let mut state = self.write("change prune")?;
        let (pruned, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.changes)
            .into_iter()
            .partition(|c| c.created < cutoff);
        state.changes = kept;
        for change in &pruned {
            self.publish(WatchEvent::new(change.clone().into(), EventKind::Deleted))?;
        }
        Ok(pruned.len())
    }

    /// Insert a device snapshot, replacing any earlier one with the same ID.
    ///
    /// IDs are `<device>:<version>`, so each compaction supersedes that
    /// device's previous snapshot in place (an `Updated` event) rather than
    /// keeping one immutable snapshot per network snapshot.
    pub fn put_device_snapshot(&self, snapshot: DeviceSnapshot) -> Result<(), StoreError> {
        let mut state = self.write("device snapshot write")?;
        let kind = match state.device_snapshots.iter_mut().find(|s| s.id == snapshot.id) {
            Some(existing) => {
                *existing = snapshot.clone();
                EventKind::Updated
            }
            None => {
                state.device_snapshots.push(snapshot.clone());
                EventKind::Created
            }
        };
        self.publish(WatchEvent::new(snapshot.into(), kind))
    }

    pub fn device_snapshots(&self) -> Result<Vec<DeviceSnapshot>, StoreError> {
        Ok(self.read("device snapshot read")?.device_snapshots.clone())
    }

    pub fn get_network_snapshot(
        &self,
        id: &NetworkSnapshotId,
    ) -> Result<Option<NetworkSnapshot>, StoreError> {
        let state = self.read("network snapshot read")?;
        Ok(state.network_snapshots.iter().find(|s| &s.id == id).cloned())
    }

    /// Replace a stored network snapshot, typically to advance its status.
    pub fn update_network_snapshot(&self, snapshot: NetworkSnapshot) -> Result<(), StoreError> {
        let mut state = self.write("network snapshot write")?;
        let existing = state
            .network_snapshots
            .iter_mut()
            .find(|s| s.id == snapshot.id)
            .ok_or_else(|| StoreError::NotFound(format!("snapshot '{}'", snapshot.id)))?;
        *existing = snapshot.clone();
        self.publish(WatchEvent::updated(snapshot.into()))
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    fn watchers(&self, operation: &'static str) -> Result<MutexGuard<'_, Watchers>, StoreError> {
        self.inner
            .watchers
            .lock()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    fn publish(&self, event: WatchEvent) -> Result<(), StoreError> {
        self.watchers("publish")?.publish(&event);
        Ok(())
    }

    /// Register a watcher. Callers hold the state lock so that `replay` and
    /// the live feed do not overlap or leave a gap.
    fn subscribe(
        &self,
        topic: Topic,
        replay: Vec<WatchEvent>,
    ) -> Result<Subscription<WatchEvent>, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in replay {
            let _ = tx.send(event);
        }
        let id = self.watchers("watch")?.register(topic, tx);
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(rx, move || {
            if let Some(inner) = inner.upgrade() {
                if let Ok(mut watchers) = inner.watchers.lock() {
                    watchers.active.remove(&id);
                }
            }
        }))
    }
}

impl DeviceSnapshotStore for InMemoryStore {
    fn load_all(&self) -> Result<Subscription<DeviceSnapshot>, StoreError> {
        let state = self.read("device snapshot read")?;
        let (tx, rx) = mpsc::unbounded_channel();
        for snapshot in &state.device_snapshots {
            let _ = tx.send(snapshot.clone());
        }
        Ok(Subscription::detached(rx))
    }

    fn watch_all(&self) -> Result<Subscription<WatchEvent>, StoreError> {
        let _state = self.read("device snapshot watch")?;
        self.subscribe(Topic::DeviceSnapshots, Vec::new())
    }
}

impl NetworkSnapshotStore for InMemoryStore {
    fn create(&self, mut snapshot: NetworkSnapshot) -> Result<NetworkSnapshot, StoreError> {
        let mut state = self.write("network snapshot create")?;
        let index = state.last_snapshot_index + 1;
        if snapshot.id.is_empty() {
            snapshot.id = NetworkSnapshotId::new(format!("snapshot-{}", index));
        }
        if state.network_snapshots.iter().any(|s| s.id == snapshot.id) {
            return Err(StoreError::Conflict(format!("snapshot '{}'", snapshot.id)));
        }
        state.last_snapshot_index = index;
        snapshot.index = index;
        state.network_snapshots.push(snapshot.clone());
        self.publish(WatchEvent::created(snapshot.clone().into()))?;
        Ok(snapshot)
    }

    fn watch(&self, options: WatchOptions) -> Result<Subscription<WatchEvent>, StoreError> {
        let state = self.read("network snapshot watch")?;
        let replay = if options.replay {
            state
                .network_snapshots
                .iter()
                .map(|s| WatchEvent::new(s.clone().into(), EventKind::Replayed))
                .collect()
        } else {
            Vec::new()
        };
        self.subscribe(Topic::NetworkSnapshots, replay)
    }
}

impl ChangeStore for InMemoryStore {
    fn rollback_target_config(&self, id: &ChangeId) -> Result<(), StoreError> {
        let mut state = self.write("change rollback")?;
        let change = state
            .changes
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("change '{}'", id)))?;
        if change.state != ChangeState::Applied {
            return Err(StoreError::Invalid(format!(
                "change '{}' is {:?}; only applied changes can be rolled back",
                id, change.state
            )));
        }
        change.state = ChangeState::RolledBack;
        let change = change.clone();
        self.publish(WatchEvent::updated(change.into()))
    }
}
