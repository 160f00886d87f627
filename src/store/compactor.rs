//! Drives network snapshot lifecycles for the in-memory store.
//!
//! A created snapshot moves through `CREATE` (device snapshots are folded
//! from applied changes) and then `DELETE` (changes older than the retention
//! window are pruned). Every transition is written back to the store, so
//! watchers observe the same event sequence a persistent store would emit.

use std::collections::BTreeMap;
use std::time::SystemTime;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::model::{
    ChangeState, DeviceId, DeviceSnapshot, NetworkSnapshot, PathValue, Phase, SnapshotState,
    SnapshotStatus, WatchObject,
};

use super::error::StoreError;
use super::in_memory::InMemoryStore;
use super::store::{NetworkSnapshotStore, WatchOptions};

pub struct SnapshotCompactor {
    store: InMemoryStore,
    span: Span,
}

impl SnapshotCompactor {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            span: tracing::info_span!("compactor"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Watch for new snapshot requests and run each one until `cancel` fires.
    ///
    /// The watch is opened before this returns, so requests created after
    /// the call are never missed. Pending requests that already exist are
    /// picked up through replay.
    pub fn spawn(self, cancel: CancellationToken) -> Result<JoinHandle<()>, StoreError> {
        let mut subscription = self.store.watch(WatchOptions::replay())?;
        Ok(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    event = subscription.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                let WatchObject::NetworkSnapshot(snapshot) = event.object else {
                    continue;
                };
                if snapshot.status != SnapshotStatus::default() {
                    continue;
                }
                if let Err(err) = self.compact(snapshot) {
                    tracing::error!(parent: &self.span, error = %err, "compaction failed");
                }
            }
            tracing::debug!(parent: &self.span, "compactor stopped");
        }))
    }

    /// Run both phases for one snapshot request.
    pub fn compact(&self, mut snapshot: NetworkSnapshot) -> Result<(), StoreError> {
        tracing::info!(parent: &self.span, id = %snapshot.id, "compacting changes");

        self.advance(&mut snapshot, Phase::Create, SnapshotState::Running)?;
        match self.build_device_snapshots(&snapshot) {
            Ok(count) => {
                tracing::debug!(parent: &self.span, id = %snapshot.id, count, "device snapshots built");
            }
            Err(err) => {
                self.advance(&mut snapshot, Phase::Create, SnapshotState::Failed)?;
                return Err(err);
            }
        }
        self.advance(&mut snapshot, Phase::Create, SnapshotState::Complete)?;

        self.advance(&mut snapshot, Phase::Delete, SnapshotState::Running)?;
        let cutoff = SystemTime::now()
            .checked_sub(snapshot.retention.retain_window)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        match self.store.prune_changes(cutoff) {
            Ok(pruned) => {
                tracing::debug!(parent: &self.span, id = %snapshot.id, pruned, "changes pruned");
            }
            Err(err) => {
                self.advance(&mut snapshot, Phase::Delete, SnapshotState::Failed)?;
                return Err(err);
            }
        }
        self.advance(&mut snapshot, Phase::Delete, SnapshotState::Complete)
    }

    fn advance(
        &self,
        snapshot: &mut NetworkSnapshot,
        phase: Phase,
        state: SnapshotState,
    ) -> Result<(), StoreError> {
        snapshot.status = SnapshotStatus::new(phase, state);
        self.store.update_network_snapshot(snapshot.clone())
    }

    /// Fold applied changes onto each device's previous snapshot.
    fn build_device_snapshots(&self, snapshot: &NetworkSnapshot) -> Result<usize, StoreError> {
        let mut devices: BTreeMap<(DeviceId, String), DeviceSnapshot> = self
            .store
            .device_snapshots()?
            .into_iter()
            .map(|s| ((s.device_id.clone(), s.device_version.clone()), s))
            .collect();
        let mut touched = Vec::new();

        for change in self.store.changes()? {
            if change.state != ChangeState::Applied {
                continue;
            }
            for device_change in &change.changes {
                let key = (device_change.device_id.clone(), device_change.device_version.clone());
                let device = devices.entry(key.clone()).or_insert_with(|| {
                    DeviceSnapshot::new(key.0.clone(), key.1.clone())
                });
                if change.index <= device.change_index {
                    continue;
                }
                for value in &device_change.values {
                    device.values.retain(|v| v.path != value.path);
                    if !value.removed {
                        device.values.push(PathValue {
                            path: value.path.clone(),
                            value: value.value.clone(),
                        });
                    }
                }
                device.change_index = change.index;
                if !touched.contains(&key) {
                    touched.push(key);
                }
            }
        }

        for key in &touched {
            if let Some(mut device) = devices.remove(key) {
                device.snapshot_id = snapshot.id.clone();
                device.values.sort_by(|a, b| a.path.cmp(&b.path));
                self.store.put_device_snapshot(device)?;
            }
        }
        Ok(touched.len())
    }
}
