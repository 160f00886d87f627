use crate::model::{ChangeId, DeviceSnapshot, NetworkSnapshot, WatchEvent};

use super::error::StoreError;
use super::subscription::Subscription;

/// Options for opening a watch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Deliver the entities that already exist (as `Replayed` events) before
    /// live mutations.
    pub replay: bool,
}

impl WatchOptions {
    pub fn replay() -> Self {
        Self { replay: true }
    }
}

/// Read access to per-device snapshots.
pub trait DeviceSnapshotStore: Send + Sync {
    /// Enumerate every device snapshot. The subscription ends after the last one.
    fn load_all(&self) -> Result<Subscription<DeviceSnapshot>, StoreError>;

    /// Watch device snapshot mutations. The subscription never ends on its own
    /// unless the store shuts down.
    fn watch_all(&self) -> Result<Subscription<WatchEvent>, StoreError>;
}

/// Request/event access to network-wide compaction jobs.
pub trait NetworkSnapshotStore: Send + Sync {
    /// Create a snapshot request. Returns the stored entity with its ID assigned.
    fn create(&self, snapshot: NetworkSnapshot) -> Result<NetworkSnapshot, StoreError>;

    /// Watch network snapshot mutations.
    fn watch(&self, options: WatchOptions) -> Result<Subscription<WatchEvent>, StoreError>;
}

/// Entry point for undoing an applied network change.
pub trait ChangeStore: Send + Sync {
    fn rollback_target_config(&self, id: &ChangeId) -> Result<(), StoreError>;
}
