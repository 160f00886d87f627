use serde::{Deserialize, Serialize};

use super::{string_id, DeviceId, NetworkSnapshotId};

string_id!(
    /// Identifier of a device snapshot, conventionally `<device>:<version>`.
    DeviceSnapshotId
);

impl DeviceSnapshotId {
    pub fn for_device(device_id: &DeviceId, device_version: &str) -> Self {
        Self::new(format!("{}:{}", device_id, device_version))
    }
}

/// A configuration value captured at a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    pub path: String,
    pub value: serde_json::Value,
}

/// Point-in-time configuration state of a single device. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub id: DeviceSnapshotId,
    pub device_id: DeviceId,
    pub device_version: String,
    /// The network snapshot that produced this device snapshot.
    pub snapshot_id: NetworkSnapshotId,
    /// Index of the last change folded into `values`.
    pub change_index: u64,
    pub values: Vec<PathValue>,
}

impl DeviceSnapshot {
    pub fn new(device_id: impl Into<DeviceId>, device_version: impl Into<String>) -> Self {
        let device_id = device_id.into();
        let device_version = device_version.into();
        Self {
            id: DeviceSnapshotId::for_device(&device_id, &device_version),
            device_id,
            device_version,
            snapshot_id: NetworkSnapshotId::default(),
            change_index: 0,
            values: Vec::new(),
        }
    }
}
