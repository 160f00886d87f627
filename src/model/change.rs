use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::{string_id, DeviceId};

string_id!(
    /// Identifier of a recorded network change.
    ChangeId
);

/// Lifecycle state of a network change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeState {
    Pending,
    Applied,
    Failed,
    RolledBack,
}

/// A single path update within a device change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeValue {
    pub path: String,
    pub value: serde_json::Value,
    /// The path is deleted rather than set.
    #[serde(default)]
    pub removed: bool,
}

/// The portion of a network change that targets one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceChange {
    pub device_id: DeviceId,
    pub device_version: String,
    pub values: Vec<ChangeValue>,
}

/// A configuration change applied (or intended) against one or more devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkChange {
    pub id: ChangeId,
    /// Store-assigned position in the change log.
    pub index: u64,
    pub created: SystemTime,
    pub state: ChangeState,
    pub changes: Vec<DeviceChange>,
}

impl NetworkChange {
    pub fn new(id: impl Into<ChangeId>, changes: Vec<DeviceChange>) -> Self {
        Self {
            id: id.into(),
            index: 0,
            created: SystemTime::now(),
            state: ChangeState::Pending,
            changes,
        }
    }

    pub fn with_state(mut self, state: ChangeState) -> Self {
        self.state = state;
        self
    }

    pub fn with_created(mut self, created: SystemTime) -> Self {
        self.created = created;
        self
    }
}
