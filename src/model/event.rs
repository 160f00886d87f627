use serde::{Deserialize, Serialize};

use super::{DeviceSnapshot, NetworkChange, NetworkSnapshot};

/// What happened to the entity carried by a [`WatchEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Emitted while replaying existing entities at watch start.
    Replayed,
    Created,
    Updated,
    Deleted,
}

/// The entity wrapped by a watch event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WatchObject {
    NetworkChange(NetworkChange),
    DeviceSnapshot(DeviceSnapshot),
    NetworkSnapshot(NetworkSnapshot),
}

impl WatchObject {
    /// Identifier of the wrapped entity, whatever its kind.
    pub fn id(&self) -> &str {
        match self {
            WatchObject::NetworkChange(change) => change.id.as_str(),
            WatchObject::DeviceSnapshot(snapshot) => snapshot.id.as_str(),
            WatchObject::NetworkSnapshot(snapshot) => snapshot.id.as_str(),
        }
    }
}

/// A single mutation delivered over a store subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    pub object: WatchObject,
    pub kind: EventKind,
}

impl WatchEvent {
    pub fn new(object: WatchObject, kind: EventKind) -> Self {
        Self { object, kind }
    }

    pub fn created(object: WatchObject) -> Self {
        Self::new(object, EventKind::Created)
    }

    pub fn updated(object: WatchObject) -> Self {
        Self::new(object, EventKind::Updated)
    }
}

impl From<DeviceSnapshot> for WatchObject {
    fn from(snapshot: DeviceSnapshot) -> Self {
        WatchObject::DeviceSnapshot(snapshot)
    }
}

impl From<NetworkSnapshot> for WatchObject {
    fn from(snapshot: NetworkSnapshot) -> Self {
        WatchObject::NetworkSnapshot(snapshot)
    }
}

impl From<NetworkChange> for WatchObject {
    fn from(change: NetworkChange) -> Self {
        WatchObject::NetworkChange(change)
    }
}
