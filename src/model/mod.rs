//! Entities recorded by the configuration store.
//!
//! The admin surface never mutates these directly. It reads them from
//! enumerations, observes them through [`WatchEvent`]s, and asks the store
//! to create or roll back on its behalf.

mod change;
mod device_snapshot;
mod event;
mod network_snapshot;

pub use change::{ChangeId, ChangeState, ChangeValue, DeviceChange, NetworkChange};
pub use device_snapshot::{DeviceSnapshot, DeviceSnapshotId, PathValue};
pub use event::{EventKind, WatchEvent, WatchObject};
pub use network_snapshot::{
    NetworkSnapshot, NetworkSnapshotId, Phase, RetentionOptions, SnapshotState, SnapshotStatus,
};

/// Declare an opaque string identifier newtype.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

pub(crate) use string_id;

string_id!(
    /// Identifier of a managed network device.
    DeviceId
);
