//! Watchable store contract consumed by the admin surface.
//!
//! Every enumeration or watch hands back an owned [`Subscription`] that the
//! caller must release; dropping it is enough.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ admin (query / compaction /  │
//! │         rollback)            │
//! └──────────────┬───────────────┘
//!                │ load_all / watch_all / watch / create / rollback
//!                ▼
//! ┌──────────────────────────────┐
//! │ DeviceSnapshotStore          │
//! │ NetworkSnapshotStore         │
//! │ ChangeStore                  │
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐     ┌───────────────────┐
//! │ InMemoryStore (included)     │◄────│ SnapshotCompactor │
//! └──────────────────────────────┘     └───────────────────┘
//! ```

mod compactor;
mod error;
mod in_memory;
#[allow(clippy::module_inception)]
mod store;
mod subscription;

pub use compactor::SnapshotCompactor;
pub use error::StoreError;
pub use in_memory::InMemoryStore;
pub use store::{ChangeStore, DeviceSnapshotStore, NetworkSnapshotStore, WatchOptions};
pub use subscription::Subscription;
