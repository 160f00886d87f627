//! Rollback, snapshot listing and compaction over a watchable store.
//!
//! ```text
//!   request ──► AdminService ──► authorize (identified callers)
//!                    │
//!        ┌───────────┼────────────────────┐
//!        ▼           ▼                    ▼
//!  RollbackInvoker  SnapshotQuery   CompactionOrchestrator
//!        │           │ load_all /         │ watch, then create;
//!        │           │ watch_all          │ wait for DELETE/COMPLETE
//!        ▼           ▼                    ▼
//!   ChangeStore  DeviceSnapshotStore  NetworkSnapshotStore
//! ```
//!
//! Each component logs through the span it was built with; the service
//! hands them child spans of its own.

mod auth;
mod caller;
mod compaction;
mod query;
mod rollback;
mod service;
mod sink;

pub use auth::{AllowAll, Authorizer, Operation};
pub use caller::Caller;
pub use compaction::{retention_window, CompactionOrchestrator};
pub use query::{ListSnapshots, SnapshotListing, SnapshotQuery};
pub use rollback::RollbackInvoker;
pub use service::AdminService;
pub use sink::{SinkClosed, SnapshotSink};
