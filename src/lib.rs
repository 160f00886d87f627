//! Administrative control surface for a network configuration store.
//!
//! Three operations sit on top of a watchable store:
//!
//! - roll back an applied network change,
//! - list device snapshots by wildcard ID, optionally staying subscribed,
//! - compact change history into device snapshots and wait for the
//!   compaction to finish.
//!
//! The `grpc` feature (on by default) exposes them as the
//! `netcfg.admin.ConfigAdminService` gRPC service.

pub mod admin;
pub mod config;
pub mod error;
pub mod matcher;
pub mod model;
pub mod store;

#[cfg(feature = "grpc")]
pub mod grpc;

pub use admin::{AdminService, Caller, ListSnapshots, SnapshotSink};
pub use config::{AdminConfig, ConfigError};
pub use error::AdminError;
pub use store::{InMemoryStore, SnapshotCompactor, StoreError};
