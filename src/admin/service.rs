//! AdminService: authorization, caller logging, and dispatch to the
//! rollback, snapshot listing, and compaction components.
//!
//! ## Example
//!
//! ```ignore
//! use netcfg_admin::admin::{AdminService, Caller, ListSnapshots};
//! use netcfg_admin::store::InMemoryStore;
//!
//! let admin = AdminService::new(InMemoryStore::new());
//!
//! let message = admin.rollback(&Caller::new(), &"change-1".into())?;
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(16);
//! admin
//!     .list_snapshots(&Caller::new(), &ListSnapshots::matching("device-*"), &tx, &cancel)
//!     .await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::error::AdminError;
use crate::model::ChangeId;
use crate::store::{ChangeStore, DeviceSnapshotStore, NetworkSnapshotStore};

use super::auth::{AllowAll, Authorizer, Operation};
use super::caller::Caller;
use super::compaction::CompactionOrchestrator;
use super::query::{ListSnapshots, SnapshotListing, SnapshotQuery};
use super::rollback::RollbackInvoker;
use super::sink::SnapshotSink;

/// The administrative control surface over a configuration store.
pub struct AdminService {
    rollback: RollbackInvoker,
    snapshots: SnapshotQuery,
    compaction: CompactionOrchestrator,
    authorizer: Arc<dyn Authorizer>,
    span: Span,
}

impl AdminService {
    /// Serve every operation from one store.
    pub fn new<S>(store: S) -> Self
    where
        S: ChangeStore + DeviceSnapshotStore + NetworkSnapshotStore + 'static,
    {
        let store = Arc::new(store);
        Self::from_parts(store.clone(), store.clone(), store)
    }

    pub fn from_parts(
        changes: Arc<dyn ChangeStore>,
        device_snapshots: Arc<dyn DeviceSnapshotStore>,
        network_snapshots: Arc<dyn NetworkSnapshotStore>,
    ) -> Self {
        let span = tracing::info_span!("admin");
        Self {
            rollback: RollbackInvoker::new(changes),
            snapshots: SnapshotQuery::new(device_snapshots),
            compaction: CompactionOrchestrator::new(network_snapshots),
            authorizer: Arc::new(AllowAll),
            span: Span::none(),
        }
        .with_span(span)
    }

    /// Log under `span`; each component gets a child span of its own.
    pub fn with_span(mut self, span: Span) -> Self {
        self.rollback = self
            .rollback
            .with_span(tracing::info_span!(parent: &span, "rollback"));
        self.snapshots = self
            .snapshots
            .with_span(tracing::info_span!(parent: &span, "snapshots"));
        self.compaction = self
            .compaction
            .with_span(tracing::info_span!(parent: &span, "compaction"));
        self.span = span;
        self
    }

    pub fn with_authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Arc::new(authorizer);
        self
    }

    pub fn with_compaction_fail_fast(mut self, fail_fast: bool) -> Self {
        self.compaction = self.compaction.with_fail_fast(fail_fast);
        self
    }

    pub fn rollback(&self, caller: &Caller, id: &ChangeId) -> Result<String, AdminError> {
        self.admit(caller, Operation::Rollback)?;
        self.rollback.rollback(id)
    }

    /// Open a listing without streaming it, so pattern and store failures
    /// can be reported before a response stream exists.
    pub fn open_snapshots(
        &self,
        caller: &Caller,
        request: &ListSnapshots,
    ) -> Result<SnapshotListing, AdminError> {
        self.log_caller(caller, Operation::ListSnapshots);
        self.snapshots.open(request)
    }

    pub async fn list_snapshots<S: SnapshotSink>(
        &self,
        caller: &Caller,
        request: &ListSnapshots,
        sink: &S,
        cancel: &CancellationToken,
    ) -> Result<(), AdminError> {
        self.open_snapshots(caller, request)?.run(sink, cancel).await
    }

    pub async fn compact(
        &self,
        caller: &Caller,
        retention: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), AdminError> {
        self.admit(caller, Operation::CompactChanges)?;
        self.compaction.compact(retention, cancel).await
    }

    /// Authorize identified callers. Anonymous requests were not
    /// authenticated upstream and pass through.
    fn admit(&self, caller: &Caller, operation: Operation) -> Result<(), AdminError> {
        if !self.log_caller(caller, operation) {
            return Ok(());
        }
        self.authorizer.authorize(caller, operation).map_err(|err| {
            tracing::warn!(parent: &self.span, %operation, error = %err, "request refused");
            err
        })
    }

    fn log_caller(&self, caller: &Caller, operation: Operation) -> bool {
        if !caller.is_identified() {
            return false;
        }
        tracing::info!(
            parent: &self.span,
            %operation,
            name = caller.name().unwrap_or_default(),
            email = caller.email().unwrap_or_default(),
            groups = ?caller.groups(),
            token = caller.token_hash().unwrap_or_default(),
            "admin operation called"
        );
        true
    }
}
