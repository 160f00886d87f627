//! gRPC transport for the admin service.
//!
//! Requires the `grpc` feature. Uses tonic for the gRPC server and prost
//! for message serialization (standard protobuf wire format, no `.proto` file).
//!
//! ## RPCs
//!
//! - `RollbackNetworkChange` (unary): roll back a change by name.
//! - `ListSnapshots` (server streaming): list or watch device snapshots by ID pattern.
//! - `CompactChanges` (unary): snapshot every device and prune older change history.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use netcfg_admin::{admin::AdminService, grpc, store::InMemoryStore};
//!
//! let service = Arc::new(AdminService::new(InMemoryStore::new()));
//! let handler = grpc::AdminGrpcHandler::new(service);
//! grpc::serve_grpc(handler, "[::1]:5150".parse()?, shutdown).await?;
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

use crate::admin::{
    retention_window, AdminService, Caller, ListSnapshots, SinkClosed, SnapshotSink,
};
use crate::error::AdminError;
use crate::model::{ChangeId, DeviceSnapshot};

// ---------------------------------------------------------------------------
// Message types (prost, standard protobuf wire format)
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, prost::Message)]
pub struct RollbackRequest {
    /// ID of the network change to roll back.
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RollbackResponse {
    #[prost(string, tag = "1")]
    pub message: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListSnapshotsRequest {
    /// Snapshot ID pattern; `*` and `?` are wildcards.
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(bool, tag = "2")]
    pub subscribe: bool,
    #[prost(bool, tag = "3")]
    pub exact: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PathValueMessage {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, tag = "2")]
    pub value: String, // JSON string
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotMessage {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub device_id: String,
    #[prost(string, tag = "3")]
    pub device_version: String,
    #[prost(string, tag = "4")]
    pub snapshot_id: String,
    #[prost(uint64, tag = "5")]
    pub change_index: u64,
    #[prost(message, repeated, tag = "6")]
    pub values: Vec<PathValueMessage>,
}

/// Wire-compatible with `google.protobuf.Duration`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DurationMessage {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CompactChangesRequest {
    /// Change history younger than this is kept. Absent means keep none.
    #[prost(message, optional, tag = "1")]
    pub retention_period: Option<DurationMessage>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CompactChangesResponse {}

impl From<DeviceSnapshot> for SnapshotMessage {
    fn from(snapshot: DeviceSnapshot) -> Self {
        Self {
            id: snapshot.id.to_string(),
            device_id: snapshot.device_id.to_string(),
            device_version: snapshot.device_version,
            snapshot_id: snapshot.snapshot_id.to_string(),
            change_index: snapshot.change_index,
            values: snapshot
                .values
                .into_iter()
                .map(|v| PathValueMessage {
                    path: v.path,
                    value: v.value.to_string(),
                })
                .collect(),
        }
    }
}

impl From<Duration> for DurationMessage {
    fn from(duration: Duration) -> Self {
        Self {
            seconds: duration.as_secs() as i64,
            nanos: duration.subsec_nanos() as i32,
        }
    }
}

impl From<AdminError> for Status {
    fn from(err: AdminError) -> Self {
        Status::new(tonic::Code::from_i32(err.status_code()), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Generated service trait + server/client
// ---------------------------------------------------------------------------

include!(concat!(
    env!("OUT_DIR"),
    "/netcfg.admin.ConfigAdminService.rs"
));

pub use config_admin_service_client::ConfigAdminServiceClient;
pub use config_admin_service_server::{ConfigAdminService, ConfigAdminServiceServer};

// ---------------------------------------------------------------------------
// Handler implementation
// ---------------------------------------------------------------------------

/// Streams snapshots into a tonic response channel.
struct GrpcSink {
    tx: mpsc::Sender<Result<SnapshotMessage, Status>>,
}

impl SnapshotSink for GrpcSink {
    async fn send(&self, snapshot: DeviceSnapshot) -> Result<(), SinkClosed> {
        self.tx
            .send(Ok(snapshot.into()))
            .await
            .map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}

/// gRPC handler that wraps an [`AdminService`] and implements the generated
/// `ConfigAdminService` trait.
pub struct AdminGrpcHandler {
    service: Arc<AdminService>,
    stream_buffer: usize,
    shutdown: CancellationToken,
}

impl AdminGrpcHandler {
    pub fn new(service: Arc<AdminService>) -> Self {
        Self {
            service,
            stream_buffer: 64,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_stream_buffer(mut self, stream_buffer: usize) -> Self {
        self.stream_buffer = stream_buffer.max(1);
        self
    }

    /// Cancelling `shutdown` ends every in-flight listing and compaction wait.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

#[tonic::async_trait]
impl ConfigAdminService for AdminGrpcHandler {
    async fn rollback_network_change(
        &self,
        request: Request<RollbackRequest>,
    ) -> Result<Response<RollbackResponse>, Status> {
        let caller = caller_from_metadata(request.metadata());
        let req = request.into_inner();

        let message = self.service.rollback(&caller, &ChangeId::from(req.name))?;
        Ok(Response::new(RollbackResponse { message }))
    }

    type ListSnapshotsStream = ReceiverStream<Result<SnapshotMessage, Status>>;

    async fn list_snapshots(
        &self,
        request: Request<ListSnapshotsRequest>,
    ) -> Result<Response<Self::ListSnapshotsStream>, Status> {
        let caller = caller_from_metadata(request.metadata());
        let req = request.into_inner();
        let listing = ListSnapshots {
            pattern: req.id,
            exact: req.exact,
            subscribe: req.subscribe,
        };
        // Open before responding: a bad pattern or store failure fails the
        // call itself, never a stream that already started.
        let listing = self.service.open_snapshots(&caller, &listing)?;

        let (tx, rx) = mpsc::channel(self.stream_buffer);
        let cancel = self.shutdown.child_token();
        tokio::spawn(async move {
            let sink = GrpcSink { tx };
            match listing.run(&sink, &cancel).await {
                Ok(()) | Err(AdminError::StreamClosed) => {}
                Err(err) => {
                    let _ = sink.tx.send(Err(err.into())).await;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn compact_changes(
        &self,
        request: Request<CompactChangesRequest>,
    ) -> Result<Response<CompactChangesResponse>, Status> {
        let caller = caller_from_metadata(request.metadata());
        let req = request.into_inner();

        let retention = match req.retention_period {
            Some(period) => retention_window(period.seconds, period.nanos)?,
            None => Duration::ZERO,
        };
        let cancel = self.shutdown.child_token();
        self.service.compact(&caller, retention, &cancel).await?;
        Ok(Response::new(CompactChangesResponse {}))
    }
}

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

/// Build the caller identity from ASCII metadata (lowercased key → value).
fn caller_from_metadata(metadata: &tonic::metadata::MetadataMap) -> Caller {
    let mut vars = HashMap::new();
    for kv in metadata.iter() {
        if let tonic::metadata::KeyAndValueRef::Ascii(key, value) = kv {
            if let Ok(v) = value.to_str() {
                vars.insert(key.as_str().to_string(), v.to_string());
            }
        }
    }
    Caller::from_map(vars)
}

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

/// Create a `ConfigAdminServiceServer` from a shared `AdminService`.
pub fn grpc_server(service: Arc<AdminService>) -> ConfigAdminServiceServer<AdminGrpcHandler> {
    ConfigAdminServiceServer::new(AdminGrpcHandler::new(service))
}

/// Bind and serve the gRPC transport until `shutdown` is cancelled.
pub async fn serve_grpc(
    handler: AdminGrpcHandler,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(), tonic::transport::Error> {
    let handler = handler.with_shutdown(shutdown.clone());
    tonic::transport::Server::builder()
        .add_service(ConfigAdminServiceServer::new(handler))
        .serve_with_shutdown(addr, async move { shutdown.cancelled().await })
        .await
}
