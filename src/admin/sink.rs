use std::future::Future;

use tokio::sync::mpsc;

use crate::model::DeviceSnapshot;

/// The caller's end of a snapshot stream went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("snapshot sink closed")]
pub struct SinkClosed;

/// Output stream a snapshot listing forwards into.
///
/// `send` may wait while the caller is slow to consume. `closed` resolves
/// once the caller has stopped listening.
pub trait SnapshotSink: Send + Sync {
    fn send(&self, snapshot: DeviceSnapshot) -> impl Future<Output = Result<(), SinkClosed>> + Send;

    fn closed(&self) -> impl Future<Output = ()> + Send;
}

impl SnapshotSink for mpsc::Sender<DeviceSnapshot> {
    async fn send(&self, snapshot: DeviceSnapshot) -> Result<(), SinkClosed> {
        mpsc::Sender::send(self, snapshot)
            .await
            .map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        mpsc::Sender::closed(self).await
    }
}
