//! Change-history compaction requests.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::error::AdminError;
use crate::model::{NetworkSnapshot, WatchObject};
use crate::store::{NetworkSnapshotStore, WatchOptions};

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Validate a protobuf-style duration as a retention window.
pub fn retention_window(seconds: i64, nanos: i32) -> Result<Duration, AdminError> {
    if seconds < 0 || nanos < 0 {
        return Err(AdminError::InvalidArgument(format!(
            "retention period must not be negative ({}s {}ns)",
            seconds, nanos
        )));
    }
    if nanos >= NANOS_PER_SECOND {
        return Err(AdminError::InvalidArgument(format!(
            "retention period nanos out of range: {}",
            nanos
        )));
    }
    Ok(Duration::new(seconds as u64, nanos as u32))
}

/// Requests a network snapshot and waits for it to finish.
///
/// The store runs the compaction asynchronously; this turns the snapshot's
/// event feed into a single result. Finished means the snapshot reached
/// `DELETE`/`COMPLETE`. If the watch closes first the outcome is
/// [`AdminError::UnknownState`]. There are no retries and no internal
/// timeout.
pub struct CompactionOrchestrator {
    store: Arc<dyn NetworkSnapshotStore>,
    fail_fast: bool,
    span: Span,
}

impl CompactionOrchestrator {
    pub fn new(store: Arc<dyn NetworkSnapshotStore>) -> Self {
        Self {
            store,
            fail_fast: false,
            span: tracing::info_span!("compaction"),
        }
    }

    /// Stop waiting as soon as the snapshot reports `FAILED` in either phase.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub async fn compact(
        &self,
        retention: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), AdminError> {
        // Watch before creating so the terminal event cannot be missed.
        let mut subscription = self.store.watch(WatchOptions::default())?;
        let snapshot = self
            .store
            .create(NetworkSnapshot::with_retention(retention))?;
        let id = snapshot.id;
        tracing::info!(
            parent: &self.span,
            id = %id,
            retain_window = ?retention,
            "network snapshot requested"
        );

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(parent: &self.span, id = %id, "compaction wait cancelled");
                    return Err(AdminError::Cancelled);
                }
                event = subscription.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let observed = match event.object {
                WatchObject::NetworkSnapshot(snapshot) => snapshot,
                WatchObject::NetworkChange(_) | WatchObject::DeviceSnapshot(_) => continue,
            };
            if id.is_empty() || observed.id != id {
                tracing::trace!(parent: &self.span, id = %observed.id, "ignoring unrelated snapshot");
                continue;
            }

            let status = observed.status;
            if status.is_terminal() {
                tracing::info!(parent: &self.span, id = %id, "compaction complete");
                return Ok(());
            }
            if self.fail_fast && status.is_failed() {
                tracing::warn!(parent: &self.span, id = %id, phase = %status.phase, "compaction failed");
                return Err(AdminError::CompactionFailed {
                    id,
                    phase: status.phase,
                });
            }
            tracing::debug!(
                parent: &self.span,
                id = %id,
                phase = %status.phase,
                state = ?status.state,
                "compaction progress"
            );
        }

        tracing::warn!(parent: &self.span, id = %id, "snapshot watch closed before completion");
        Err(AdminError::UnknownState { id })
    }
}
