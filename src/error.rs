use crate::matcher::PatternError;
use crate::model::{NetworkSnapshotId, Phase};
use crate::store::StoreError;

/// Error returned by an administrative operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    /// Malformed request: bad pattern, bad retention window, empty ID.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The compaction watch ended before the snapshot's terminal event arrived.
    #[error("snapshot '{id}' state unknown")]
    UnknownState { id: NetworkSnapshotId },

    /// The store reported the snapshot as failed.
    #[error("snapshot '{id}' failed in phase {phase}")]
    CompactionFailed { id: NetworkSnapshotId, phase: Phase },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Passed through from the store unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The caller stopped accepting results mid-stream.
    #[error("stream closed by caller")]
    StreamClosed,

    #[error("operation cancelled")]
    Cancelled,
}

impl From<PatternError> for AdminError {
    fn from(err: PatternError) -> Self {
        AdminError::InvalidArgument(err.to_string())
    }
}

impl AdminError {
    /// Map this error to a gRPC status code number.
    pub fn status_code(&self) -> i32 {
        // Numbering follows google.rpc.Code.
        match self {
            AdminError::InvalidArgument(_) => 3,
            AdminError::UnknownState { .. } => 2,
            AdminError::CompactionFailed { .. } => 10,
            AdminError::PermissionDenied(_) => 7,
            AdminError::Store(StoreError::NotFound(_)) => 5,
            AdminError::Store(StoreError::Invalid(_)) => 3,
            AdminError::Store(StoreError::Conflict(_)) => 6,
            AdminError::Store(StoreError::Unavailable(_)) => 14,
            AdminError::Store(StoreError::LockPoisoned(_)) => 13,
            AdminError::StreamClosed | AdminError::Cancelled => 1,
        }
    }
}
