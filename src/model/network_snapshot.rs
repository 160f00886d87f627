use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::string_id;

string_id!(
    /// Identifier of a network-wide compaction job.
    NetworkSnapshotId
);

/// Stage of a compaction job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Device snapshots are being built.
    #[default]
    Create,
    /// Change history outside the retention window is being pruned.
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Create => f.write_str("CREATE"),
            Phase::Delete => f.write_str("DELETE"),
        }
    }
}

/// Progress within a phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotState {
    #[default]
    Pending,
    Running,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStatus {
    pub phase: Phase,
    pub state: SnapshotState,
}

impl SnapshotStatus {
    pub fn new(phase: Phase, state: SnapshotState) -> Self {
        Self { phase, state }
    }

    /// Compaction is finished only once history pruning has completed.
    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Delete && self.state == SnapshotState::Complete
    }

    pub fn is_failed(&self) -> bool {
        self.state == SnapshotState::Failed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionOptions {
    /// Change history younger than this is preserved.
    pub retain_window: Duration,
}

/// A cluster-wide compaction job.
///
/// The admin surface creates it with only `retention` populated; the store
/// assigns `id` and `index` and owns every `status` transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub id: NetworkSnapshotId,
    pub index: u64,
    pub retention: RetentionOptions,
    pub status: SnapshotStatus,
}

impl NetworkSnapshot {
    pub fn with_retention(retain_window: Duration) -> Self {
        Self {
            retention: RetentionOptions { retain_window },
            ..Self::default()
        }
    }
}
