//! Authorization hook consulted before mutating operations.

use std::fmt;

use crate::error::AdminError;

use super::caller::Caller;

/// The administrative operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Rollback,
    ListSnapshots,
    CompactChanges,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Rollback => f.write_str("RollbackNetworkChange"),
            Operation::ListSnapshots => f.write_str("ListSnapshots"),
            Operation::CompactChanges => f.write_str("CompactChanges"),
        }
    }
}

/// Policy decision point. Implementations return
/// [`AdminError::PermissionDenied`] to refuse.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, caller: &Caller, operation: Operation) -> Result<(), AdminError>;
}

/// Admits every caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _caller: &Caller, _operation: Operation) -> Result<(), AdminError> {
        Ok(())
    }
}

impl<F> Authorizer for F
where
    F: Fn(&Caller, Operation) -> Result<(), AdminError> + Send + Sync,
{
    fn authorize(&self, caller: &Caller, operation: Operation) -> Result<(), AdminError> {
        self(caller, operation)
    }
}
