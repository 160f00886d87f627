//! Errors reported by the configuration store.

/// Error returned by a store operation. Propagated to admin callers unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The request is not valid for the entity's current state.
    #[error("{0}")]
    Invalid(String),

    /// The entity already exists.
    #[error("{0} already exists")]
    Conflict(String),

    /// The store cannot serve the request right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
}
