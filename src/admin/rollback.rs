use std::sync::Arc;

use tracing::Span;

use crate::error::AdminError;
use crate::model::ChangeId;
use crate::store::ChangeStore;

/// Forwards rollback requests to the [`ChangeStore`].
pub struct RollbackInvoker {
    store: Arc<dyn ChangeStore>,
    span: Span,
}

impl RollbackInvoker {
    pub fn new(store: Arc<dyn ChangeStore>) -> Self {
        Self {
            store,
            span: tracing::info_span!("rollback"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Roll back a change, returning a confirmation message.
    pub fn rollback(&self, id: &ChangeId) -> Result<String, AdminError> {
        if id.is_empty() {
            return Err(AdminError::InvalidArgument("change id is required".into()));
        }
        self.store.rollback_target_config(id).map_err(|err| {
            tracing::warn!(parent: &self.span, id = %id, error = %err, "rollback failed");
            err
        })?;
        tracing::info!(parent: &self.span, id = %id, "change rolled back");
        Ok(format!("Rolled back change '{}'", id))
    }
}
