use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorRuntimeError {
    #[error("upstream error: {0}")]
    Upstream(#[from] clodo_core::OrchestratorError),

    #[error("store error: {0}")]
    Store(#[from] clodo_store::StoreError),

    #[error("database error: {0}")]
    Database(#[from] clodo_database::DatabaseError),

    #[error("rollback error: {0}")]
    Rollback(#[from] clodo_rollback::RollbackError),

    #[error("coordinator error: {0}")]
    Coordinator(#[from] clodo_coordinator::CoordinatorError),

    #[error("deployment '{domain}' blocked by a required capability gap and ignoreBlocked was not set")]
    Blocked { domain: String },
}

impl From<OrchestratorRuntimeError> for clodo_core::OrchestratorError {
    fn from(err: OrchestratorRuntimeError) -> Self {
        match err {
            OrchestratorRuntimeError::Upstream(inner) => inner,
            OrchestratorRuntimeError::Blocked { domain } => {
                clodo_core::OrchestratorError::Validation(format!("'{domain}' has a blocked capability gap"))
            }
            other => clodo_core::OrchestratorError::Transient(other.to_string()),
        }
    }
}
