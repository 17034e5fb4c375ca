use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollbackError {
    #[error("upstream error: {0}")]
    Upstream(#[from] clodo_core::OrchestratorError),

    #[error("secret revocation error: {0}")]
    SecretRevocation(String),

    #[error("store error: {0}")]
    Store(#[from] clodo_store::StoreError),

    #[error("malformed rollback action detail: {0}")]
    MalformedAction(String),

    #[error("malformed persisted rollback record: {0}")]
    MalformedRecord(#[from] serde_json::Error),

    #[error("no persisted deployment with id '{0}'")]
    UnknownDeployment(String),
}

impl From<RollbackError> for clodo_core::OrchestratorError {
    fn from(err: RollbackError) -> Self {
        match err {
            RollbackError::Upstream(inner) => inner,
            other => clodo_core::OrchestratorError::Rollback(other.to_string()),
        }
    }
}
