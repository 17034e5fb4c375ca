use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("upstream error: {0}")]
    Upstream(#[from] clodo_core::OrchestratorError),

    #[error("production migration for '{domain_key}' requires a prior backup")]
    BackupRequired { domain_key: String },

    #[error("full cleanup on production was not confirmed")]
    CleanupNotConfirmed,

    #[error("full cleanup on production is refused in non-interactive mode")]
    NonInteractiveFullCleanup,

    #[error("no backup found with id '{0}'")]
    BackupNotFound(String),
}

impl From<DatabaseError> for clodo_core::OrchestratorError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Upstream(inner) => inner,
            DatabaseError::BackupRequired { .. }
            | DatabaseError::CleanupNotConfirmed
            | DatabaseError::NonInteractiveFullCleanup => {
                clodo_core::OrchestratorError::Validation(err.to_string())
            }
            _ => clodo_core::OrchestratorError::Transient(err.to_string()),
        }
    }
}
