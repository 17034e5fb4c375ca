use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no deployment history for '{domain_key}'")]
    NoHistory { domain_key: String },
}

impl From<StoreError> for clodo_core::OrchestratorError {
    fn from(err: StoreError) -> Self {
        clodo_core::OrchestratorError::Transient(err.to_string())
    }
}
