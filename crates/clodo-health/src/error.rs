use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("upstream error: {0}")]
    Upstream(#[from] clodo_core::OrchestratorError),

    #[error("no sub-tester registered for '{0}'")]
    UnknownSubTester(String),
}

impl From<HealthError> for clodo_core::OrchestratorError {
    fn from(err: HealthError) -> Self {
        match err {
            HealthError::Upstream(inner) => inner,
            other => clodo_core::OrchestratorError::Transient(other.to_string()),
        }
    }
}
