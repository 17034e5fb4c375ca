use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("no domains configured")]
    NoDomainsConfigured,

    #[error("domain name must not be empty")]
    BlankDomainName,

    #[error("selection '{0}' matched no configured domain")]
    SelectionNotFound(String),
}

impl From<RouterError> for clodo_core::OrchestratorError {
    fn from(err: RouterError) -> Self {
        clodo_core::OrchestratorError::Validation(err.to_string())
    }
}
