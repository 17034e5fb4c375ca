use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("key '{key}' is already held by writer '{holder}'")]
    WriterConflict { key: String, holder: String },

    #[error("key '{key}' is held by '{holder}', not '{attempted}'")]
    NotOwner { key: String, holder: String, attempted: String },

    #[error("key '{0}' has no value")]
    NotFound(String),

    #[error("timed out waiting for key '{0}'")]
    Timeout(String),
}
