use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret vault is locked: no encryption key available")]
    Locked,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("stored blob is too short to contain a valid nonce")]
    CorruptBlob,

    #[error("token not found for service '{service}' fingerprint '{fingerprint}'")]
    NotFound { service: String, fingerprint: String },

    #[error("token for service '{service}' fingerprint '{fingerprint}' has expired")]
    Expired { service: String, fingerprint: String },

    #[error("token for service '{service}' fingerprint '{fingerprint}' lacks required permission(s): {missing}")]
    InsufficientPermissions {
        service: String,
        fingerprint: String,
        missing: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<SecretError> for clodo_core::OrchestratorError {
    fn from(err: SecretError) -> Self {
        match &err {
            SecretError::InsufficientPermissions {
                service, fingerprint, ..
            } => clodo_core::OrchestratorError::Permission {
                capability: format!("token:{service}:{fingerprint}"),
                reason: err.to_string(),
            },
            _ => clodo_core::OrchestratorError::Transient(err.to_string()),
        }
    }
}
