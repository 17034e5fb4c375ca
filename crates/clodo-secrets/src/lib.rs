pub mod bundle;
pub mod error;
pub mod revoker;
pub mod token;
pub mod vault;

pub use bundle::{BundleGenerator, SecretBundle};
pub use error::SecretError;
pub use revoker::VaultSecretRevoker;
pub use token::{fingerprint, TokenMetadata, TokenRecord, TokenStore};
pub use vault::{EncryptedPayload, Vault};
