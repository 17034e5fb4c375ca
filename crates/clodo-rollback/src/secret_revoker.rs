//! `clodo-rollback` stays independent of `clodo-secrets`: it only needs
//! to revoke whatever was provisioned, not manage secrets day to day.
//! Callers that own a `clodo_secrets::TokenStore` or `Vault` supply an
//! adapter here, the same injectable-collaborator pattern
//! `UpstreamApi`/`Confirmer` use elsewhere.

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait SecretRevoker: Send + Sync {
    async fn revoke_secret(&self, detail: &Value) -> Result<(), String>;
    async fn revoke_token(&self, detail: &Value) -> Result<(), String>;
}

/// Used when rollback runs in a context with nothing to revoke (tests,
/// dry runs); treats every revocation as already satisfied.
pub struct NoopSecretRevoker;

#[async_trait]
impl SecretRevoker for NoopSecretRevoker {
    async fn revoke_secret(&self, _detail: &Value) -> Result<(), String> {
        Ok(())
    }

    async fn revoke_token(&self, _detail: &Value) -> Result<(), String> {
        Ok(())
    }
}
