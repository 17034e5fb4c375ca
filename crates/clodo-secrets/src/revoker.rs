//! Adapter wiring this crate's collaborators into the
//! `clodo_rollback::SecretRevoker` seam (spec.md §4.D): the
//! `delete-secret` and `revoke-token` inverses need to actually undo
//! what [`crate::bundle::BundleGenerator`]/[`crate::token::TokenStore`]
//! provisioned, not treat revocation as a no-op the way
//! `clodo_rollback::NoopSecretRevoker` does for tests and dry runs.

use crate::bundle::BundleGenerator;
use crate::token::TokenStore;
use async_trait::async_trait;
use clodo_rollback::SecretRevoker;
use serde_json::Value;
use std::sync::Arc;

fn field<'a>(detail: &'a Value, key: &str) -> Result<&'a str, String> {
    detail.get(key).and_then(Value::as_str).ok_or_else(|| format!("missing '{key}'"))
}

pub struct VaultSecretRevoker {
    bundles: Arc<BundleGenerator>,
    tokens: Arc<TokenStore>,
}

impl VaultSecretRevoker {
    pub fn new(bundles: Arc<BundleGenerator>, tokens: Arc<TokenStore>) -> Self {
        Self { bundles, tokens }
    }
}

#[async_trait]
impl SecretRevoker for VaultSecretRevoker {
    async fn revoke_secret(&self, detail: &Value) -> Result<(), String> {
        let domain = field(detail, "domain")?;
        let environment = field(detail, "environment")?;
        self.bundles.evict(domain, environment);
        Ok(())
    }

    async fn revoke_token(&self, detail: &Value) -> Result<(), String> {
        let service = field(detail, "service")?;
        let fingerprint = field(detail, "fingerprint")?;
        self.tokens.revoke_token(service, fingerprint).await.map_err(|err| err.to_string())
    }
}
