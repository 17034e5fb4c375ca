//! Encrypted token store: `storeToken`/`retrieveToken`/`rotateToken`/
//! `revokeToken`/`rotateExpiredTokens` from spec.md §4.F, persisted to
//! `.secure-tokens/tokens.json` (directory mode 0700) with a sidecar
//! key file managed by [`crate::vault::Vault`].

use crate::error::SecretError;
use crate::vault::{EncryptedPayload, Vault};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenRecord {
    pub service: String,
    pub fingerprint: String,
    pub payload: EncryptedPayload,
    pub created: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub permissions: Vec<String>,
    pub environment: String,
    /// Present when this record replaced an older one via `rotate_token`.
    pub rotated_from: Option<String>,
}

impl TokenRecord {
    /// Invariant 4: a token whose expiry is at or before `now` is
    /// treated as absent (spec.md §8 boundary: "current time ==
    /// expires is treated as expired").
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.map(|exp| now >= exp).unwrap_or(false)
    }
}

pub fn fingerprint(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)[..16].to_string()
}

#[derive(Debug, Clone, Default)]
pub struct TokenMetadata {
    pub expires: Option<DateTime<Utc>>,
    pub permissions: Vec<String>,
    pub environment: String,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TokensFile {
    records: Vec<TokenRecord>,
}

pub struct TokenStore {
    vault: Vault,
    tokens_path: PathBuf,
    max_tokens_per_service: usize,
    state: Mutex<TokensFile>,
}

impl TokenStore {
    /// Opens (or initializes) the encrypted store rooted at `state_root`,
    /// i.e. `<state_root>/.secure-tokens/{tokens.json,.token-key}`.
    pub fn open(state_root: &Path, max_tokens_per_service: usize) -> Result<Self, SecretError> {
        let dir = state_root.join(".secure-tokens");
        std::fs::create_dir_all(&dir)?;
        set_dir_mode_0700(&dir)?;

        let vault = Vault::open_or_create(&dir.join(".token-key"))?;
        let tokens_path = dir.join("tokens.json");

        let state = if tokens_path.exists() {
            let raw = std::fs::read_to_string(&tokens_path)?;
            if raw.trim().is_empty() {
                TokensFile::default()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            TokensFile::default()
        };

        Ok(Self {
            vault,
            tokens_path,
            max_tokens_per_service,
            state: Mutex::new(state),
        })
    }

    async fn persist(&self, state: &TokensFile) -> Result<(), SecretError> {
        let serialized = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.tokens_path, serialized).await?;
        Ok(())
    }

    /// Evicts the oldest record for `service` if storing one more would
    /// exceed `max_tokens_per_service`.
    fn evict_oldest_if_full(state: &mut TokensFile, service: &str, max: usize) {
        let count = state.records.iter().filter(|r| r.service == service).count();
        if count < max {
            return;
        }
        if let Some(oldest_index) = state
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.service == service)
            .min_by_key(|(_, r)| r.created)
            .map(|(i, _)| i)
        {
            state.records.remove(oldest_index);
        }
    }

    pub async fn store_token(
        &self,
        service: &str,
        plaintext: &str,
        metadata: TokenMetadata,
        now: DateTime<Utc>,
    ) -> Result<String, SecretError> {
        let fp = fingerprint(plaintext);
        let payload = self.vault.encrypt_str(plaintext)?;

        let mut state = self.state.lock().await;
        Self::evict_oldest_if_full(&mut state, service, self.max_tokens_per_service);

        state.records.push(TokenRecord {
            service: service.to_string(),
            fingerprint: fp.clone(),
            payload,
            created: now,
            expires: metadata.expires,
            permissions: metadata.permissions,
            environment: metadata.environment,
            rotated_from: None,
        });
        self.persist(&state).await?;
        Ok(fp)
    }

    fn find<'a>(state: &'a TokensFile, service: &str, fingerprint: &str) -> Option<&'a TokenRecord> {
        state
            .records
            .iter()
            .find(|r| r.service == service && r.fingerprint == fingerprint)
    }

    pub async fn retrieve_token(
        &self,
        service: &str,
        fingerprint: &str,
        required_permissions: &[String],
        now: DateTime<Utc>,
    ) -> Result<String, SecretError> {
        let state = self.state.lock().await;
        let record = Self::find(&state, service, fingerprint).ok_or_else(|| SecretError::NotFound {
            service: service.to_string(),
            fingerprint: fingerprint.to_string(),
        })?;

        if record.is_expired(now) {
            return Err(SecretError::Expired {
                service: service.to_string(),
                fingerprint: fingerprint.to_string(),
            });
        }

        let missing: Vec<String> = required_permissions
            .iter()
            .filter(|p| !record.permissions.iter().any(|g| g == *p))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SecretError::InsufficientPermissions {
                service: service.to_string(),
                fingerprint: fingerprint.to_string(),
                missing: missing.join(", "),
            });
        }

        self.vault.decrypt_str(&record.payload)
    }

    pub async fn rotate_token(
        &self,
        service: &str,
        old_fingerprint: &str,
        new_plaintext: &str,
        now: DateTime<Utc>,
    ) -> Result<String, SecretError> {
        let mut state = self.state.lock().await;
        let old = Self::find(&state, service, old_fingerprint)
            .cloned()
            .ok_or_else(|| SecretError::NotFound {
                service: service.to_string(),
                fingerprint: old_fingerprint.to_string(),
            })?;

        let new_fp = fingerprint(new_plaintext);
        let payload = self.vault.encrypt_str(new_plaintext)?;

        state.records.retain(|r| !(r.service == service && r.fingerprint == old_fingerprint));
        state.records.push(TokenRecord {
            service: service.to_string(),
            fingerprint: new_fp.clone(),
            payload,
            created: now,
            expires: old.expires,
            permissions: old.permissions,
            environment: old.environment,
            rotated_from: Some(old_fingerprint.to_string()),
        });
        self.persist(&state).await?;
        Ok(new_fp)
    }

    pub async fn revoke_token(&self, service: &str, fingerprint: &str) -> Result<(), SecretError> {
        let mut state = self.state.lock().await;
        let before = state.records.len();
        state.records.retain(|r| !(r.service == service && r.fingerprint == fingerprint));
        if state.records.len() == before {
            return Err(SecretError::NotFound {
                service: service.to_string(),
                fingerprint: fingerprint.to_string(),
            });
        }
        self.persist(&state).await
    }

    /// Periodic sweep (spec.md §4.F): deletes every record that has
    /// expired as of `now`. Run on startup and on a timer.
    pub async fn rotate_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, SecretError> {
        let mut state = self.state.lock().await;
        let before = state.records.len();
        state.records.retain(|r| !r.is_expired(now));
        let removed = before - state.records.len();
        if removed > 0 {
            self.persist(&state).await?;
        }
        Ok(removed)
    }

    pub async fn count_for_service(&self, service: &str) -> usize {
        self.state.lock().await.records.iter().filter(|r| r.service == service).count()
    }
}

#[cfg(unix)]
fn set_dir_mode_0700(path: &Path) -> Result<(), SecretError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_dir_mode_0700(_path: &Path) -> Result<(), SecretError> {
    Ok(())
}

pub type PermissionMap = HashMap<String, Vec<String>>;
