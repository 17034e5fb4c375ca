//! TTL-bounded assessment cache, keyed by service path + the material
//! user inputs that can change what gets discovered. Grounded on
//! `aion-core::cache`'s `moka`-backed response cache, generalized from
//! a single flat TTL to the same shape since assessments have no
//! need for size-based eviction beyond `moka`'s defaults.

use crate::assessment::{CapabilityAssessment, UserInputs};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

pub fn cache_key(service_path: &Path, user_inputs: &UserInputs) -> String {
    let canonical_inputs = serde_json::to_string(user_inputs).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(service_path.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(canonical_inputs.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct AssessmentCache {
    inner: moka::future::Cache<String, CapabilityAssessment>,
}

impl AssessmentCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: moka::future::Cache::builder()
                .time_to_live(Duration::from_secs(ttl_secs))
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<CapabilityAssessment> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, assessment: CapabilityAssessment) {
        self.inner.insert(key, assessment).await;
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_changes_with_user_inputs() {
        let path = Path::new("/svc/example");
        let a = cache_key(path, &UserInputs::default());
        let b = cache_key(
            path,
            &UserInputs {
                api_token: Some("tok".into()),
                ..Default::default()
            },
        );
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn entries_are_retrievable_until_invalidated() {
        let cache = AssessmentCache::new(60);
        let assessment = CapabilityAssessment {
            service_type: crate::manifest::ServiceType::Generic,
            manifest: crate::manifest::CapabilityManifest::for_service_type(
                crate::manifest::ServiceType::Generic,
                clodo_core::Environment::Development,
            ),
            gap_analysis: Default::default(),
            recommendations: vec![],
            confidence: 80,
            cache_key: "k".into(),
        };
        cache.insert("k".into(), assessment).await;
        assert!(cache.get("k").await.is_some());
        cache.invalidate_all();
        cache.inner.run_pending_tasks().await;
        assert!(cache.get("k").await.is_none());
    }
}
