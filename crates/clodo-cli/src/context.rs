//! Composition root: wires the eleven library crates together into
//! one [`AppContext`] each command operates against. Mirrors the shape
//! of `aion-server`'s top-level `AppState` construction — one function
//! that builds every collaborator once, in dependency order, and hands
//! out `Arc`s.

use crate::config::CliConfig;
use anyhow::{Context, Result};
use clodo_assessment::{AssessmentCache, AssessmentEngine};
use clodo_core::metrics::OrchestratorMetrics;
use clodo_core::traits::{Confirmer, UpstreamApi};
use clodo_coordinator::Coordinator;
use clodo_database::DatabaseOrchestrator;
use clodo_health::{HealthCheckConfig, HealthChecker, ProductionTester};
use clodo_orchestrator::{DomainPipeline, Orchestrator};
use clodo_ratelimit::RateLimitedClient;
use clodo_rollback::RollbackManager;
use clodo_router::{DomainRouter, EnvVarSource, JsonConfigSource};
use clodo_secrets::{BundleGenerator, TokenStore, VaultSecretRevoker};
use clodo_store::StateStore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub struct AppContext {
    pub repo_root: PathBuf,
    pub config: CliConfig,
    pub upstream: Arc<dyn UpstreamApi>,
    pub tokens: Arc<TokenStore>,
    pub store: Arc<StateStore>,
    pub router: Arc<DomainRouter>,
    pub assessment: Arc<AssessmentEngine>,
    pub bundles: Arc<BundleGenerator>,
    pub database: Arc<DatabaseOrchestrator>,
    pub health_checker: Arc<HealthChecker>,
    pub production_tester: Arc<ProductionTester>,
    pub rollback: Arc<RollbackManager>,
    pub metrics: Arc<OrchestratorMetrics>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppContext {
    pub fn build(
        repo_root: PathBuf,
        config: CliConfig,
        api_token: Option<String>,
        account_id: Option<String>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Result<Self> {
        let state_root = config.state_root(&repo_root);
        std::fs::create_dir_all(&state_root).context("failed to create state directory")?;

        let http_upstream: Arc<dyn UpstreamApi> = Arc::new(crate::upstream::HttpUpstream::new(
            api_token.unwrap_or_default(),
            account_id.unwrap_or_default(),
            config.api_base_url.clone(),
        ));
        let upstream: Arc<dyn UpstreamApi> = Arc::new(RateLimitedClient::new(http_upstream));

        let tokens = Arc::new(TokenStore::open(&state_root, config.orchestrator.max_tokens_per_service)?);
        let store = Arc::new(StateStore::open(&state_root)?);

        let sources: Vec<Box<dyn clodo_router::DomainSource>> = vec![
            Box::new(JsonConfigSource::new(repo_root.join("config/domains.json"))),
            Box::new(EnvVarSource::new("CLODO_DOMAINS", ',')),
        ];
        let router = Arc::new(DomainRouter::new(sources, HashMap::new()));

        let assessment = Arc::new(AssessmentEngine::new(upstream.clone(), AssessmentCache::new(300)));
        let bundles = Arc::new(BundleGenerator::new());
        let database = Arc::new(DatabaseOrchestrator::new(upstream.clone(), confirmer, &state_root)?);

        let health_checker = Arc::new(HealthChecker::new(
            upstream.clone(),
            HealthCheckConfig {
                initial_deadline: Duration::from_secs(30),
                propagation_wait: Duration::from_secs(5),
                max_retries: 3,
            },
        ));
        let production_tester = Arc::new(ProductionTester::new(upstream.clone(), clodo_health::artifacts_root(&state_root)));
        let rollback = Arc::new(RollbackManager::new(
            upstream.clone(),
            Arc::new(VaultSecretRevoker::new(bundles.clone(), tokens.clone())),
        ));
        let metrics = Arc::new(OrchestratorMetrics::new());
        let coordinator = Arc::new(Coordinator::new());

        let pipeline = Arc::new(DomainPipeline::new(
            upstream.clone(),
            assessment.clone(),
            bundles.clone(),
            database.clone(),
            health_checker.clone(),
            production_tester.clone(),
            rollback.clone(),
            store.clone(),
            coordinator.clone(),
            metrics.clone(),
        ));
        let orchestrator = Arc::new(Orchestrator::new(pipeline, coordinator));

        Ok(Self {
            repo_root,
            config,
            upstream,
            tokens,
            store,
            router,
            assessment,
            bundles,
            database,
            health_checker,
            production_tester,
            rollback,
            metrics,
            orchestrator,
        })
    }
}
