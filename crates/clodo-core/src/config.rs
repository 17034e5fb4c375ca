//! Layered configuration loading: built-in defaults, then
//! `clodo-config.json` at the repository root, then environment
//! variables (spec.md §6). Grounded on the teacher's `CliConfig::load`
//! pattern in `aion-cli::config`, generalized to the `config` crate's
//! layered-source builder instead of a single TOML file.

use crate::error::OrchestratorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub parallelism: usize,
    pub phase_deadline_secs: u64,
    pub deployment_deadline_secs: u64,
    pub max_tokens_per_service: usize,
    pub state_root: PathBuf,
    pub rollback_on_error: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            parallelism: 3,
            phase_deadline_secs: 300,
            deployment_deadline_secs: 1800,
            max_tokens_per_service: 5,
            state_root: PathBuf::from("."),
            rollback_on_error: true,
        }
    }
}

impl OrchestratorConfig {
    /// Loads defaults, then overlays `clodo-config.json` (if present at
    /// `repo_root`), then environment variables prefixed `CLODO_`
    /// (e.g. `CLODO_PARALLELISM=5`).
    pub fn load(repo_root: &Path) -> Result<Self, OrchestratorError> {
        let config_path = repo_root.join("clodo-config.json");
        let defaults = OrchestratorConfig::default();

        let mut builder = config::Config::builder().add_source(config::Config::try_from(&defaults).map_err(
            |e| OrchestratorError::Validation(format!("failed to seed config defaults: {e}")),
        )?);

        if config_path.exists() {
            builder = builder.add_source(config::File::from(config_path.clone()).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CLODO")
                .try_parsing(true)
                .separator("_"),
        );

        let built = builder
            .build()
            .map_err(|e| OrchestratorError::Validation(format!("failed to build config: {e}")))?;

        built
            .try_deserialize()
            .map_err(|e| OrchestratorError::Validation(format!("failed to parse configuration: {e}")))
    }
}
