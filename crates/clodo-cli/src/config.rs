//! Layered CLI configuration: defaults, then `clodo-config.json` at
//! the repository root, then `CLODO_`-prefixed environment variables.
//! Grounded on `aion-cli::config::CliConfig`, generalized from a
//! single TOML file on disk to [`clodo_core::OrchestratorConfig`]'s
//! `config`-crate layering so the CLI and the library agree on where
//! settings come from.

use anyhow::{Context, Result};
use clodo_core::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub orchestrator: OrchestratorConfig,
    pub output_format: String,
    pub platform_name: String,
    pub api_base_url: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig::default(),
            output_format: "table".to_string(),
            platform_name: "cloudflare".to_string(),
            api_base_url: "https://api.cloudflare.com/client/v4".to_string(),
        }
    }
}

impl CliConfig {
    /// Loads `clodo-config.json` at `repo_root` (if present), overlaid
    /// with `CLODO_`-prefixed environment variables, falling back to
    /// defaults for everything else.
    pub fn load(repo_root: &Path) -> Result<Self> {
        let orchestrator = OrchestratorConfig::load(repo_root).context("failed to load orchestrator config")?;

        let config_path = repo_root.join("clodo-config.json");
        let mut config = CliConfig {
            orchestrator,
            ..CliConfig::default()
        };

        if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path)?;
            let overrides: serde_json::Value = serde_json::from_str(&raw)?;
            if let Some(format) = overrides.get("outputFormat").and_then(|v| v.as_str()) {
                config.output_format = format.to_string();
            }
            if let Some(platform) = overrides.get("platform").and_then(|v| v.as_str()) {
                config.platform_name = platform.to_string();
            }
            if let Some(url) = overrides.get("apiBaseUrl").and_then(|v| v.as_str()) {
                config.api_base_url = url.to_string();
            }
        }

        Ok(config)
    }

    /// Directory state (audit log, token vault, backups, caches) is
    /// rooted at `orchestrator.state_root`, resolved relative to the
    /// repository root if given as a relative path.
    pub fn state_root(&self, repo_root: &Path) -> PathBuf {
        if self.orchestrator.state_root.is_absolute() {
            self.orchestrator.state_root.clone()
        } else {
            repo_root.join(&self.orchestrator.state_root)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_config_file_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(dir.path()).unwrap();
        assert_eq!(config.output_format, "table");
        assert_eq!(config.platform_name, "cloudflare");
    }

    #[test]
    fn config_file_overrides_output_format_and_platform() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("clodo-config.json"),
            r#"{"outputFormat": "json", "platform": "aws"}"#,
        )
        .unwrap();
        let config = CliConfig::load(dir.path()).unwrap();
        assert_eq!(config.output_format, "json");
        assert_eq!(config.platform_name, "aws");
    }

    #[test]
    fn state_root_resolves_relative_to_repo_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(dir.path()).unwrap();
        assert_eq!(config.state_root(dir.path()), dir.path().join("."));
    }
}
