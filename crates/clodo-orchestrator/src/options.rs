use clodo_assessment::UserInputs;
use std::path::PathBuf;

/// Caller-supplied options for one deployment invocation (spec.md
/// §4.B's `planDeployment`/`deploy` operations).
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub artifact_revision: String,
    pub user: String,
    pub audit_token: String,
    pub service_path: PathBuf,
    pub user_inputs: UserInputs,
    pub ignore_blocked: bool,
    pub rollback_on_error: bool,
    pub parallelism: usize,
    pub migrations: Vec<String>,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            artifact_revision: "unspecified".to_string(),
            user: "unknown".to_string(),
            audit_token: "none".to_string(),
            service_path: PathBuf::from("."),
            user_inputs: UserInputs::default(),
            ignore_blocked: false,
            rollback_on_error: true,
            parallelism: 3,
            migrations: Vec::new(),
        }
    }
}
