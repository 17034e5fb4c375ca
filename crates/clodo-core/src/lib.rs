pub mod config;
pub mod deployment;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod traits;

pub use config::OrchestratorConfig;
pub use deployment::{
    Deployment, DeploymentId, Outcome, Phase, PhaseRecord, RollbackAction, RollbackActionKind,
};
pub use domain::{Domain, Environment, Portfolio};
pub use error::{ErrorCategory, OrchestratorError, OrchestratorResult};
pub use traits::{
    Confirmer, DnsConflictStatus, HealthProbeResult, NonInteractiveConfirmer, OwnershipStatus,
    ResourceHandle, TokenVerification, UpstreamApi,
};
