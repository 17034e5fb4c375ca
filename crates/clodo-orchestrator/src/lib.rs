//! Multi-Domain Orchestrator (component B): batch planning plus the
//! per-domain `validate -> prepare -> deploy -> verify -> (rollback)`
//! pipeline, built on top of every other component crate in this
//! workspace.

pub mod error;
pub mod options;
pub mod orchestrator;
pub mod pipeline;
pub mod plan;
pub mod result;

pub use error::OrchestratorRuntimeError;
pub use options::DeployOptions;
pub use orchestrator::Orchestrator;
pub use pipeline::DomainPipeline;
pub use plan::{plan_deployment, Plan};
pub use result::{DomainOutcome, DomainResult, PortfolioResult};
