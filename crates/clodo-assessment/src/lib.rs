//! Capability Assessment Engine (component A): discovers what a
//! service actually has configured, compares it against what its
//! inferred shape requires, and reports the gap with a confidence
//! score — the first stage every deployment run passes through.

pub mod assessment;
pub mod cache;
pub mod discovery;
pub mod gap;
pub mod manifest;

pub use assessment::{AssessmentEngine, CapabilityAssessment, Recommendation, UserInputs};
pub use cache::AssessmentCache;
pub use discovery::{discover, infer_service_type, DiscoveredArtifacts};
pub use gap::{Gap, GapAnalysis, GapPriority, GapStatus};
pub use manifest::{CapabilityManifest, ServiceType};
