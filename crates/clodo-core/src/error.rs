//! Error taxonomy shared across the workspace (spec.md §7).
//!
//! Component crates define their own narrower `thiserror` enums and
//! convert into [`OrchestratorError`] at the boundary where they hand
//! control back to `clodo-orchestrator` or `clodo-cli`, the same way
//! the teacher's crates each carry local error types that eventually
//! surface through one top-level `anyhow::Result` at the CLI edge.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Permission,
    Quota,
    Transient,
    Invariant,
    Rollback,
    Cancelled,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Permission => "permission",
            ErrorCategory::Quota => "quota",
            ErrorCategory::Transient => "transient",
            ErrorCategory::Invariant => "invariant",
            ErrorCategory::Rollback => "rollback",
            ErrorCategory::Cancelled => "cancelled",
        }
    }

    /// Whether `clodo-ratelimit` should retry a call that failed with
    /// this category, per spec.md §7's propagation policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Transient | ErrorCategory::Quota)
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("permission denied: missing scope for {capability}: {reason}")]
    Permission { capability: String, reason: String },

    #[error("rate limit exhausted for api class '{api_class}' after {attempts} attempts")]
    Quota { api_class: String, attempts: u32 },

    #[error("transient error: {0}")]
    Transient(String),

    #[error("internal invariant violated: {0}")]
    Invariant(String),

    #[error("rollback action failed: {0}")]
    Rollback(String),

    #[error("cancelled by user at phase '{phase}'")]
    Cancelled { phase: String },
}

impl OrchestratorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            OrchestratorError::Validation(_) => ErrorCategory::Validation,
            OrchestratorError::Permission { .. } => ErrorCategory::Permission,
            OrchestratorError::Quota { .. } => ErrorCategory::Quota,
            OrchestratorError::Transient(_) => ErrorCategory::Transient,
            OrchestratorError::Invariant(_) => ErrorCategory::Invariant,
            OrchestratorError::Rollback(_) => ErrorCategory::Rollback,
            OrchestratorError::Cancelled { .. } => ErrorCategory::Cancelled,
        }
    }

    /// Exit codes from spec.md §6: 0 success, 1 generic failure, 2
    /// validation/blocked, 3 cancelled, 4 rate-limit exhaustion, 5
    /// rollback partially recovered. The caller decides when 0 and 5
    /// apply (they aren't errors in the same sense); this only covers
    /// the error-carrying categories.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Permission => 2,
            ErrorCategory::Cancelled => 3,
            ErrorCategory::Quota => 4,
            ErrorCategory::Transient | ErrorCategory::Invariant | ErrorCategory::Rollback => 1,
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_errors_map_to_exit_code_four() {
        let err = OrchestratorError::Quota {
            api_class: "workers".into(),
            attempts: 5,
        };
        assert_eq!(err.exit_code(), 4);
        assert!(err.category().is_retryable());
    }

    #[test]
    fn invariant_errors_are_never_retryable() {
        let err = OrchestratorError::Invariant("bad state".into());
        assert!(!err.category().is_retryable());
        assert_eq!(err.exit_code(), 1);
    }
}
