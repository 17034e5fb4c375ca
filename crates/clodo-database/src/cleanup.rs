//! Data cleanup modes (spec.md §4.J): three fixed SQL scripts. `full`
//! on `production` requires double confirmation and is refused
//! outright in non-interactive mode.

use crate::error::DatabaseError;
use clodo_core::domain::Environment;
use clodo_core::traits::Confirmer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    LogsOnly,
    Partial,
    Full,
}

impl CleanupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupMode::LogsOnly => "logs-only",
            CleanupMode::Partial => "partial",
            CleanupMode::Full => "full",
        }
    }

    /// The fixed SQL script run for this mode. A real migration tool
    /// invocation would pipe this to `wrangler d1 execute`; here it is
    /// the payload the caller hands to `UpstreamApi::apply_migrations`.
    pub fn script(&self) -> &'static str {
        match self {
            CleanupMode::LogsOnly => "DELETE FROM request_logs WHERE created_at < datetime('now', '-30 days');",
            CleanupMode::Partial => {
                "DELETE FROM request_logs WHERE created_at < datetime('now', '-30 days');\n\
                 DELETE FROM sessions WHERE expires_at < datetime('now');"
            }
            CleanupMode::Full => {
                "DELETE FROM request_logs;\nDELETE FROM sessions;\nDELETE FROM cache_entries;\nVACUUM;"
            }
        }
    }
}

/// Checks whether `mode` may proceed for `(domain, env)` given the
/// caller's confirmer and whether the invocation is interactive.
/// `full` on `production` is the only gated combination; every other
/// mode/environment pair is unconditionally allowed.
pub fn authorize_cleanup(
    mode: CleanupMode,
    environment: Environment,
    confirmer: &dyn Confirmer,
    interactive: bool,
    domain: &str,
) -> Result<(), DatabaseError> {
    if mode != CleanupMode::Full || environment != Environment::Production {
        return Ok(());
    }

    if !interactive {
        return Err(DatabaseError::NonInteractiveFullCleanup);
    }

    let first = confirmer.confirm(&format!(
        "This will permanently delete ALL data for '{domain}' in production. Continue?"
    ));
    let second = first
        && confirmer.confirm(&format!(
            "Confirm again: irreversibly wipe all production data for '{domain}'?"
        ));

    if !second {
        return Err(DatabaseError::CleanupNotConfirmed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clodo_core::traits::NonInteractiveConfirmer;

    struct AlwaysYes;
    impl Confirmer for AlwaysYes {
        fn confirm(&self, _prompt: &str) -> bool {
            true
        }
    }

    struct AlwaysNo;
    impl Confirmer for AlwaysNo {
        fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    #[test]
    fn full_cleanup_on_production_is_refused_non_interactively() {
        let err = authorize_cleanup(CleanupMode::Full, Environment::Production, &NonInteractiveConfirmer, false, "api.example.com")
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NonInteractiveFullCleanup));
    }

    #[test]
    fn full_cleanup_on_production_requires_double_confirmation() {
        let err = authorize_cleanup(CleanupMode::Full, Environment::Production, &AlwaysNo, true, "api.example.com")
            .unwrap_err();
        assert!(matches!(err, DatabaseError::CleanupNotConfirmed));

        authorize_cleanup(CleanupMode::Full, Environment::Production, &AlwaysYes, true, "api.example.com").unwrap();
    }

    #[test]
    fn partial_cleanup_on_production_needs_no_confirmation() {
        authorize_cleanup(CleanupMode::Partial, Environment::Production, &NonInteractiveConfirmer, false, "api.example.com")
            .unwrap();
    }

    #[test]
    fn full_cleanup_outside_production_needs_no_confirmation() {
        authorize_cleanup(CleanupMode::Full, Environment::Staging, &NonInteractiveConfirmer, false, "api.example.com").unwrap();
    }
}
