//! Domain and portfolio identity types.
//!
//! A [`Domain`] has an immutable identity (name + environment) and a
//! mutable config pointer owned by `clodo-router`; this crate only
//! carries the identity half.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment environment tag. Ordering matters for default routing
/// policy lookups in `clodo-router`, not for any numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// A fully qualified domain, immutable identity, scoped to one
/// [`Portfolio`]. Config is looked up by `(name, environment)` in
/// `clodo-router`, never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub environment: Environment,
    pub portfolio: String,
}

impl Domain {
    pub fn new(name: impl Into<String>, environment: Environment, portfolio: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment,
            portfolio: portfolio.into(),
        }
    }

    /// Key used by the per-`(domain, env)` lock in the state store and
    /// by the router's policy cache.
    pub fn key(&self) -> String {
        format!("{}::{}", self.name, self.environment.as_str())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.environment)
    }
}

/// A set of domains deployed together under one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub name: String,
    pub domains: Vec<Domain>,
}

impl Portfolio {
    pub fn new(name: impl Into<String>, domains: Vec<Domain>) -> Self {
        Self {
            name: name.into(),
            domains,
        }
    }

    /// Validates the invariants from spec.md §4.I: at least one domain,
    /// all domain names non-empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.domains.is_empty() {
            return Err("portfolio must contain at least one domain".to_string());
        }
        for domain in &self.domains {
            if domain.name.trim().is_empty() {
                return Err("domain name must not be empty".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_round_trips_through_str() {
        for env in [Environment::Development, Environment::Staging, Environment::Production] {
            let parsed: Environment = env.as_str().parse().unwrap();
            assert_eq!(parsed, env);
        }
    }

    #[test]
    fn empty_portfolio_fails_validation() {
        let portfolio = Portfolio::new("empty", vec![]);
        assert!(portfolio.validate().is_err());
    }

    #[test]
    fn portfolio_with_blank_domain_name_fails_validation() {
        let portfolio = Portfolio::new(
            "p",
            vec![Domain::new("  ", Environment::Production, "p")],
        );
        assert!(portfolio.validate().is_err());
    }

    #[test]
    fn domain_key_is_stable_per_name_and_environment() {
        let a = Domain::new("api.example.com", Environment::Production, "p");
        let b = Domain::new("api.example.com", Environment::Production, "other-portfolio");
        assert_eq!(a.key(), b.key());
    }
}
