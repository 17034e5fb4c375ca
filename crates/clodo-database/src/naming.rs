//! Per-`(domain, env)` database naming (spec.md §4.J). The upstream
//! D1 platform only accepts lowercase alphanumerics and hyphens, so a
//! domain's dots become hyphens and the environment is appended as a
//! suffix — this keeps the name stable and reversible enough to be
//! useful in log output without a lookup table.

use clodo_core::domain::Environment;

pub fn database_name(domain: &str, environment: Environment) -> String {
    let sanitized: String = domain
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{sanitized}-{}", environment.as_str())
}
