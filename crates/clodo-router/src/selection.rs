//! Domain selection (spec.md §4.I): pick a working set of domains out
//! of the discovered/configured list.

use crate::error::RouterError;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum Selection {
    /// Exactly the named domains, in the order given.
    Specific(Vec<String>),
    /// Every configured domain.
    All,
    /// Look up the environment's entry in an `env -> domain list` map.
    EnvMap(String),
    /// The first configured domain only.
    First,
}

pub fn select_domains(
    available: &[String],
    selection: &Selection,
    env_map: &HashMap<String, Vec<String>>,
) -> Result<Vec<String>, RouterError> {
    if available.is_empty() {
        return Err(RouterError::NoDomainsConfigured);
    }

    match selection {
        Selection::Specific(names) => {
            let matched: Vec<String> = names
                .iter()
                .filter(|name| available.contains(name))
                .cloned()
                .collect();
            if matched.is_empty() {
                return Err(RouterError::SelectionNotFound(names.join(",")));
            }
            Ok(matched)
        }
        Selection::All => Ok(available.to_vec()),
        Selection::EnvMap(env) => {
            let matched = env_map
                .get(env)
                .cloned()
                .ok_or_else(|| RouterError::SelectionNotFound(env.clone()))?;
            let matched: Vec<String> = matched.into_iter().filter(|name| available.contains(name)).collect();
            if matched.is_empty() {
                return Err(RouterError::SelectionNotFound(env.clone()));
            }
            Ok(matched)
        }
        Selection::First => Ok(vec![available[0].clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> Vec<String> {
        vec!["a.example.com".to_string(), "b.example.com".to_string()]
    }

    #[test]
    fn specific_filters_to_available_domains_only() {
        let selected = select_domains(
            &available(),
            &Selection::Specific(vec!["b.example.com".to_string(), "unknown.example.com".to_string()]),
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(selected, vec!["b.example.com".to_string()]);
    }

    #[test]
    fn all_returns_every_available_domain() {
        let selected = select_domains(&available(), &Selection::All, &HashMap::new()).unwrap();
        assert_eq!(selected, available());
    }

    #[test]
    fn first_returns_only_the_first_domain() {
        let selected = select_domains(&available(), &Selection::First, &HashMap::new()).unwrap();
        assert_eq!(selected, vec!["a.example.com".to_string()]);
    }

    #[test]
    fn env_map_looks_up_the_environment_key() {
        let mut env_map = HashMap::new();
        env_map.insert("production".to_string(), vec!["a.example.com".to_string()]);
        let selected = select_domains(&available(), &Selection::EnvMap("production".to_string()), &env_map).unwrap();
        assert_eq!(selected, vec!["a.example.com".to_string()]);
    }

    #[test]
    fn empty_available_list_is_rejected() {
        let err = select_domains(&[], &Selection::All, &HashMap::new()).unwrap_err();
        assert!(matches!(err, RouterError::NoDomainsConfigured));
    }

    #[test]
    fn unknown_env_map_key_fails() {
        let err = select_domains(&available(), &Selection::EnvMap("staging".to_string()), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, RouterError::SelectionNotFound(_)));
    }
}
