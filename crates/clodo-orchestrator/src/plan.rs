//! Partitions a domain set into parallel batches (spec.md §4.B
//! "Planning"): batches of size `parallelism`, default 3. The next
//! batch only starts once every member of the current one reaches
//! `verify` with outcome `ok`, or the whole portfolio aborts.

use clodo_core::domain::Domain;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub batches: Vec<Vec<Domain>>,
}

impl Plan {
    pub fn domain_count(&self) -> usize {
        self.batches.iter().map(|b| b.len()).sum()
    }
}

pub fn plan_deployment(domains: Vec<Domain>, parallelism: usize) -> Plan {
    let parallelism = parallelism.max(1);
    let batches = domains.chunks(parallelism).map(|chunk| chunk.to_vec()).collect();
    Plan { batches }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clodo_core::domain::Environment;

    #[test]
    fn partitions_domains_into_batches_of_parallelism() {
        let domains = (0..7)
            .map(|i| Domain::new(format!("d{i}.example.com"), Environment::Production, "portfolio"))
            .collect();
        let plan = plan_deployment(domains, 3);
        assert_eq!(plan.batches.len(), 3);
        assert_eq!(plan.batches[0].len(), 3);
        assert_eq!(plan.batches[2].len(), 1);
        assert_eq!(plan.domain_count(), 7);
    }

    #[test]
    fn zero_parallelism_is_treated_as_one() {
        let domains = vec![Domain::new("a.example.com", Environment::Production, "p")];
        let plan = plan_deployment(domains, 0);
        assert_eq!(plan.batches.len(), 1);
        assert_eq!(plan.batches[0].len(), 1);
    }
}
