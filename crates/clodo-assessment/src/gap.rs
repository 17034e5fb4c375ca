//! Gap analysis: comparing a [`CapabilityManifest`](crate::manifest::CapabilityManifest)
//! against what was discovered and what the caller supplied, producing
//! one [`Gap`] per unmet or partially-met capability.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapStatus {
    FullyConfigured,
    PartiallyConfigured,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GapPriority {
    Warning,
    Low,
    Medium,
    High,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub capability: String,
    pub status: GapStatus,
    pub priority: GapPriority,
    /// Whether deployment can proceed despite this gap (spec.md §4.A.5:
    /// a blocked gap is never deployable; a missing or warning gap may
    /// still allow deployment to continue).
    pub deployable: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub gaps: Vec<Gap>,
}

impl GapAnalysis {
    pub fn push(&mut self, gap: Gap) {
        self.gaps.push(gap);
    }

    pub fn blocked(&self) -> impl Iterator<Item = &Gap> {
        self.gaps.iter().filter(|g| g.priority == GapPriority::Blocked)
    }

    pub fn missing(&self) -> impl Iterator<Item = &Gap> {
        self.gaps.iter().filter(|g| g.status == GapStatus::Missing)
    }

    pub fn high_priority_count(&self) -> usize {
        self.gaps.iter().filter(|g| g.priority == GapPriority::High).count()
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked().count()
    }

    /// True when no gap blocks deployment, i.e. nothing is priority
    /// `Blocked`.
    pub fn is_deployable(&self) -> bool {
        self.gaps.iter().all(|g| g.deployable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap(priority: GapPriority, deployable: bool) -> Gap {
        Gap {
            capability: "database".into(),
            status: GapStatus::Missing,
            priority,
            deployable,
            reason: None,
        }
    }

    #[test]
    fn deployable_is_false_when_any_gap_blocks() {
        let mut analysis = GapAnalysis::default();
        analysis.push(gap(GapPriority::High, true));
        analysis.push(gap(GapPriority::Blocked, false));
        assert!(!analysis.is_deployable());
        assert_eq!(analysis.blocked_count(), 1);
    }

    #[test]
    fn deployable_is_true_with_only_warnings_and_missing() {
        let mut analysis = GapAnalysis::default();
        analysis.push(gap(GapPriority::Warning, true));
        analysis.push(gap(GapPriority::High, true));
        assert!(analysis.is_deployable());
    }
}
