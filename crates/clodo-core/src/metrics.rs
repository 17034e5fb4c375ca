//! Process-scoped orchestration metrics: phase counters and outbound
//! call counters. Trimmed down from the teacher's `EnterpriseMetrics`
//! (`aion-core::metrics`) to the counters this orchestrator actually
//! emits — no GPU/business metrics, just phases, outcomes and API
//! calls, since that's all a deployment run produces.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct OrchestratorMetrics {
    phases_started: AtomicU64,
    phases_ok: AtomicU64,
    phases_failed: AtomicU64,
    rollback_actions_executed: AtomicU64,
    api_calls_by_class: DashMap<String, u64>,
}

impl OrchestratorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_phase_start(&self) {
        self.phases_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_phase_outcome(&self, ok: bool) {
        if ok {
            self.phases_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.phases_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rollback_action(&self) {
        self.rollback_actions_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_call(&self, api_class: &str) {
        *self.api_calls_by_class.entry(api_class.to_string()).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            phases_started: self.phases_started.load(Ordering::Relaxed),
            phases_ok: self.phases_ok.load(Ordering::Relaxed),
            phases_failed: self.phases_failed.load(Ordering::Relaxed),
            rollback_actions_executed: self.rollback_actions_executed.load(Ordering::Relaxed),
            api_calls_by_class: self
                .api_calls_by_class
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub phases_started: u64,
    pub phases_ok: u64,
    pub phases_failed: u64,
    pub rollback_actions_executed: u64,
    pub api_calls_by_class: std::collections::HashMap<String, u64>,
}
