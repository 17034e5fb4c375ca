//! The three independent API classes and their quota/backoff limits
//! (spec.md §4.E).

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiClass {
    Workers,
    D1,
    General,
}

impl ApiClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiClass::Workers => "workers",
            ApiClass::D1 => "d1",
            ApiClass::General => "general",
        }
    }

    pub fn limits(&self) -> ClassLimits {
        match self {
            ApiClass::Workers => ClassLimits {
                per_minute: 100,
                per_hour: 1000,
                base_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(5 * 60),
            },
            ApiClass::D1 => ClassLimits {
                per_minute: 50,
                per_hour: 1000,
                base_delay: Duration::from_secs(2),
                max_delay: Duration::from_secs(10 * 60),
            },
            ApiClass::General => ClassLimits {
                per_minute: 30,
                per_hour: 500,
                base_delay: Duration::from_secs(3),
                max_delay: Duration::from_secs(15 * 60),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClassLimits {
    pub per_minute: u32,
    pub per_hour: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

/// Minimum spacing between dispatched requests within one class,
/// regardless of how much headroom the window counters still have.
pub const MIN_INTER_REQUEST_SPACING: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Normal,
    High,
}
