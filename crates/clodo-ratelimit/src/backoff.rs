//! Exponential backoff with jitter for quota-exhausted retries
//! (spec.md §4.E step 3): `delay = min(base * 2^attempt, maxDelay) + U(0, 1s)`.

use crate::class::ClassLimits;
use rand::Rng;
use std::time::Duration;

pub fn delay_for_attempt(limits: &ClassLimits, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let base_ms = limits.base_delay.as_millis() as u64;
    let exponential_ms = base_ms.saturating_mul(factor);
    let capped_ms = exponential_ms.min(limits.max_delay.as_millis() as u64);
    let jitter_ms: u64 = rand::thread_rng().gen_range(0..1000);
    Duration::from_millis(capped_ms.saturating_add(jitter_ms))
}
