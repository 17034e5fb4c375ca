//! Sliding per-minute/per-hour window counters for one API class.

use crate::class::{ClassLimits, MIN_INTER_REQUEST_SPACING};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct WindowState {
    minute_start: Instant,
    minute_count: u32,
    hour_start: Instant,
    hour_count: u32,
    last_dispatch: Option<Instant>,
}

impl WindowState {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            minute_start: now,
            minute_count: 0,
            hour_start: now,
            hour_count: 0,
            last_dispatch: None,
        }
    }

    fn reset_elapsed_windows(&mut self, now: Instant) {
        if now.duration_since(self.minute_start) >= Duration::from_secs(60) {
            self.minute_start = now;
            self.minute_count = 0;
        }
        if now.duration_since(self.hour_start) >= Duration::from_secs(3600) {
            self.hour_start = now;
            self.hour_count = 0;
        }
    }
}

pub struct WindowCounter {
    state: Mutex<WindowState>,
    limits: ClassLimits,
}

impl WindowCounter {
    pub fn new(limits: ClassLimits) -> Self {
        Self {
            state: Mutex::new(WindowState::new()),
            limits,
        }
    }

    /// Checks capacity and inter-request spacing without mutating the
    /// window counts (spec.md §4.E step 1: "compute counter ... if at
    /// or above the limit, queue"). On success, records the dispatch
    /// timestamp so the spacing check applies to the next caller too.
    pub async fn try_reserve_slot(&self) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.reset_elapsed_windows(now);

        if state.minute_count >= self.limits.per_minute || state.hour_count >= self.limits.per_hour {
            return false;
        }
        if let Some(last) = state.last_dispatch {
            if now.duration_since(last) < MIN_INTER_REQUEST_SPACING {
                return false;
            }
        }
        state.last_dispatch = Some(now);
        true
    }

    /// Counts a completed call, success or failure (step 2: "on reply,
    /// increment counters").
    pub async fn record_response(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.reset_elapsed_windows(now);
        state.minute_count += 1;
        state.hour_count += 1;
    }

    #[cfg(test)]
    pub async fn counts(&self) -> (u32, u32) {
        let state = self.state.lock().await;
        (state.minute_count, state.hour_count)
    }
}
