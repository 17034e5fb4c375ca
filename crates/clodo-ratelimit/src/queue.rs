//! Priority-ordered admission queue: FIFO within a priority class,
//! high before normal before low across classes (spec.md §4.E step 1).
//!
//! Implemented as three ticket lanes rather than a single heap so
//! "am I at the front" is a cheap peek per lane instead of a
//! comparator over a mixed-priority structure.

use crate::class::Priority;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(15);

#[derive(Default)]
struct Lanes {
    high: VecDeque<u64>,
    normal: VecDeque<u64>,
    low: VecDeque<u64>,
}

pub struct AdmissionQueue {
    lanes: Mutex<Lanes>,
    next_ticket: AtomicU64,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self {
            lanes: Mutex::new(Lanes::default()),
            next_ticket: AtomicU64::new(0),
        }
    }

    fn join(&self, lanes: &mut Lanes, priority: Priority) -> u64 {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        match priority {
            Priority::High => lanes.high.push_back(ticket),
            Priority::Normal => lanes.normal.push_back(ticket),
            Priority::Low => lanes.low.push_back(ticket),
        }
        ticket
    }

    fn is_front(lanes: &Lanes, priority: Priority, ticket: u64) -> bool {
        match priority {
            Priority::High => lanes.high.front() == Some(&ticket),
            Priority::Normal => lanes.high.is_empty() && lanes.normal.front() == Some(&ticket),
            Priority::Low => lanes.high.is_empty() && lanes.normal.is_empty() && lanes.low.front() == Some(&ticket),
        }
    }

    fn leave(lanes: &mut Lanes, priority: Priority) {
        match priority {
            Priority::High => lanes.high.pop_front(),
            Priority::Normal => lanes.normal.pop_front(),
            Priority::Low => lanes.low.pop_front(),
        };
    }

    /// Blocks until this caller is the head of its priority lane (and
    /// all higher-priority lanes are empty) *and* `try_admit` grants a
    /// slot, then releases the ticket. `try_admit` is polled, not
    /// pushed to, so it can check window-counter capacity without this
    /// queue knowing anything about rate limits.
    pub async fn acquire<F, Fut>(&self, priority: Priority, mut try_admit: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let ticket = {
            let mut lanes = self.lanes.lock().await;
            self.join(&mut lanes, priority)
        };

        loop {
            let at_front = {
                let lanes = self.lanes.lock().await;
                Self::is_front(&lanes, priority, ticket)
            };

            if at_front && try_admit().await {
                let mut lanes = self.lanes.lock().await;
                Self::leave(&mut lanes, priority);
                return;
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
