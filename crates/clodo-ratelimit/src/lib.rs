//! Rate-Limited API Client (component E): per-class sliding-window
//! quotas, priority-ordered queueing and exponential backoff wrapped
//! around any [`clodo_core::UpstreamApi`] implementation.

mod backoff;
mod class;
mod client;
mod queue;
mod window;

pub use class::{ApiClass, ClassLimits, Priority};
pub use client::RateLimitedClient;
