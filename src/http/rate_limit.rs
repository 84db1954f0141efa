//! Client-side request pacing
//!
//! OCAPI enforces per-client quotas and answers 429 once a client goes over
//! them. A governor token bucket in front of the transport keeps a run under
//! the configured rate, so quota responses stay the exception the retry
//! policy has to absorb.

use crate::config::HttpSettings;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

type DirectLimiter = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Request rate cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed back to back before pacing starts
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::per_second(10)
    }
}

impl RateLimiterConfig {
    /// Cap with an explicit burst
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Cap whose burst equals the per-second rate
    pub fn per_second(requests_per_second: u32) -> Self {
        Self::new(requests_per_second, requests_per_second)
    }

    /// Override the burst
    #[must_use]
    pub fn with_burst(mut self, burst_size: u32) -> Self {
        self.burst_size = burst_size;
        self
    }

    /// Cap from the `http` block of the tap configuration, if one is set
    pub fn from_settings(settings: &HttpSettings) -> Option<Self> {
        settings.requests_per_second.map(Self::per_second)
    }

    fn quota(&self) -> Quota {
        Quota::per_second(at_least_one(self.requests_per_second))
            .allow_burst(at_least_one(self.burst_size))
    }
}

fn at_least_one(n: u32) -> NonZeroU32 {
    NonZeroU32::MIN.saturating_add(n.saturating_sub(1))
}

/// Token bucket shared by every request of a run
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<DirectLimiter>,
    delayed: Arc<AtomicU64>,
}

impl RateLimiter {
    /// Create a limiter; zero rates are raised to one
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            limiter: Arc::new(Governor::direct(config.quota())),
            delayed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Take a permit, sleeping until one is available
    pub async fn wait(&self) {
        if self.limiter.check().is_ok() {
            return;
        }
        self.delayed.fetch_add(1, Ordering::Relaxed);
        debug!("Request rate cap reached, pacing");
        self.limiter.until_ready().await;
    }

    /// Take a permit if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Number of requests that had to wait for a permit
    pub fn delayed_count(&self) -> u64 {
        self.delayed.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("delayed", &self.delayed_count())
            .finish_non_exhaustive()
    }
}
