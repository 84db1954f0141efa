//! Retry policy
//!
//! Wraps one request/response round trip. Transport faults and `Retriable`
//! classifications are retried with exponential backoff up to a fixed
//! number of attempts; anything else is returned as-is.

use crate::classify::{Classification, RetryReason};
use crate::config::HttpSettings;
use crate::error::{Error, Result};
use crate::redact;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Desired page size of one stream
///
/// Only ever shrinks. The shrunk value is kept for the rest of the run.
#[derive(Debug)]
pub struct PageSizeState {
    current: AtomicU32,
}

impl PageSizeState {
    /// Start at `size` (raised to 1 if zero)
    pub fn new(size: u32) -> Self {
        Self {
            current: AtomicU32::new(size.max(1)),
        }
    }

    /// Current page size
    pub fn current(&self) -> u32 {
        self.current.load(Ordering::Relaxed)
    }

    /// Halve the page size, never below 1; returns the new value
    pub fn shrink(&self) -> u32 {
        let previous = self
            .current
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |size| {
                Some((size / 2).max(1))
            })
            .unwrap_or(1);
        (previous / 2).max(1)
    }
}

impl Default for PageSizeState {
    fn default() -> Self {
        Self::new(crate::stream::DEFAULT_PAGE_SIZE)
    }
}

/// Bounded exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay after the first failure
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Policy from the `http` block of the tap configuration
    pub fn from_settings(settings: &HttpSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: settings.initial_backoff(),
            max_backoff: settings.max_backoff(),
        }
    }

    /// Calculate backoff delay for a given attempt (0-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(
            self.initial_backoff.saturating_mul(factor),
            self.max_backoff,
        )
    }

    /// Run `attempt` until it yields a non-retriable outcome
    ///
    /// `attempt` receives the page size to request. A `RetryReason::Server`
    /// outcome halves `page_size` before the next attempt. Once the budget
    /// is spent the last reason is escalated to a fatal error.
    pub async fn execute<F, Fut>(&self, page_size: &PageSizeState, mut attempt: F) -> Result<Classification>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Classification>>,
    {
        let mut last_reason = None;

        for n in 0..self.max_attempts {
            let reason = match attempt(page_size.current()).await {
                Ok(Classification::Retriable(reason)) => reason,
                Err(e) if e.is_retryable() => {
                    RetryReason::Transport(redact::truncate(&e.to_string(), redact::EXCERPT_LIMIT))
                }
                other => return other,
            };

            if reason.is_overload() {
                let size = page_size.shrink();
                debug!(page_size = size, "Shrinking page size after server error");
            }

            if n + 1 < self.max_attempts {
                let delay = self.calculate_backoff(n);
                warn!(
                    "{}, attempt {}/{}, retrying in {:?}",
                    reason,
                    n + 1,
                    self.max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            last_reason = Some(reason);
        }

        Err(match last_reason {
            Some(reason) => reason.into_error(self.max_attempts),
            None => Error::MaxRetriesExceeded {
                max_attempts: self.max_attempts,
                message: "no attempt was made".to_string(),
            },
        })
    }
}
