//! HTTP client module
//!
//! Transport, retry policy, and rate limiting for OCAPI requests.
//!
//! # Features
//!
//! - **Single-attempt transport**: `HttpClient::send` issues one request and
//!   hands back the raw status and body for classification
//! - **Retry Policy**: bounded exponential backoff with page-size shrinking
//!   on server overload
//! - **Rate Limiting**: token bucket rate limiter using governor

mod client;
mod rate_limit;
mod retry;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RawResponse};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::{PageSizeState, RetryPolicy};
