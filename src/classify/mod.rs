//! Response classification module
//!
//! Turns a raw OCAPI response into one of five outcomes the pagination
//! driver acts on.
//!
//! # Decision order
//!
//! 1. Status declared empty by the stream (404, sometimes 204) → `Empty`
//! 2. Retry status or 5xx → `Retriable`
//! 3. Unparseable body → `Retriable` on 2xx, `Fatal` otherwise
//! 4. Error status → stream refinement of the fault, else `Fatal`
//! 5. `Success` with the extracted records and next cursor

mod classifier;
mod types;

pub use classifier::{PagePosition, ResponseClassifier};
pub use types::{Classification, Fault, RetryReason};

#[cfg(test)]
mod tests;
