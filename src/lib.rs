// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy SFCC
//!
//! Incremental extractor for the Salesforce Commerce Cloud Open Commerce
//! API (OCAPI), one tenant per run.
//!
//! ## Features
//!
//! - **Two grant flows**: account-level client credentials and the
//!   Business Manager secure-token grant, each with one shared provider
//! - **Site fan-out**: storefront streams run once per configured site
//! - **Offset, currency and id-list paging** with loop detection and the
//!   10,000-row offset ceiling workaround
//! - **Incremental sync**: per-partition replication bookmarks with floor
//!   markers written before the first fetch
//! - **Bounded retries** with exponential backoff and page-size shrinking
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_sfcc::{
//!     auth::TokenRegistry, config::TapConfig, engine::{PaginationDriver, RunContext},
//!     http::HttpClient, output::JsonLinesSink, state::State, stream,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> solidafy_sfcc::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let client = HttpClient::new()?;
//!     let tokens = Arc::new(TokenRegistry::from_config(&config, client.inner().clone()));
//!     let config = Arc::new(config);
//!     let mut driver = PaginationDriver::new(config.clone(), client, tokens, State::default());
//!
//!     let orders = stream::find("orders")?;
//!     let mut ctx = RunContext::for_stream(&orders, &config);
//!     let mut sink = JsonLinesSink::stdout();
//!     driver.run_stream(&orders, &mut ctx, &mut sink).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PaginationDriver (engine)                    │
//! │  partitions → floor markers → entities → pages → records/state  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │  Request  │   Classify    │   HTTP    │   State     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Client   │ Shop/Data │ Success       │ Transport │ Bookmarks   │
//! │ creds    │ Query     │ Empty         │ Retry     │ Floors      │
//! │ Secure   │ Search    │ Retriable     │ Backoff   │ Atomic save │
//! │ token    │ bodies    │ Fatal         │ Rate limit│             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// Secret masking for logs and error text
pub mod redact;

/// Token providers for both grant flows
pub mod auth;

/// Path template interpolation
pub mod template;

/// Partition routing and entity contexts
pub mod partition;

/// Record extraction from JSON responses
pub mod decode;

/// Cursors and paging modes
pub mod pagination;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Request construction
pub mod request;

/// Response classification
pub mod classify;

/// Stream capabilities and the built-in catalog
pub mod stream;

/// Replication state and persistence
pub mod state;

/// Pagination driver
pub mod engine;

/// JSON-lines message output
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
