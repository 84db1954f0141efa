//! Authentication module
//!
//! Supports the two OCAPI grant flows: account-level client credentials and
//! the tenant-scoped Business Manager secure-token grant.
//!
//! The `TokenProvider` caches one `Credential` and refreshes it when it
//! expires. `TokenRegistry` builds exactly one provider per (tenant, flow)
//! at startup and hands out shared handles to every stream that needs it.

mod provider;
mod registry;
mod types;

pub use provider::{CredentialSource, TokenProvider};
pub use registry::TokenRegistry;
pub use types::{AuthConfig, Credential, GrantFlow, SECURE_TOKEN_GRANT};

#[cfg(test)]
mod tests;
