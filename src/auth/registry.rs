//! Shared token providers
//!
//! One `TokenProvider` per (tenant, flow), created up front and shared via
//! `Arc` so refreshes happen once per expiry window for the whole run.

use super::provider::TokenProvider;
use super::types::{AuthConfig, GrantFlow};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Owner of every token provider in a run
#[derive(Debug, Default)]
pub struct TokenRegistry {
    providers: HashMap<(String, GrantFlow), Arc<TokenProvider>>,
}

impl TokenRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the providers a config can support
    ///
    /// Client credentials are always registered. The secure-token flow is
    /// registered only when a Business Manager user is configured.
    pub fn from_config(config: &TapConfig, http_client: reqwest::Client) -> Self {
        let mut registry = Self::new();
        let tenant = config.domain.clone();

        registry.insert(
            TokenProvider::with_client(
                tenant.clone(),
                AuthConfig::ClientCredentials {
                    token_url: config.auth_url(),
                    client_id: config.client_id.clone(),
                    client_secret: config.client_secret.clone(),
                },
                http_client.clone(),
            )
            .with_default_expiration(config.token_expiration_secs),
        );

        if let Some((username, password)) = config.business_manager_user() {
            registry.insert(
                TokenProvider::with_client(
                    tenant,
                    AuthConfig::SecureToken {
                        token_url: format!("{}/dw/oauth2/access_token", config.host()),
                        client_id: config.client_id.clone(),
                        client_secret: config.client_secret.clone(),
                        username,
                        password,
                    },
                    http_client,
                )
                .with_default_expiration(config.token_expiration_secs),
            );
        }

        registry
    }

    /// Register a provider, replacing any previous one for the same key
    pub fn insert(&mut self, provider: TokenProvider) -> Arc<TokenProvider> {
        let key = (provider.tenant().to_string(), provider.flow());
        debug!(tenant = %key.0, flow = %key.1, "Registering token provider");
        let provider = Arc::new(provider);
        self.providers.insert(key, Arc::clone(&provider));
        provider
    }

    /// Exact lookup
    pub fn get(&self, tenant: &str, flow: GrantFlow) -> Option<Arc<TokenProvider>> {
        self.providers
            .get(&(tenant.to_string(), flow))
            .map(Arc::clone)
    }

    /// Provider for a stream's preferred flow, falling back to client credentials
    pub fn resolve(&self, tenant: &str, preferred: GrantFlow) -> Result<Arc<TokenProvider>> {
        self.get(tenant, preferred)
            .or_else(|| self.get(tenant, GrantFlow::ClientCredentials))
            .ok_or_else(|| {
                Error::auth(format!(
                    "No token provider registered for tenant '{tenant}' ({preferred})"
                ))
            })
    }

    /// All registered providers
    pub fn providers(&self) -> impl Iterator<Item = &Arc<TokenProvider>> {
        self.providers.values()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
