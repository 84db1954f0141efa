//! Token provider implementation
//!
//! Acquires bearer credentials and refreshes them on expiry. Refresh is
//! guarded by a write lock with a second expiry check, so callers racing on
//! an expired token share a single token request.

use super::types::{AuthConfig, Credential, GrantFlow, TokenResponse, SECURE_TOKEN_GRANT};
use crate::error::{Error, Result};
use crate::redact;
use async_trait::async_trait;
use base64::Engine as _;
use chrono::Utc;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Anything that can hand out a bearer token for a request
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// A currently valid access token
    async fn access_token(&self) -> Result<String>;
}

/// Token provider for one (tenant, flow) pair
pub struct TokenProvider {
    /// Tenant the provider belongs to
    tenant: String,
    /// Auth configuration
    config: AuthConfig,
    /// Lifetime used when the server omits `expires_in`
    default_expiration: Option<i64>,
    /// Cached credential
    credential: Arc<RwLock<Option<Credential>>>,
    /// HTTP client for token requests
    http_client: Client,
    /// Number of successful token requests
    refreshes: AtomicU64,
}

impl TokenProvider {
    /// Create a new provider with its own HTTP client
    pub fn new(tenant: impl Into<String>, config: AuthConfig) -> Self {
        Self::with_client(tenant, config, Client::new())
    }

    /// Create a provider sharing an existing HTTP client
    pub fn with_client(tenant: impl Into<String>, config: AuthConfig, http_client: Client) -> Self {
        Self {
            tenant: tenant.into(),
            config,
            default_expiration: None,
            credential: Arc::new(RwLock::new(None)),
            http_client,
            refreshes: AtomicU64::new(0),
        }
    }

    /// Lifetime to assume when the token response has no `expires_in`
    #[must_use]
    pub fn with_default_expiration(mut self, seconds: Option<i64>) -> Self {
        self.default_expiration = seconds;
        self
    }

    /// Tenant this provider serves
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Flow this provider drives
    pub fn flow(&self) -> GrantFlow {
        self.config.flow()
    }

    /// How many times a token has been fetched
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Get a valid credential, refreshing if absent or expired
    pub async fn get_token(&self) -> Result<Credential> {
        {
            let cached = self.credential.read().await;
            if let Some(credential) = cached.as_ref() {
                if !credential.is_expired() {
                    return Ok(credential.clone());
                }
            }
        }

        let mut cached = self.credential.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(credential) = cached.as_ref() {
            if !credential.is_expired() {
                return Ok(credential.clone());
            }
        }

        let fresh = self.fetch_credential().await?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    /// Seed the cache, bypassing the token endpoint
    pub async fn prime(&self, credential: Credential) {
        *self.credential.write().await = Some(credential);
    }

    /// Request a new credential from the token endpoint
    async fn fetch_credential(&self) -> Result<Credential> {
        let request = match &self.config {
            AuthConfig::ClientCredentials {
                token_url,
                client_id,
                client_secret,
            } => self
                .http_client
                .post(token_url)
                .basic_auth(client_id, Some(client_secret))
                .form(&[("grant_type", "client_credentials")]),

            AuthConfig::SecureToken {
                token_url,
                client_id,
                client_secret,
                username,
                password,
            } => {
                let basic = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}:{client_secret}"));
                self.http_client
                    .post(token_url)
                    .query(&[("client_id", client_id)])
                    .header(reqwest::header::AUTHORIZATION, format!("Basic {basic}"))
                    .form(&[("grant_type", SECURE_TOKEN_GRANT)])
            }
        };

        debug!(
            tenant = %self.tenant,
            flow = %self.flow(),
            "Requesting access token from {}",
            self.config.token_url()
        );

        let response = request.send().await.map_err(|e| {
            Error::auth(format!(
                "{} token request to {} failed: {e}",
                self.flow(),
                self.config.token_url()
            ))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::auth(format!("Failed to read {} token response: {e}", self.flow()))
        })?;

        if !status.is_success() {
            return Err(Error::auth(format!(
                "{} token request returned HTTP {}: {}",
                self.flow(),
                status.as_u16(),
                redact::excerpt(&body, &self.config.secrets())
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            Error::auth(format!("Invalid {} token response: {e}", self.flow()))
        })?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::auth(format!("{} token response has no access_token", self.flow())))?;

        let now = Utc::now();
        let expires_at = parsed
            .expires_in
            .or(self.default_expiration)
            .map(|secs| now + chrono::Duration::seconds(secs));

        self.refreshes.fetch_add(1, Ordering::SeqCst);
        info!(
            tenant = %self.tenant,
            flow = %self.flow(),
            expires_at = ?expires_at,
            "Obtained access token"
        );

        Ok(Credential {
            access_token,
            expires_at,
            refreshed_at: now,
        })
    }
}

#[async_trait]
impl CredentialSource for TokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.get_token().await?.access_token)
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("tenant", &self.tenant)
            .field("config", &self.config)
            .field("refreshes", &self.refresh_count())
            .finish_non_exhaustive()
    }
}
