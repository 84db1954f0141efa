//! Auth configuration types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grant type sent by the secure-token flow
pub const SECURE_TOKEN_GRANT: &str =
    "urn:demandware:params:oauth:grant-type:client-id:dwsid:dwsecuretoken";

/// Which OAuth flow a stream needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantFlow {
    /// Account Manager client credentials
    #[default]
    ClientCredentials,
    /// Business Manager user grant against the instance
    SecureToken,
}

impl std::fmt::Display for GrantFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantFlow::ClientCredentials => f.write_str("client_credentials"),
            GrantFlow::SecureToken => f.write_str("secure_token"),
        }
    }
}

/// Authentication configuration for one provider
#[derive(Clone)]
pub enum AuthConfig {
    /// `grant_type=client_credentials` with HTTP Basic `client_id:client_secret`
    ClientCredentials {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
    },

    /// Secure-token grant with Basic `username:password:client_secret`
    SecureToken {
        /// Instance token endpoint URL (without query)
        token_url: String,
        /// Client ID, sent as a query parameter
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Business Manager login
        username: String,
        /// Business Manager access key
        password: String,
    },
}

impl AuthConfig {
    /// The flow this config drives
    pub fn flow(&self) -> GrantFlow {
        match self {
            AuthConfig::ClientCredentials { .. } => GrantFlow::ClientCredentials,
            AuthConfig::SecureToken { .. } => GrantFlow::SecureToken,
        }
    }

    /// Token endpoint URL
    pub fn token_url(&self) -> &str {
        match self {
            AuthConfig::ClientCredentials { token_url, .. }
            | AuthConfig::SecureToken { token_url, .. } => token_url,
        }
    }

    /// Secrets that must never reach logs
    pub(crate) fn secrets(&self) -> Vec<&str> {
        match self {
            AuthConfig::ClientCredentials { client_secret, .. } => vec![client_secret.as_str()],
            AuthConfig::SecureToken {
                client_secret,
                password,
                ..
            } => vec![client_secret.as_str(), password.as_str()],
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::ClientCredentials {
                token_url,
                client_id,
                ..
            } => f
                .debug_struct("ClientCredentials")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            AuthConfig::SecureToken {
                token_url,
                client_id,
                username,
                ..
            } => f
                .debug_struct("SecureToken")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Cached bearer credential
#[derive(Clone)]
pub struct Credential {
    /// The access token
    pub access_token: String,
    /// When the token expires; `None` means it never does
    pub expires_at: Option<DateTime<Utc>>,
    /// When the token was obtained
    pub refreshed_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential obtained now
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            refreshed_at: Utc::now(),
        }
    }

    /// Create a credential that expires N seconds from now
    pub fn expires_in(access_token: impl Into<String>, seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            access_token: access_token.into(),
            expires_at: Some(now + chrono::Duration::seconds(seconds)),
            refreshed_at: now,
        }
    }

    /// Expired once `now >= expires_at`
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &crate::redact::MASK)
            .field("expires_at", &self.expires_at)
            .field("refreshed_at", &self.refreshed_at)
            .finish()
    }
}

/// Token endpoint response body
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}
