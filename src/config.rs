//! Tap configuration
//!
//! Settings consumed from the `--config` JSON file. The extractor never
//! writes these back; secrets stay in memory only.

use crate::error::{Error, Result};
use crate::types::OptionStringExt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Account-level OAuth endpoint for the client-credentials grant
pub const DEFAULT_AUTH_URL: &str = "https://account.demandware.com/dw/oauth2/access_token";

/// OCAPI version used when none is configured
pub const DEFAULT_API_VERSION: &str = "v23_1";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Instance short code, e.g. `zzrf-001`
    pub domain: String,

    /// One site id or a comma-separated list of them
    #[serde(default)]
    pub site_id: Option<String>,

    /// API client id
    pub client_id: String,

    /// API client secret
    #[serde(skip_serializing)]
    pub client_secret: String,

    /// Business Manager user for the secure-token grant
    #[serde(default)]
    pub username: Option<String>,

    /// Business Manager access key for the secure-token grant
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Lower bound for incremental streams when no state exists
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// Explicit order numbers to fetch instead of a date-range search
    #[serde(default)]
    pub order_ids: Vec<String>,

    /// Page size for offset-paged GET resources
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Page size for order search
    #[serde(default = "default_order_page_size")]
    pub order_page_size: u32,

    /// Optional User-Agent; also enables `Accept: application/json`
    #[serde(default)]
    pub user_agent: Option<String>,

    /// OCAPI version segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Override for the instance host (proxies, tests)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Override for the account-level token endpoint
    #[serde(default)]
    pub auth_url: Option<String>,

    /// Token lifetime assumed when the server omits `expires_in`
    #[serde(default)]
    pub token_expiration_secs: Option<i64>,

    /// Statuses retried on top of 5xx
    #[serde(default = "default_extra_retry_statuses")]
    pub extra_retry_statuses: Vec<u16>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,
}

fn default_order_page_size() -> u32 {
    200
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_extra_retry_statuses() -> Vec<u16> {
    vec![429]
}

impl TapConfig {
    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("domain", &self.domain),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        if self.order_page_size == 0 {
            return Err(Error::invalid_value("order_page_size", "must be at least 1"));
        }
        if self.page_size == Some(0) {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.http.max_attempts == 0 {
            return Err(Error::invalid_value("http.max_attempts", "must be at least 1"));
        }

        Ok(())
    }

    /// Site ids from the comma-separated `site_id` setting
    pub fn site_ids(&self) -> Vec<String> {
        self.site_id
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Instance host without a trailing slash
    pub fn host(&self) -> String {
        match self.base_url.clone().none_if_empty() {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.dx.commercecloud.salesforce.com", self.domain),
        }
    }

    /// Account-level token endpoint
    pub fn auth_url(&self) -> String {
        self.auth_url
            .clone()
            .none_if_empty()
            .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string())
    }

    /// Business Manager credentials, when both halves are present
    pub fn business_manager_user(&self) -> Option<(String, String)> {
        let username = self.username.clone().none_if_empty()?;
        let password = self.password.clone().none_if_empty()?;
        Some((username, password))
    }

    /// Start date floor, defaulting to the Unix epoch
    pub fn start_date_or_epoch(&self) -> DateTime<Utc> {
        self.start_date.unwrap_or(DateTime::UNIX_EPOCH)
    }
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request before a retriable fault becomes fatal
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff cap in seconds
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Client-side request rate cap
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            requests_per_second: None,
        }
    }
}

impl HttpSettings {
    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Initial backoff as a Duration
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Backoff cap as a Duration
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "domain": "zzrf-001",
            "client_id": "cid",
            "client_secret": "secret"
        })
    }

    #[test]
    fn test_defaults() {
        let config = TapConfig::from_json(&minimal().to_string()).unwrap();
        assert_eq!(config.order_page_size, 200);
        assert_eq!(config.api_version, "v23_1");
        assert_eq!(config.extra_retry_statuses, vec![429]);
        assert_eq!(config.http.max_attempts, 10);
        assert_eq!(config.host(), "https://zzrf-001.dx.commercecloud.salesforce.com");
        assert_eq!(config.auth_url(), DEFAULT_AUTH_URL);
        assert!(config.site_ids().is_empty());
        assert!(config.business_manager_user().is_none());
    }

    #[test]
    fn test_missing_field() {
        let mut value = minimal();
        value["client_secret"] = json!("");
        let err = TapConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field } if field == "client_secret"));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut value = minimal();
        value["order_page_size"] = json!(0);
        assert!(TapConfig::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn test_site_ids_split() {
        let mut value = minimal();
        value["site_id"] = json!("RefArch, RefArchGlobal,,");
        let config = TapConfig::from_json(&value.to_string()).unwrap();
        assert_eq!(config.site_ids(), vec!["RefArch", "RefArchGlobal"]);
    }

    #[test]
    fn test_base_url_override() {
        let mut value = minimal();
        value["base_url"] = json!("http://127.0.0.1:9000/");
        let config = TapConfig::from_json(&value.to_string()).unwrap();
        assert_eq!(config.host(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_business_manager_user_requires_both() {
        let mut value = minimal();
        value["username"] = json!("admin");
        let config = TapConfig::from_json(&value.to_string()).unwrap();
        assert!(config.business_manager_user().is_none());

        value["password"] = json!("key");
        let config = TapConfig::from_json(&value.to_string()).unwrap();
        assert_eq!(
            config.business_manager_user(),
            Some(("admin".to_string(), "key".to_string()))
        );
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut value = minimal();
        value["password"] = json!("key");
        let config = TapConfig::from_json(&value.to_string()).unwrap();
        let out = serde_json::to_string(&config).unwrap();
        assert!(!out.contains("secret"));
        assert!(!out.contains("\"key\""));
    }
}
