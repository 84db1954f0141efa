//! Tests for the auth module

use super::*;
use crate::config::TapConfig;
use crate::error::Error;
use base64::Engine;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_credentials(server: &MockServer) -> AuthConfig {
    AuthConfig::ClientCredentials {
        token_url: format!("{}/dw/oauth2/access_token", server.uri()),
        client_id: "cid".to_string(),
        client_secret: "csecret".to_string(),
    }
}

fn secure_token(server: &MockServer) -> AuthConfig {
    AuthConfig::SecureToken {
        token_url: format!("{}/dw/oauth2/access_token", server.uri()),
        client_id: "cid".to_string(),
        client_secret: "csecret".to_string(),
        username: "admin".to_string(),
        password: "access-key".to_string(),
    }
}

// ============================================================================
// Client Credentials
// ============================================================================

#[tokio::test]
async fn test_client_credentials_fetch() {
    let mock_server = MockServer::start().await;
    let basic = base64::engine::general_purpose::STANDARD.encode("cid:csecret");

    Mock::given(method("POST"))
        .and(path("/dw/oauth2/access_token"))
        .and(header("Authorization", format!("Basic {basic}").as_str()))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "cc-token",
            "expires_in": 1799,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = TokenProvider::new("zzrf-001", client_credentials(&mock_server));
    let credential = provider.get_token().await.unwrap();

    assert_eq!(credential.access_token, "cc-token");
    assert!(credential.expires_at.is_some());
    assert!(!credential.is_expired());

    // Cached: no second request
    let again = provider.get_token().await.unwrap();
    assert_eq!(again.access_token, "cc-token");
    assert_eq!(provider.refresh_count(), 1);
}

#[tokio::test]
async fn test_missing_expiry_is_unbounded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
        .mount(&mock_server)
        .await;

    let provider = TokenProvider::new("zzrf-001", client_credentials(&mock_server));
    let credential = provider.get_token().await.unwrap();
    assert!(credential.expires_at.is_none());
}

#[tokio::test]
async fn test_default_expiration_applies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
        .mount(&mock_server)
        .await;

    let provider = TokenProvider::new("zzrf-001", client_credentials(&mock_server))
        .with_default_expiration(Some(600));
    let credential = provider.get_token().await.unwrap();
    let lifetime = credential.expires_at.unwrap() - credential.refreshed_at;
    assert_eq!(lifetime.num_seconds(), 600);
}

// ============================================================================
// Secure Token
// ============================================================================

#[tokio::test]
async fn test_secure_token_fetch() {
    let mock_server = MockServer::start().await;
    let basic = base64::engine::general_purpose::STANDARD.encode("admin:access-key:csecret");

    Mock::given(method("POST"))
        .and(path("/dw/oauth2/access_token"))
        .and(query_param("client_id", "cid"))
        .and(header("Authorization", format!("Basic {basic}").as_str()))
        .and(body_string_contains("dwsecuretoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "bm-token",
            "expires_in": 899
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = TokenProvider::new("zzrf-001", secure_token(&mock_server));
    assert_eq!(provider.flow(), GrantFlow::SecureToken);
    assert_eq!(provider.access_token().await.unwrap(), "bm-token");
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_expired_credential_refreshes_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = TokenProvider::new("zzrf-001", client_credentials(&mock_server));
    provider.prime(Credential::expires_in("stale", -5)).await;

    assert_eq!(provider.get_token().await.unwrap().access_token, "fresh");
    assert_eq!(provider.get_token().await.unwrap().access_token, "fresh");
    assert_eq!(provider.refresh_count(), 1);
}

#[tokio::test]
async fn test_concurrent_callers_share_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "shared", "expires_in": 3600}))
                .set_delay(std::time::Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = Arc::new(TokenProvider::new(
        "zzrf-001",
        client_credentials(&mock_server),
    ));
    provider.prime(Credential::expires_in("stale", -5)).await;

    let calls = (0..8).map(|_| {
        let provider = Arc::clone(&provider);
        async move { provider.get_token().await }
    });
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert_eq!(result.unwrap().access_token, "shared");
    }
    assert_eq!(provider.refresh_count(), 1);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_non_2xx_is_fatal_and_redacted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "access_token": "leaked-token",
            "detail": "bad secret csecret"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = TokenProvider::new("zzrf-001", client_credentials(&mock_server));
    let err = provider.get_token().await.unwrap_err();

    assert!(matches!(err, Error::Auth { .. }));
    let text = err.to_string();
    assert!(text.contains("401"));
    assert!(!text.contains("leaked-token"));
    assert!(!text.contains("csecret"));
}

#[tokio::test]
async fn test_missing_access_token_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expires_in": 10})))
        .mount(&mock_server)
        .await;

    let provider = TokenProvider::new("zzrf-001", client_credentials(&mock_server));
    let err = provider.get_token().await.unwrap_err();
    assert!(err.to_string().contains("no access_token"));
}

// ============================================================================
// Registry
// ============================================================================

fn tap_config(extra: serde_json::Value) -> TapConfig {
    let mut value = json!({
        "domain": "zzrf-001",
        "client_id": "cid",
        "client_secret": "csecret"
    });
    if let (Some(target), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    TapConfig::from_json(&value.to_string()).unwrap()
}

#[test]
fn test_registry_client_credentials_only() {
    let registry = TokenRegistry::from_config(&tap_config(json!({})), reqwest::Client::new());
    assert_eq!(registry.len(), 1);
    assert!(registry.get("zzrf-001", GrantFlow::SecureToken).is_none());

    // Secure-token streams fall back to client credentials
    let provider = registry
        .resolve("zzrf-001", GrantFlow::SecureToken)
        .unwrap();
    assert_eq!(provider.flow(), GrantFlow::ClientCredentials);
}

#[test]
fn test_registry_with_business_manager_user() {
    let registry = TokenRegistry::from_config(
        &tap_config(json!({"username": "admin", "password": "key"})),
        reqwest::Client::new(),
    );
    assert_eq!(registry.len(), 2);

    let a = registry.resolve("zzrf-001", GrantFlow::SecureToken).unwrap();
    let b = registry.resolve("zzrf-001", GrantFlow::SecureToken).unwrap();
    assert_eq!(a.flow(), GrantFlow::SecureToken);
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_registry_unknown_tenant() {
    let registry = TokenRegistry::new();
    assert!(registry.is_empty());
    let err = registry
        .resolve("other", GrantFlow::ClientCredentials)
        .unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}
