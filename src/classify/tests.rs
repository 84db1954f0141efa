//! Tests for response classification

use super::*;
use crate::error::Error;
use crate::http::RawResponse;
use crate::pagination::{Cursor, PagingMode};
use crate::stream::{find, StreamDescriptor};
use serde_json::json;
use std::collections::HashSet;
use test_case::test_case;

const URL: &str = "https://zzrf-001.dx.commercecloud.salesforce.com/s/-/dw/data/v23_1/sites";

fn response(status: u16, body: &str) -> RawResponse {
    RawResponse {
        status,
        url: URL.to_string(),
        body: body.to_string(),
    }
}

fn classify_with(
    stream: &StreamDescriptor,
    mode: &PagingMode,
    cursor: Option<Cursor>,
    resp: &RawResponse,
) -> Classification {
    let removed = HashSet::new();
    ResponseClassifier::new(stream, &[429], vec!["tok-123", "csecret"]).classify(
        resp,
        PagePosition {
            mode,
            cursor,
            removed: &removed,
        },
    )
}

fn classify(stream_name: &str, resp: &RawResponse) -> Classification {
    let stream = find(stream_name).unwrap();
    classify_with(&stream, &PagingMode::Offset, None, resp)
}

// ============================================================================
// Status Routing
// ============================================================================

#[test_case(500 ; "internal error")]
#[test_case(502 ; "bad gateway")]
#[test_case(503 ; "unavailable")]
#[test_case(429 ; "rate limited")]
fn test_retriable_statuses(status: u16) {
    let result = classify("sites", &response(status, "try later"));
    assert!(matches!(
        result,
        Classification::Retriable(RetryReason::Server { status: s, .. }) if s == status
    ));
}

#[test]
fn test_not_found_is_empty_for_default_streams() {
    let result = classify("sites", &response(404, r#"{"fault":{"type":"NotFound"}}"#));
    assert!(matches!(result, Classification::Empty));
}

#[test]
fn test_no_content_is_empty_for_customers() {
    assert!(matches!(
        classify("customers", &response(204, "")),
        Classification::Empty
    ));
    // Elsewhere 204 has no body to parse
    assert!(matches!(
        classify("sites", &response(204, "")),
        Classification::Retriable(RetryReason::Malformed { .. })
    ));
}

#[test]
fn test_unhandled_fault_is_fatal() {
    let body = r#"{"fault":{"type":"InvalidAccessTokenException","message":"token tok-123 expired"}}"#;
    let result = classify("sites", &response(401, body));
    let Classification::Fatal(err) = result else {
        panic!("expected fatal, got {result:?}");
    };
    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
    let text = err.to_string();
    assert!(text.contains("InvalidAccessTokenException"));
    assert!(!text.contains("tok-123"));
}

#[test]
fn test_unparseable_error_body_is_fatal() {
    let result = classify("sites", &response(400, "<html>bad request</html>"));
    assert!(matches!(result, Classification::Fatal(Error::HttpStatus { status: 400, .. })));
}

#[test]
fn test_unparseable_success_body_is_retriable() {
    let result = classify("sites", &response(200, "<html>csecret</html>"));
    let Classification::Retriable(RetryReason::Malformed { excerpt, .. }) = result else {
        panic!("expected malformed, got {result:?}");
    };
    assert!(!excerpt.contains("csecret"));
}

// ============================================================================
// Stream Refinements
// ============================================================================

#[test]
fn test_product_not_found_is_empty() {
    let body = r#"{"fault":{"type":"ProductNotFoundException","arguments":{"productId":"X"}}}"#;
    let result = classify("global_products", &response(400, body));
    assert!(matches!(result, Classification::Empty));
}

#[test]
fn test_unsupported_currency_on_currency_stream() {
    let stream = find("products").unwrap();
    let mode = PagingMode::Currency(vec!["USD".into(), "EUR".into(), "GBP".into()]);
    let body = r#"{"fault":{"type":"UnsupportedCurrencyException","arguments":{"currency":"EUR"}}}"#;

    let result = classify_with(&stream, &mode, Some(Cursor::Currency(1)), &response(400, body));
    assert!(matches!(result, Classification::UnsupportedCurrency(ref c) if c == "EUR"));
}

#[test]
fn test_unsupported_currency_elsewhere_is_fatal() {
    let body = r#"{"fault":{"type":"UnsupportedCurrencyException","arguments":{"currency":"EUR"}}}"#;
    assert!(matches!(
        classify("sites", &response(400, body)),
        Classification::Fatal(_)
    ));
}

// ============================================================================
// Success
// ============================================================================

#[test]
fn test_success_with_next_page() {
    let body = json!({
        "count": 2,
        "data": [{"id": "a"}, {"id": "b"}],
        "next": "https://host/sites?start=202"
    });
    let stream = find("sites").unwrap();
    let result = classify_with(
        &stream,
        &PagingMode::Offset,
        Some(Cursor::Offset(200)),
        &response(200, &body.to_string()),
    );

    let Classification::Success {
        records,
        next_cursor,
    } = result
    else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(records.len(), 2);
    assert_eq!(next_cursor, Some(Cursor::Offset(202)));
}

#[test]
fn test_success_last_page() {
    let body = json!({"count": 1, "data": [{"id": "a"}]});
    let result = classify("sites", &response(200, &body.to_string()));
    assert!(matches!(
        result,
        Classification::Success { ref records, next_cursor: None } if records.len() == 1
    ));
}

#[test]
fn test_order_hits_unwrap_data() {
    let body = json!({
        "count": 1,
        "hits": [{"data": {"order_no": "00001"}, "relevance": 1.0}]
    });
    let stream = find("orders").unwrap();
    let result = classify_with(&stream, &PagingMode::Offset, None, &response(200, &body.to_string()));
    let Classification::Success { records, .. } = result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(records, vec![json!({"order_no": "00001"})]);
}

// ============================================================================
// Types
// ============================================================================

#[test]
fn test_fault_parsing() {
    let body = json!({"fault": {
        "type": "UnsupportedCurrencyException",
        "message": "nope",
        "arguments": {"currency": "GBP", "siteId": "A"}
    }});
    let fault = Fault::from_body(&body).unwrap();
    assert!(fault.is("UnsupportedCurrencyException"));
    assert_eq!(fault.argument("currency").as_deref(), Some("GBP"));
    assert_eq!(fault.message.as_deref(), Some("nope"));
    assert!(Fault::from_body(&json!({"data": []})).is_none());
}

#[test]
fn test_retry_reason_escalation() {
    let server = RetryReason::Server {
        status: 502,
        url: URL.to_string(),
        body: String::new(),
    };
    assert!(server.is_overload());
    assert!(matches!(server.into_error(10), Error::HttpStatus { status: 502, .. }));

    let transport = RetryReason::Transport("connection reset".to_string());
    assert!(!transport.is_overload());
    assert!(matches!(
        transport.into_error(10),
        Error::MaxRetriesExceeded { max_attempts: 10, .. }
    ));
}

#[test]
fn test_labels() {
    assert_eq!(Classification::Empty.label(), "empty");
    assert_eq!(
        Classification::UnsupportedCurrency("EUR".into()).label(),
        "unsupported_currency"
    );
}
