//! Tests for request construction

use super::*;
use crate::config::TapConfig;
use crate::pagination::{Cursor, IdPlacement, PagingMode};
use crate::stream::{find, PageRequest, StreamCapabilities};
use crate::types::{Method, StringMap};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

fn config(extra: serde_json::Value) -> TapConfig {
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

fn vars(pairs: &[(&str, &str)]) -> StringMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn page(paging: &PagingMode, cursor: Option<Cursor>) -> PageRequest<'_> {
    PageRequest {
        paging,
        cursor,
        page_size: 200,
        range_from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        now: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

// ============================================================================
// Base URLs
// ============================================================================

#[test]
fn test_base_urls() {
    let config = config(json!({}));
    let builder = RequestBuilder::new(&config);

    assert_eq!(
        builder.base_url(ApiScope::Data, &StringMap::new()).unwrap(),
        "https://zzrf-001.dx.commercecloud.salesforce.com/s/-/dw/data/v23_1"
    );
    assert_eq!(
        builder
            .base_url(ApiScope::Shop, &vars(&[("site_id", "RefArch")]))
            .unwrap(),
        "https://zzrf-001.dx.commercecloud.salesforce.com/s/RefArch/dw/shop/v23_1"
    );
    assert!(builder.base_url(ApiScope::Shop, &StringMap::new()).is_err());
}

#[test]
fn test_base_url_override_and_version() {
    let config = config(json!({"base_url": "http://localhost:8080/", "api_version": "v24_5"}));
    let builder = RequestBuilder::new(&config);
    assert_eq!(
        builder.base_url(ApiScope::Data, &StringMap::new()).unwrap(),
        "http://localhost:8080/s/-/dw/data/v24_5"
    );
}

// ============================================================================
// GET Requests
// ============================================================================

#[test]
fn test_listing_request() {
    let config = config(json!({}));
    let stream = find("categories").unwrap();
    let paging = stream.paging(&config);
    let request = RequestBuilder::new(&config)
        .build(
            &stream,
            &vars(&[("catalog_id", "storefront-catalog")]),
            "tok",
            &page(&paging, Some(Cursor::Offset(400))),
        )
        .unwrap();

    assert_eq!(request.method, Method::GET);
    assert!(request
        .url
        .ends_with("/s/-/dw/data/v23_1/catalogs/storefront-catalog/categories"));
    assert_eq!(request.header("authorization"), Some("Bearer tok"));
    assert_eq!(request.header(CLIENT_ID_HEADER), Some("cid"));
    assert_eq!(request.header("User-Agent"), None);
    assert_eq!(request.query_param("select"), Some("(**)"));
    assert_eq!(request.query_param("expand"), Some("vm"));
    assert_eq!(request.query_param("count"), Some("200"));
    assert_eq!(request.query_param("start"), Some("400"));
    assert!(request.body.is_none());
}

#[test]
fn test_first_page_omits_start() {
    let config = config(json!({}));
    let stream = find("sites").unwrap();
    let paging = stream.paging(&config);
    let request = RequestBuilder::new(&config)
        .build(&stream, &StringMap::new(), "tok", &page(&paging, None))
        .unwrap();
    assert_eq!(request.query_param("start"), None);
    assert_eq!(request.query_param("count"), Some("200"));
}

#[test]
fn test_user_agent_adds_accept() {
    let config = config(json!({"user_agent": "tap-sfcc/1.0"}));
    let stream = find("sites").unwrap();
    let paging = stream.paging(&config);
    let request = RequestBuilder::new(&config)
        .build(&stream, &StringMap::new(), "tok", &page(&paging, None))
        .unwrap();
    assert_eq!(request.header("user-agent"), Some("tap-sfcc/1.0"));
    assert_eq!(request.header("accept"), Some("application/json"));
}

#[test]
fn test_currency_query() {
    let config = config(json!({}));
    let stream = find("products").unwrap();
    let paging = stream.paging(&config);
    let request = RequestBuilder::new(&config)
        .build(
            &stream,
            &vars(&[("site_id", "A"), ("product_id", "25519")]),
            "tok",
            &page(&paging, Some(Cursor::Currency(2))),
        )
        .unwrap();

    assert!(request.url.ends_with("/s/A/dw/shop/v23_1/products/25519"));
    assert_eq!(request.query_param("currency"), Some("GBP"));
    assert_eq!(request.query_param("count"), None);
}

#[test]
fn test_id_path_segment() {
    let config = config(json!({"order_ids": ["en_US", "de DE"]}));
    let stream = find("site_locale_info").unwrap();
    let paging = stream.paging(&config);
    assert!(matches!(
        paging,
        PagingMode::IdList {
            placement: IdPlacement::PathSegment,
            ..
        }
    ));

    let request = RequestBuilder::new(&config)
        .build(
            &stream,
            &vars(&[("site_id", "RefArch")]),
            "tok",
            &page(&paging, Some(Cursor::IdIndex(1))),
        )
        .unwrap();
    assert!(request
        .url
        .ends_with("/sites/RefArch/locale_info/locales/de%20DE"));
    assert_eq!(request.query_param("include_all"), Some("true"));
}

#[test]
fn test_missing_path_variable() {
    let config = config(json!({}));
    let stream = find("catalogs_by_id").unwrap();
    let paging = stream.paging(&config);
    let err = RequestBuilder::new(&config)
        .build(&stream, &StringMap::new(), "tok", &page(&paging, None))
        .unwrap_err();
    assert!(err.to_string().contains("catalog_id"));
}

// ============================================================================
// POST Requests
// ============================================================================

#[test]
fn test_order_search_request() {
    let config = config(json!({}));
    let stream = find("orders").unwrap();
    let paging = stream.paging(&config);
    let request = RequestBuilder::new(&config)
        .build(
            &stream,
            &vars(&[("site_id", "A")]),
            "tok",
            &page(&paging, Some(Cursor::Offset(200))),
        )
        .unwrap();

    assert_eq!(request.method, Method::POST);
    assert!(request.url.ends_with("/s/A/dw/shop/v23_1/order_search"));
    // Paging travels in the body
    assert_eq!(request.query_param("start"), None);
    assert_eq!(request.query_param("count"), None);

    let body = request.body.unwrap();
    assert_eq!(body["start"], 200);
    assert_eq!(body["count"], 200);
}

#[test]
fn test_debug_masks_authorization() {
    let config = config(json!({}));
    let stream = find("sites").unwrap();
    let paging = stream.paging(&config);
    let request = RequestBuilder::new(&config)
        .build(&stream, &StringMap::new(), "very-secret-token", &page(&paging, None))
        .unwrap();
    let debug = format!("{request:?}");
    assert!(!debug.contains("very-secret-token"));
    assert!(debug.contains("x-dw-client-id"));
}
