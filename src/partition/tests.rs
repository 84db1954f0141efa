//! Tests for partition module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// PartitionKey Tests
// ============================================================================

#[test]
fn test_implicit_key() {
    let key = PartitionKey::implicit();
    assert!(key.is_implicit());
    assert_eq!(key.id(), "default");
    assert!(key.site_id().is_none());
}

#[test]
fn test_site_key() {
    let key = PartitionKey::site("RefArch");
    assert!(!key.is_implicit());
    assert_eq!(key.site_id(), Some("RefArch"));
    assert_eq!(key.id(), "site_id=RefArch");
    assert_eq!(key.to_string(), "site_id=RefArch");
    assert_eq!(key.values().get("site_id").map(String::as_str), Some("RefArch"));
}

#[test]
fn test_distinct_keys_for_distinct_sites() {
    assert_ne!(PartitionKey::site("A"), PartitionKey::site("B"));
    assert_ne!(PartitionKey::site("A").id(), PartitionKey::site("B").id());
}

// ============================================================================
// SiteRouter Tests
// ============================================================================

fn sites(ids: &[&str]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

#[test]
fn test_site_router_one_key_per_site() {
    let router = SiteRouter::new(sites(&["A", "B"]), true);
    assert_eq!(
        router.partitions(),
        vec![PartitionKey::site("A"), PartitionKey::site("B")]
    );
}

#[test]
fn test_site_router_dedupes() {
    let router = SiteRouter::new(sites(&["A", "A", "B"]), true);
    assert_eq!(router.partitions().len(), 2);
}

#[test]
fn test_site_router_not_scoped() {
    let router = SiteRouter::new(sites(&["A", "B"]), false);
    assert_eq!(router.partitions(), vec![PartitionKey::implicit()]);
}

#[test]
fn test_site_router_empty_list() {
    let router = SiteRouter::new(Vec::new(), true);
    assert!(router.partitions().is_empty());
}

// ============================================================================
// Child Context Tests
// ============================================================================

#[test]
fn test_derive_context_from_record() {
    let fields = [ContextField::record("product_id", "product_id")];
    let ctx = derive_context(&fields, &json!({"product_id": "P-1"}), &EntityContext::new()).unwrap();
    assert_eq!(ctx.get("product_id").map(String::as_str), Some("P-1"));
}

#[test]
fn test_derive_context_numeric_and_nested() {
    let fields = [ContextField::record("id", "data.id")];
    let ctx = derive_context(&fields, &json!({"data": {"id": 42}}), &EntityContext::new()).unwrap();
    assert_eq!(ctx.get("id").map(String::as_str), Some("42"));
}

#[test]
fn test_derive_context_carries_parent() {
    let fields = [
        ContextField::record("customer_group_id", "id"),
        ContextField::parent("site_id"),
    ];
    let mut parent = EntityContext::new();
    parent.insert("site_id".to_string(), "RefArch".to_string());

    let ctx = derive_context(&fields, &json!({"id": "Everyone"}), &parent).unwrap();
    assert_eq!(ctx.get("site_id").map(String::as_str), Some("RefArch"));
    assert_eq!(ctx.get("customer_group_id").map(String::as_str), Some("Everyone"));
}

#[test]
fn test_derive_context_link_segment() {
    let fields = [ContextField::link_segment(
        "list_id",
        "customer_link",
        "customer_lists",
    )];
    let record = json!({
        "customer_link": "https://host/s/-/dw/data/v23_1/customer_lists/RefArch/customers/00001"
    });
    let ctx = derive_context(&fields, &record, &EntityContext::new()).unwrap();
    assert_eq!(ctx.get("list_id").map(String::as_str), Some("RefArch"));
}

#[test]
fn test_derive_context_missing_field() {
    let fields = [ContextField::record("order_no", "order_no")];
    assert!(derive_context(&fields, &json!({"id": 1}), &EntityContext::new()).is_none());
}
