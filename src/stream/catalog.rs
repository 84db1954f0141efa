//! Built-in stream catalog

use super::types::{BodyKind, PagingKind, StreamDescriptor};
use crate::error::{Error, Result};
use crate::pagination::IdPlacement;
use crate::partition::ContextField;
use std::collections::HashSet;

/// Currencies requested for every storefront product
const PRODUCT_CURRENCIES: &[&str] = &["USD", "EUR", "GBP"];

const PRODUCT_EXPAND: &str = "availability,bundled_products,links,promotions,options,images,prices,variations,set_products,recommendations";

/// Streams whose product ids feed the storefront `products` lane
const PRODUCT_ID_FEEDERS: &[&str] = &[
    "product_inventory_records",
    "products_search",
    "product_variants_list",
];

const INVENTORY_LIST_CONTEXT: &[ContextField] = &[ContextField::record("inventory_id", "id")];
const PRODUCT_ID_CONTEXT: &[ContextField] = &[ContextField::record("product_id", "product_id")];
const CATALOG_CONTEXT: &[ContextField] = &[ContextField::record("catalog_id", "id")];
const ROOT_CATEGORY_CONTEXT: &[ContextField] =
    &[ContextField::record("root_category", "root_category")];
const SITE_CONTEXT: &[ContextField] = &[ContextField::record("site_id", "id")];
const CUSTOMER_GROUP_CONTEXT: &[ContextField] = &[
    ContextField::parent("site_id"),
    ContextField::record("customer_group_id", "id"),
];
const CUSTOMER_CONTEXT: &[ContextField] = &[
    ContextField::record("customer_no", "customer_no"),
    ContextField::link_segment("list_id", "customer_link", "customer_lists"),
];
const MASTER_PRODUCT_CONTEXT: &[ContextField] = &[ContextField::record("master_product_id", "id")];
const VARIATION_CONTEXT: &[ContextField] = &[
    ContextField::record("variation_id", "product_id"),
    ContextField::parent("master_product_id"),
];
const ORDER_CONTEXT: &[ContextField] = &[ContextField::record("order_no", "order_no")];

/// All built-in streams, parents and feeders before the streams they feed
pub fn catalog() -> Vec<StreamDescriptor> {
    vec![
        // Inventory
        StreamDescriptor::data("inventory_lists", "/inventory_lists")
            .listing()
            .provides(INVENTORY_LIST_CONTEXT),
        StreamDescriptor::data(
            "product_inventory_records",
            "/inventory_lists/{{ inventory_id }}/product_inventory_records",
        )
        .listing()
        .child_of("inventory_lists")
        .provides(PRODUCT_ID_CONTEXT)
        .pools(PRODUCT_ID_CONTEXT),
        // Catalogs
        StreamDescriptor::data("catalogs", "/catalogs")
            .listing()
            .select("(**)")
            .provides(CATALOG_CONTEXT),
        StreamDescriptor::data("catalogs_by_id", "/catalogs/{{ catalog_id }}")
            .child_of("catalogs")
            .provides(ROOT_CATEGORY_CONTEXT),
        StreamDescriptor::data("products_search", "/product_search")
            .listing()
            .records("$.hits[*]")
            .child_of("catalogs_by_id")
            .pools(PRODUCT_ID_CONTEXT),
        StreamDescriptor::data("categories", "/catalogs/{{ catalog_id }}/categories")
            .listing()
            .select("(**)")
            .expand("vm")
            .child_of("catalogs"),
        // Sites and customers
        StreamDescriptor::data("sites", "/sites")
            .listing()
            .select("(**)")
            .provides(SITE_CONTEXT),
        StreamDescriptor::data("site_locale_info", "/sites/{{ site_id }}/locale_info/locales")
            .records("$.hits[*]")
            .pages_by(PagingKind::ConfiguredIds(IdPlacement::PathSegment))
            .select("(**)")
            .include_all()
            .child_of("sites")
            .stamps(&["site_id"]),
        StreamDescriptor::data("customer_groups", "/sites/{{ site_id }}/customer_groups")
            .listing()
            .child_of("sites")
            .provides(CUSTOMER_GROUP_CONTEXT)
            .stamps(&["site_id"]),
        StreamDescriptor::data(
            "customers",
            "/sites/{{ site_id }}/customer_groups/{{ customer_group_id }}/members",
        )
        .listing()
        .select("(**)")
        .empty_on(&[204, 404])
        .child_of("customer_groups")
        .provides(CUSTOMER_CONTEXT)
        .stamps(&["site_id", "customer_group_id"]),
        StreamDescriptor::data(
            "customer_addresses",
            "/customer_lists/{{ list_id }}/customers/{{ customer_no }}/addresses",
        )
        .listing()
        .child_of("customers")
        .stamps(&["customer_no"]),
        // Products
        StreamDescriptor::data("products_data_api", "/product_search")
            .search(BodyKind::ProductSearch, "$.hits[*]")
            .replicate_on("last_modified")
            .provides(MASTER_PRODUCT_CONTEXT),
        StreamDescriptor::data(
            "product_variants_list",
            "/products/{{ master_product_id }}/variations",
        )
        .listing()
        .child_of("products_data_api")
        .provides(VARIATION_CONTEXT)
        .pools(PRODUCT_ID_CONTEXT)
        .stamps(&["master_product_id"]),
        StreamDescriptor::data("product_variations_data_api", "/products/{{ variation_id }}")
            .child_of("product_variants_list")
            .stamps(&["master_product_id"]),
        StreamDescriptor::data("global_products", "/products/{{ product_id }}")
            .select("(**)")
            .expand("all")
            .child_of("product_inventory_records"),
        StreamDescriptor::data("product_variations", "/products/{{ product_id }}/variations")
            .child_of("product_inventory_records"),
        StreamDescriptor::data("prices", "/products/{{ product_id }}/prices")
            .child_of("product_inventory_records"),
        StreamDescriptor::data("products_ids", "/")
            .collects_from(PRODUCT_ID_FEEDERS)
            .provides(PRODUCT_ID_CONTEXT),
        StreamDescriptor::shop("products", "/products/{{ product_id }}")
            .pages_by(PagingKind::Currencies(PRODUCT_CURRENCIES))
            .select("(**)")
            .expand(PRODUCT_EXPAND)
            .child_of("products_ids"),
        // Orders
        StreamDescriptor::shop("orders", "/order_search")
            .search(BodyKind::OrderSearch, "$.hits[*].data")
            .pages_by(PagingKind::OffsetOrIds(IdPlacement::SearchPhrase))
            .replicate_on("last_modified")
            .restart_at_ceiling()
            .provides(ORDER_CONTEXT)
            .stamps(&["site_id"]),
        StreamDescriptor::shop("order_notes", "/orders/{{ order_no }}/notes")
            .records("$.notes[*]")
            .child_of("orders")
            .stamps(&["order_no"]),
    ]
}

/// Look up a built-in stream by name
pub fn find(name: &str) -> Result<StreamDescriptor> {
    catalog()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| Error::StreamNotFound {
            stream: name.to_string(),
        })
}

/// A stream scheduled for a run
#[derive(Debug, Clone)]
pub struct ResolvedStream {
    /// Stream definition
    pub descriptor: StreamDescriptor,
    /// Whether its records are emitted; streams pulled in only to feed
    /// others run silently
    pub emit: bool,
}

/// Order the selected streams dependencies-first, pulling in missing ones
///
/// An empty selection means every stream.
pub fn resolve(selected: &[String]) -> Result<Vec<ResolvedStream>> {
    let all = catalog();

    if selected.is_empty() {
        return Ok(all
            .into_iter()
            .map(|descriptor| ResolvedStream {
                descriptor,
                emit: true,
            })
            .collect());
    }

    let mut wanted: HashSet<&'static str> = HashSet::new();
    for name in selected {
        let descriptor = all
            .iter()
            .find(|s| s.name == name.as_str())
            .ok_or_else(|| Error::StreamNotFound {
                stream: name.clone(),
            })?;
        wanted.insert(descriptor.name);
    }

    let mut needed: HashSet<&'static str> = wanted.clone();
    let mut pending: Vec<&'static str> = wanted.iter().copied().collect();
    while let Some(name) = pending.pop() {
        let Some(descriptor) = all.iter().find(|s| s.name == name) else {
            continue;
        };
        for dependency in descriptor.dependencies() {
            if needed.insert(dependency) {
                pending.push(dependency);
            }
        }
    }

    // Catalog order already puts dependencies first
    Ok(all
        .into_iter()
        .filter(|s| needed.contains(s.name))
        .map(|descriptor| {
            let emit = wanted.contains(descriptor.name);
            ResolvedStream { descriptor, emit }
        })
        .collect())
}
