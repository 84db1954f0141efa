//! Search body builders

use super::types::PageRequest;
use crate::pagination::{Cursor, IdPlacement};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Timestamp layout OCAPI search filters accept
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn offset(page: &PageRequest<'_>) -> u64 {
    match page.cursor {
        Some(Cursor::Offset(start)) => start,
        _ => 0,
    }
}

/// Body for `POST /order_search`
///
/// With an id cursor the query matches one order number; otherwise it is a
/// `last_modified` range from the replication floor to now.
pub fn order_search_body(page: &PageRequest<'_>) -> Value {
    let (query, start) = match page.paging.id(page.cursor) {
        Some((order_no, IdPlacement::SearchPhrase)) => (
            json!({
                "text_query": {
                    "fields": ["order_no"],
                    "search_phrase": order_no
                }
            }),
            0,
        ),
        _ => (
            json!({
                "filtered_query": {
                    "filter": {
                        "range_filter": {
                            "field": "last_modified",
                            "from": format_timestamp(page.range_from),
                            "to": format_timestamp(page.now)
                        }
                    },
                    "query": {"match_all_query": {}}
                }
            }),
            offset(page),
        ),
    };

    json!({
        "count": page.page_size,
        "query": query,
        "select": "(**)",
        "sorts": [{"field": "last_modified", "sort_order": "asc"}],
        "start": start
    })
}

/// Body for `POST /product_search` selecting master products
pub fn product_search_body(page: &PageRequest<'_>) -> Value {
    json!({
        "query": {
            "filtered_query": {
                "filter": {
                    "range_filter": {
                        "field": "last_modified",
                        "from": format_timestamp(page.range_from)
                    }
                },
                "query": {
                    "term_query": {
                        "fields": ["type"],
                        "operator": "is",
                        "values": ["master"]
                    }
                }
            }
        },
        "expand": ["all"],
        "select": "(**)",
        "count": page.page_size,
        "start": offset(page)
    })
}
