//! Partition router implementations

use super::types::{EntityContext, PartitionKey, PartitionRouter};
use crate::types::scalar_to_string;
use serde_json::Value;

// ============================================================================
// Site Router
// ============================================================================

/// One partition per configured site id
///
/// Streams that are not site-scoped always get the implicit key.
#[derive(Debug, Clone)]
pub struct SiteRouter {
    site_ids: Vec<String>,
    site_scoped: bool,
}

impl SiteRouter {
    /// Create a router over already-split site ids
    pub fn new(site_ids: Vec<String>, site_scoped: bool) -> Self {
        Self {
            site_ids,
            site_scoped,
        }
    }
}

impl PartitionRouter for SiteRouter {
    fn partitions(&self) -> Vec<PartitionKey> {
        if !self.site_scoped {
            return vec![PartitionKey::implicit()];
        }
        let mut seen = std::collections::HashSet::new();
        self.site_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(PartitionKey::site)
            .collect()
    }
}

// ============================================================================
// Child Contexts
// ============================================================================

/// Where a child context value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSource {
    /// Dot path into the parent record, e.g. `product_id`
    Record(&'static str),
    /// Value already present in the parent's own context
    Parent(&'static str),
    /// Path segment following `marker` inside a link field of the record
    LinkSegment {
        /// Record field holding the link
        field: &'static str,
        /// Segment that precedes the wanted value, e.g. `customer_lists`
        marker: &'static str,
    },
}

/// One named value of a child context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextField {
    /// Name used in the child's path template
    pub name: &'static str,
    /// How to derive it
    pub source: ContextSource,
}

impl ContextField {
    /// Value copied from a record field
    pub const fn record(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            source: ContextSource::Record(path),
        }
    }

    /// Value carried over from the parent context
    pub const fn parent(name: &'static str) -> Self {
        Self {
            name,
            source: ContextSource::Parent(name),
        }
    }

    /// Value cut out of a link URL
    pub const fn link_segment(
        name: &'static str,
        field: &'static str,
        marker: &'static str,
    ) -> Self {
        Self {
            name,
            source: ContextSource::LinkSegment { field, marker },
        }
    }
}

/// Build a child context from a parent record
///
/// Returns `None` when any field is missing, so records without the key are
/// skipped instead of producing a half-rendered path.
pub fn derive_context(
    fields: &[ContextField],
    record: &Value,
    parent: &EntityContext,
) -> Option<EntityContext> {
    let mut context = EntityContext::new();
    for field in fields {
        let value = match &field.source {
            ContextSource::Record(path) => extract_path(record, path).and_then(scalar_to_string),
            ContextSource::Parent(name) => parent.get(*name).cloned(),
            ContextSource::LinkSegment { field, marker } => extract_path(record, field)
                .and_then(Value::as_str)
                .and_then(|link| link_segment_after(link, marker)),
        }?;
        context.insert(field.name.to_string(), value);
    }
    Some(context)
}

/// Extract a value from a record using dot notation
pub fn extract_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn link_segment_after(link: &str, marker: &str) -> Option<String> {
    let mut segments = link.split(['/', '?']);
    segments.find(|s| *s == marker)?;
    segments
        .next()
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
