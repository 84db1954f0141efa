//! Partition types and traits

use crate::types::StringMap;

/// Values a child stream renders into its path (e.g. `product_id`)
pub type EntityContext = StringMap;

/// Identifier of one independent extraction lane
///
/// An ordered tuple of named values. The implicit key has no values and is
/// used by every stream that does not fan out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    parts: Vec<(String, String)>,
}

impl PartitionKey {
    /// Key used by non-partitioned streams
    pub fn implicit() -> Self {
        Self::default()
    }

    /// Key for one site of a multi-site configuration
    pub fn site(site_id: impl Into<String>) -> Self {
        Self::implicit().with("site_id", site_id)
    }

    /// Append a named value
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), value.into()));
        self
    }

    /// Whether this is the implicit key
    pub fn is_implicit(&self) -> bool {
        self.parts.is_empty()
    }

    /// Look up a value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Site id, if this is a site lane
    pub fn site_id(&self) -> Option<&str> {
        self.get("site_id")
    }

    /// Values as a map, for template rendering
    pub fn values(&self) -> StringMap {
        self.parts.iter().cloned().collect()
    }

    /// Stable identifier used as the state key
    pub fn id(&self) -> String {
        if self.is_implicit() {
            return "default".to_string();
        }
        self.parts
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id())
    }
}

/// Trait for partition routers
pub trait PartitionRouter: Send + Sync {
    /// Generate partition keys
    fn partitions(&self) -> Vec<PartitionKey>;
}
