//! Stream capability types

use crate::auth::GrantFlow;
use crate::classify::{Classification, Fault};
use crate::config::TapConfig;
use crate::pagination::{Cursor, IdPlacement, PagingMode};
use crate::partition::{derive_context, ContextField, EntityContext};
use crate::request::ApiScope;
use crate::types::Method;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Largest page OCAPI serves
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Static query options of a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// `select` property selector, e.g. `(**)`
    pub select: Option<&'static str>,
    /// `expand` list
    pub expand: Option<&'static str>,
    /// Send `include_all=true`
    pub include_all: bool,
    /// Send the current page size as `count`
    pub count: bool,
}

/// How a stream pages, before configuration is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingKind {
    /// One request per entity
    Single,
    /// `start`/`count` offset paging
    Offset,
    /// One request per currency code
    Currencies(&'static [&'static str]),
    /// One request per configured order id
    ConfiguredIds(IdPlacement),
    /// Offset paging, or one request per order id when ids are configured
    OffsetOrIds(IdPlacement),
}

/// Search body a POST stream sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// No body
    None,
    /// `order_search` body
    OrderSearch,
    /// `product_search` body for master products
    ProductSearch,
}

/// Everything the request needs to know about the page being fetched
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    /// Paging mode of the stream
    pub paging: &'a PagingMode,
    /// Effective cursor
    pub cursor: Option<Cursor>,
    /// Current page size
    pub page_size: u32,
    /// Lower bound of the replication range
    pub range_from: DateTime<Utc>,
    /// Upper bound of the replication range
    pub now: DateTime<Utc>,
}

/// What the pagination driver needs from a stream
pub trait StreamCapabilities: Send + Sync {
    /// Stream name
    fn name(&self) -> &str;

    /// API surface
    fn scope(&self) -> ApiScope;

    /// HTTP method
    fn method(&self) -> Method;

    /// Path relative to the scope base, with `{{ name }}` placeholders
    fn path_template(&self) -> &str;

    /// JSONPath locating records in a response
    fn records_path(&self) -> &str;

    /// Static query options
    fn query_options(&self) -> QueryOptions;

    /// Paging mode under a configuration
    fn paging(&self, config: &TapConfig) -> PagingMode;

    /// Initial page size under a configuration
    fn page_size(&self, config: &TapConfig) -> u32;

    /// Search body for a page, if the stream sends one
    fn build_body(&self, page: &PageRequest<'_>) -> Option<Value>;

    /// Stream-specific reading of an error response
    ///
    /// `None` leaves the response fatal.
    fn refine(&self, status: u16, fault: &Fault) -> Option<Classification>;

    /// Statuses meaning "nothing here"
    fn empty_statuses(&self) -> &[u16];

    /// Field tracking incremental progress
    fn replication_key(&self) -> Option<&str>;

    /// Token flow the stream prefers
    fn grant_flow(&self) -> GrantFlow;

    /// Whether the stream fans out over configured sites
    fn site_scoped(&self) -> bool;

    /// Parent stream feeding entity contexts
    fn parent(&self) -> Option<&str>;

    /// Streams whose pooled contexts this stream replays as records
    ///
    /// A stream with feeders makes no requests of its own.
    fn feeders(&self) -> &[&'static str];

    /// Context a record hands to child streams
    fn child_context(&self, record: &Value, context: &EntityContext) -> Option<EntityContext>;

    /// Context a record contributes to the shared pool read by feeder-driven streams
    fn pool_context(&self, record: &Value, context: &EntityContext) -> Option<EntityContext>;

    /// Copy context values into an emitted record
    fn stamp_record(&self, record: &mut Value, context: &EntityContext);

    /// Whether hitting the offset ceiling restarts from the high-water mark
    fn offset_ceiling_restart(&self) -> bool;
}

/// Declarative stream definition
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    /// Stream name
    pub name: &'static str,
    /// API surface
    pub scope: ApiScope,
    /// HTTP method
    pub method: Method,
    /// Path template
    pub path: &'static str,
    /// JSONPath to records
    pub records_path: &'static str,
    /// Static query options
    pub query: QueryOptions,
    /// Paging kind
    pub paging: PagingKind,
    /// Search body kind
    pub body: BodyKind,
    /// Statuses treated as empty
    pub empty_statuses: &'static [u16],
    /// Replication key
    pub replication_key: Option<&'static str>,
    /// Parent stream
    pub parent: Option<&'static str>,
    /// Values handed to children
    pub child_fields: &'static [ContextField],
    /// Values contributed to the shared pool
    pub pool_fields: &'static [ContextField],
    /// Streams whose pools this stream replays
    pub fed_by: &'static [&'static str],
    /// Context values stamped onto records
    pub record_fields: &'static [&'static str],
    /// Offset ceiling restart
    pub ceiling_restart: bool,
}

impl StreamDescriptor {
    /// GET stream on the Data API with a single request per entity
    pub fn data(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            scope: ApiScope::Data,
            method: Method::GET,
            path,
            records_path: "$",
            query: QueryOptions::default(),
            paging: PagingKind::Single,
            body: BodyKind::None,
            empty_statuses: &[404],
            replication_key: None,
            parent: None,
            child_fields: &[],
            pool_fields: &[],
            fed_by: &[],
            record_fields: &[],
            ceiling_restart: false,
        }
    }

    /// GET stream on the Shop API
    pub fn shop(name: &'static str, path: &'static str) -> Self {
        Self {
            scope: ApiScope::Shop,
            ..Self::data(name, path)
        }
    }

    /// List resource under `data[*]` with offset paging
    #[must_use]
    pub fn listing(mut self) -> Self {
        self.records_path = "$.data[*]";
        self.paging = PagingKind::Offset;
        self.query.count = true;
        self
    }

    /// POST search with the given body
    #[must_use]
    pub fn search(mut self, body: BodyKind, records_path: &'static str) -> Self {
        self.method = Method::POST;
        self.body = body;
        self.records_path = records_path;
        self.paging = PagingKind::Offset;
        self
    }

    /// Override the records path
    #[must_use]
    pub fn records(mut self, path: &'static str) -> Self {
        self.records_path = path;
        self
    }

    /// Override the paging kind
    #[must_use]
    pub fn pages_by(mut self, paging: PagingKind) -> Self {
        self.paging = paging;
        self
    }

    /// Set `select`
    #[must_use]
    pub fn select(mut self, select: &'static str) -> Self {
        self.query.select = Some(select);
        self
    }

    /// Set `expand`
    #[must_use]
    pub fn expand(mut self, expand: &'static str) -> Self {
        self.query.expand = Some(expand);
        self
    }

    /// Send `include_all=true`
    #[must_use]
    pub fn include_all(mut self) -> Self {
        self.query.include_all = true;
        self
    }

    /// Override the empty statuses
    #[must_use]
    pub fn empty_on(mut self, statuses: &'static [u16]) -> Self {
        self.empty_statuses = statuses;
        self
    }

    /// Track progress on `key`
    #[must_use]
    pub fn replicate_on(mut self, key: &'static str) -> Self {
        self.replication_key = Some(key);
        self
    }

    /// Make this a child of `parent`
    #[must_use]
    pub fn child_of(mut self, parent: &'static str) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Values handed to children
    #[must_use]
    pub fn provides(mut self, fields: &'static [ContextField]) -> Self {
        self.child_fields = fields;
        self
    }

    /// Values contributed to the shared pool
    #[must_use]
    pub fn pools(mut self, fields: &'static [ContextField]) -> Self {
        self.pool_fields = fields;
        self
    }

    /// Replay the pools of `feeders` instead of calling the API
    #[must_use]
    pub fn collects_from(mut self, feeders: &'static [&'static str]) -> Self {
        self.fed_by = feeders;
        self
    }

    /// Streams this one has to run after
    pub fn dependencies(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parent.into_iter().chain(self.fed_by.iter().copied())
    }

    /// Context values stamped onto records
    #[must_use]
    pub fn stamps(mut self, fields: &'static [&'static str]) -> Self {
        self.record_fields = fields;
        self
    }

    /// Restart from the high-water mark at the offset ceiling
    #[must_use]
    pub fn restart_at_ceiling(mut self) -> Self {
        self.ceiling_restart = true;
        self
    }
}

impl StreamCapabilities for StreamDescriptor {
    fn name(&self) -> &str {
        self.name
    }

    fn scope(&self) -> ApiScope {
        self.scope
    }

    fn method(&self) -> Method {
        self.method
    }

    fn path_template(&self) -> &str {
        self.path
    }

    fn records_path(&self) -> &str {
        self.records_path
    }

    fn query_options(&self) -> QueryOptions {
        self.query
    }

    fn paging(&self, config: &TapConfig) -> PagingMode {
        match self.paging {
            PagingKind::Single => PagingMode::Single,
            PagingKind::Offset => PagingMode::Offset,
            PagingKind::Currencies(codes) => {
                PagingMode::Currency(codes.iter().map(ToString::to_string).collect())
            }
            PagingKind::ConfiguredIds(placement) => PagingMode::IdList {
                ids: config.order_ids.clone(),
                placement,
            },
            PagingKind::OffsetOrIds(placement) => {
                if config.order_ids.is_empty() {
                    PagingMode::Offset
                } else {
                    PagingMode::IdList {
                        ids: config.order_ids.clone(),
                        placement,
                    }
                }
            }
        }
    }

    fn page_size(&self, config: &TapConfig) -> u32 {
        match self.body {
            BodyKind::OrderSearch => config.order_page_size,
            _ => config.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    fn build_body(&self, page: &PageRequest<'_>) -> Option<Value> {
        match self.body {
            BodyKind::None => None,
            BodyKind::OrderSearch => Some(super::body::order_search_body(page)),
            BodyKind::ProductSearch => Some(super::body::product_search_body(page)),
        }
    }

    fn refine(&self, status: u16, fault: &Fault) -> Option<Classification> {
        if fault.is("ProductNotFoundException") {
            return Some(Classification::Empty);
        }
        if status == 400
            && fault.is("UnsupportedCurrencyException")
            && matches!(self.paging, PagingKind::Currencies(_))
        {
            return fault
                .argument("currency")
                .map(Classification::UnsupportedCurrency);
        }
        None
    }

    fn empty_statuses(&self) -> &[u16] {
        self.empty_statuses
    }

    fn replication_key(&self) -> Option<&str> {
        self.replication_key
    }

    fn grant_flow(&self) -> GrantFlow {
        match self.scope {
            ApiScope::Shop => GrantFlow::SecureToken,
            ApiScope::Data => GrantFlow::ClientCredentials,
        }
    }

    fn site_scoped(&self) -> bool {
        self.scope == ApiScope::Shop
    }

    fn parent(&self) -> Option<&str> {
        self.parent
    }

    fn feeders(&self) -> &[&'static str] {
        self.fed_by
    }

    fn child_context(&self, record: &Value, context: &EntityContext) -> Option<EntityContext> {
        if self.child_fields.is_empty() {
            return None;
        }
        derive_context(self.child_fields, record, context)
    }

    fn pool_context(&self, record: &Value, context: &EntityContext) -> Option<EntityContext> {
        if self.pool_fields.is_empty() {
            return None;
        }
        derive_context(self.pool_fields, record, context)
    }

    fn stamp_record(&self, record: &mut Value, context: &EntityContext) {
        let Some(object) = record.as_object_mut() else {
            return;
        };
        for field in self.record_fields {
            if let Some(value) = context.get(*field) {
                object.insert((*field).to_string(), Value::String(value.clone()));
            }
        }
    }

    fn offset_ceiling_restart(&self) -> bool {
        self.ceiling_restart
    }
}
