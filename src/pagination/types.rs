//! Pagination types

use serde_json::Value;

/// OCAPI refuses `start + count` beyond this many rows
pub const OFFSET_CEILING: u64 = 10_000;

/// Position within a paged resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Row offset sent as `start`
    Offset(u64),
    /// Index into the stream's currency list
    Currency(usize),
    /// Index into the configured id list
    IdIndex(usize),
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cursor::Offset(n) => write!(f, "offset={n}"),
            Cursor::Currency(i) => write!(f, "currency[{i}]"),
            Cursor::IdIndex(i) => write!(f, "id[{i}]"),
        }
    }
}

/// Where an id-list value goes in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPlacement {
    /// Appended to the resource path
    PathSegment,
    /// Used as the search phrase of a text query body
    SearchPhrase,
}

/// How a stream pages
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PagingMode {
    /// One request per entity
    #[default]
    Single,
    /// `start` offset paging driven by the `next` flag
    Offset,
    /// One request per currency code
    Currency(Vec<String>),
    /// One request per id
    IdList {
        /// Ids to iterate
        ids: Vec<String>,
        /// Where the id goes
        placement: IdPlacement,
    },
}

/// Paging facts read from a successful response body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMeta {
    /// The payload's `next` indicator
    pub has_more: bool,
    /// Rows in this page (`count`)
    pub count: u64,
}

impl PageMeta {
    /// Read `next` and `count` from a response document
    ///
    /// `next` counts as set when it is `true`, a non-empty string or an
    /// object (OCAPI returns a link there on some resources).
    pub fn from_body(body: &Value) -> Self {
        let has_more = match body.get("next") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Object(_)) => true,
            _ => false,
        };
        let count = body.get("count").and_then(Value::as_u64).unwrap_or(0);
        Self { has_more, count }
    }
}
