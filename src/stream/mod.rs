//! Stream definitions module
//!
//! # Overview
//!
//! Every stream is described through the `StreamCapabilities` trait: where it
//! lives, how it pages, how its search body is built, how error faults are
//! refined, and which values its records hand to child streams. The
//! pagination driver only ever talks to this trait.
//!
//! `StreamDescriptor` is the declarative implementation used by the
//! built-in `catalog()`.

mod body;
mod catalog;
mod types;

pub use body::{format_timestamp, order_search_body, product_search_body};
pub use catalog::{catalog, find, resolve, ResolvedStream};
pub use types::{
    BodyKind, PageRequest, PagingKind, QueryOptions, StreamCapabilities, StreamDescriptor,
    DEFAULT_PAGE_SIZE,
};
