//! Pagination module
//!
//! Cursor types and the per-mode rules for computing the next cursor.
//!
//! # Modes
//!
//! - `Single` - one request per entity
//! - `Offset` - `start` offset advanced by the page's `count` while `next` is set
//! - `Currency` - the same entity re-requested once per currency code
//! - `IdList` - one request per configured id

mod strategies;
mod types;

pub use strategies::exceeds_ceiling;
pub use types::{Cursor, IdPlacement, PageMeta, PagingMode, OFFSET_CEILING};
