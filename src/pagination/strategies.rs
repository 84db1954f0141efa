//! Next-cursor rules per paging mode

use super::types::{Cursor, IdPlacement, PageMeta, PagingMode, OFFSET_CEILING};
use std::collections::HashSet;

impl PagingMode {
    /// Whether an entity has anything left to request
    pub fn has_work(&self, removed: &HashSet<String>) -> bool {
        match self {
            PagingMode::Currency(codes) => codes.iter().any(|c| !removed.contains(c)),
            PagingMode::IdList { ids, .. } => !ids.is_empty(),
            PagingMode::Single | PagingMode::Offset => true,
        }
    }

    /// The cursor a request is actually built from
    ///
    /// `None` means "not started": offset paging omits `start`, currency
    /// paging uses the first currency still in the working set, id lists
    /// start at the first id.
    pub fn effective_cursor(
        &self,
        cursor: Option<Cursor>,
        removed: &HashSet<String>,
    ) -> Option<Cursor> {
        match (self, cursor) {
            (_, Some(Cursor::Currency(i))) => self.next_currency_from(i, removed),
            (PagingMode::Currency(_), None) => self.next_currency_from(0, removed),
            (PagingMode::IdList { .. }, None) => Some(Cursor::IdIndex(0)),
            (_, cursor) => cursor,
        }
    }

    /// Cursor following `current` after a successful page
    pub fn next_cursor(
        &self,
        current: Option<Cursor>,
        meta: &PageMeta,
        removed: &HashSet<String>,
    ) -> Option<Cursor> {
        match self {
            PagingMode::Single => None,
            PagingMode::Offset => {
                if !meta.has_more {
                    return None;
                }
                let prev = match current {
                    Some(Cursor::Offset(n)) => n,
                    _ => 0,
                };
                Some(Cursor::Offset(prev.saturating_add(meta.count)))
            }
            PagingMode::Currency(_) => self.advance_currency(current, removed),
            PagingMode::IdList { ids, .. } => match current {
                Some(Cursor::IdIndex(i)) if i + 1 < ids.len() => Some(Cursor::IdIndex(i + 1)),
                None if ids.len() > 1 => Some(Cursor::IdIndex(1)),
                _ => None,
            },
        }
    }

    /// Cursor after the current currency was rejected as unsupported
    pub fn advance_currency(
        &self,
        current: Option<Cursor>,
        removed: &HashSet<String>,
    ) -> Option<Cursor> {
        let next = match current {
            Some(Cursor::Currency(i)) => i + 1,
            _ => 0,
        };
        self.next_currency_from(next, removed)
    }

    /// Currency code for a cursor
    pub fn currency(&self, cursor: Option<Cursor>) -> Option<&str> {
        match (self, cursor) {
            (PagingMode::Currency(codes), Some(Cursor::Currency(i))) => {
                codes.get(i).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Id for a cursor, with where it belongs in the request
    pub fn id(&self, cursor: Option<Cursor>) -> Option<(&str, IdPlacement)> {
        match (self, cursor) {
            (PagingMode::IdList { ids, placement }, Some(Cursor::IdIndex(i))) => {
                ids.get(i).map(|id| (id.as_str(), *placement))
            }
            _ => None,
        }
    }

    /// Whether the stream pages by offset
    pub fn is_offset(&self) -> bool {
        matches!(self, PagingMode::Offset)
    }

    fn next_currency_from(&self, start: usize, removed: &HashSet<String>) -> Option<Cursor> {
        match self {
            PagingMode::Currency(codes) => codes
                .iter()
                .enumerate()
                .skip(start)
                .find(|(_, code)| !removed.contains(*code))
                .map(|(i, _)| Cursor::Currency(i)),
            _ => None,
        }
    }
}

/// Whether requesting `page_size` rows from `start` would pass the ceiling
pub fn exceeds_ceiling(start: u64, page_size: u32) -> bool {
    start.saturating_add(u64::from(page_size)) > OFFSET_CEILING
}
