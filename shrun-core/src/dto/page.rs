//! Limit/offset paging

use serde::{Deserialize, Serialize};

/// Default page size when none is requested
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Limit/offset paging parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOffset {
    pub limit: usize,
    pub offset: usize,
}

impl Default for LimitOffset {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    /// Slices an already ordered collection into a page
    pub fn from_ordered(all: Vec<T>, params: LimitOffset) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(params.offset)
            .take(params.limit)
            .collect();

        Self {
            items,
            total,
            limit: params.limit,
            offset: params.offset,
        }
    }
}
