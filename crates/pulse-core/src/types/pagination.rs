//! Pagination types for list endpoints.
//!
//! Pulse uses limit/offset paging: `limit` is clamped to [1, 100] and
//! `offset` is a plain row offset, matching the public API contract.

use serde::{Deserialize, Serialize};

/// Default page size.
const DEFAULT_LIMIT: i64 = 20;
/// Maximum page size.
const MAX_LIMIT: i64 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Number of items to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: i64,
}

impl PageRequest {
    /// Create a new page request with clamped bounds.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset: offset.max(0),
        }
    }

    /// Return the SQL `LIMIT` value.
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Return the SQL `OFFSET` value.
    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T: Serialize> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total number of items matching the predicate.
    pub total: i64,
    /// The limit the page was fetched with.
    pub limit: i64,
    /// The offset the page was fetched with.
    pub offset: i64,
    /// Whether more items exist past this page.
    pub has_more: bool,
}

impl<T: Serialize> PageResponse<T> {
    /// Create a new paginated response.
    pub fn new(items: Vec<T>, page: &PageRequest, total: i64) -> Self {
        let has_more = page.offset() + (items.len() as i64) < total;
        Self {
            items,
            total,
            limit: page.limit(),
            offset: page.offset(),
            has_more,
        }
    }

    /// Map the items to another type, keeping the paging metadata.
    pub fn map<U: Serialize>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
            has_more: self.has_more,
        }
    }
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}
