//! Offset pagination: request parameters, the page container returned by list queries,
//! and the page arithmetic helpers built on top of it.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Direction of the creation-timestamp sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Pagination parameters. `limit` is 1..=100, `offset` is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PaginationParams {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort_order: SortOrder::Asc,
        }
    }
}

impl PaginationParams {
    pub fn new(limit: i64, offset: i64, sort_order: SortOrder) -> Self {
        Self {
            limit,
            offset,
            sort_order,
        }
    }
}

/// One page of results. `total` counts every matching row, not only this page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, total: i64, params: &PaginationParams) -> Self {
        Self {
            total,
            offset: params.offset,
            limit: params.limit,
            results,
        }
    }

    pub fn total_pages(&self) -> i64 {
        calculate_total_pages(self.total, self.limit)
    }

    pub fn has_next(&self) -> bool {
        has_next_page(self.total, self.offset, self.limit)
    }

    pub fn has_previous(&self) -> bool {
        has_previous_page(self.offset)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            offset: self.offset,
            limit: self.limit,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

pub fn calculate_total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

pub fn has_next_page(total: i64, offset: i64, limit: i64) -> bool {
    offset + limit < total
}

pub fn has_previous_page(offset: i64) -> bool {
    offset > 0
}
