//! Pagination utilities for list queries
//!
//! Pages are 1-based; `limit` defaults to 10 and is clamped to `1..=100`.

use serde::Serialize;

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
/// Highest page accepted; keeps `offset()` within a SQL `BIGINT`.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u64,
    /// items per page
    pub limit: u64,
}

impl Pagination {
    /// Build from optional query values, clamping to sane bounds.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self { page: page.unwrap_or(1), limit: limit.unwrap_or(DEFAULT_LIMIT) }.normalize()
    }

    pub fn normalize(self) -> Self {
        let page = self.page.clamp(1, MAX_PAGE);
        let limit = if self.limit == 0 { DEFAULT_LIMIT } else { self.limit.min(MAX_LIMIT) };
        Self { page, limit }
    }

    /// Number of records skipped before this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`; zero records means zero pages.
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, limit: DEFAULT_LIMIT } }
}

/// One page of a filtered, sorted result set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    /// Cut a page out of an already filtered and sorted set.
    pub fn slice(all: Vec<T>, p: Pagination) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(p.offset() as usize)
            .take(p.limit as usize)
            .collect();
        Self { items, total, page: p.page, pages: p.pages(total) }
    }
}
