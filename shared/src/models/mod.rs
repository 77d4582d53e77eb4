//! Data models
//!
//! Shared between agency-cloud and the frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Agency-side IDs are `i64` (BIGSERIAL); user IDs are UUID strings.
//! Timestamps are epoch milliseconds, calendar dates are `NaiveDate`.

pub mod agency;
pub mod claim;
pub mod compliance_item;
pub mod import;
pub mod labor_request;
pub mod message;
pub mod region;
pub mod serde_helpers;
pub mod trade;
pub mod user;

// Re-exports
pub use agency::*;
pub use claim::*;
pub use compliance_item::*;
pub use import::*;
pub use labor_request::*;
pub use message::*;
pub use region::*;
pub use trade::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints
pub const DEFAULT_PER_PAGE: i64 = 20;
/// Upper bound on page size
pub const MAX_PER_PAGE: i64 = 100;
/// Upper bound on the page number; keeps `OFFSET` far from overflow
pub const MAX_PAGE: i64 = 1_000_000;

/// `?page=&per_page=` query parameters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// 1-based page, clamped
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    /// SQL `(LIMIT, OFFSET)`
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page();
        (per_page, (self.page() - 1).saturating_mul(per_page))
    }
}

/// Paginated list payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        let per_page = pagination.per_page();
        Self {
            items,
            total,
            page: pagination.page(),
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamps() {
        let p = Pagination::default();
        assert_eq!(p.limit_offset(), (20, 0));

        let p = Pagination {
            page: Some(3),
            per_page: Some(500),
        };
        assert_eq!(p.limit_offset(), (100, 200));

        let p = Pagination {
            page: Some(-2),
            per_page: Some(0),
        };
        assert_eq!(p.limit_offset(), (1, 0));
    }

    #[test]
    fn test_pagination_huge_page_is_clamped() {
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(20),
        };
        let (limit, offset) = p.limit_offset();
        assert_eq!(limit, 20);
        assert_eq!(offset, (MAX_PAGE - 1) * 20);
        assert_eq!(p.page(), MAX_PAGE);
    }

    #[test]
    fn test_page_total_pages() {
        let p = Pagination {
            page: Some(2),
            per_page: Some(10),
        };
        let page = Page::new(vec![1, 2, 3], 31, &p);
        assert_eq!(page.total_pages, 4);
        assert_eq!(page.page, 2);

        let empty: Page<i32> = Page::new(vec![], 0, &p);
        assert_eq!(empty.total_pages, 0);
    }
}
