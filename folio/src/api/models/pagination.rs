//! Shared pagination and ordering types for API query parameters.
//!
//! All list endpoints use page-based pagination with `page` and `limit`
//! parameters plus `sort`/`order` for result ordering. Values arrive as
//! query strings, so the numeric fields deserialize through `DisplayFromStr`.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Standard pagination parameters for list endpoints.
///
/// - `page`: 1-based page number (default: 1)
/// - `limit`: Maximum items to return (default: 10, max: 100)
/// - `sort`: column to order by (per-resource allow-list, default created_at)
/// - `order`: ASC or DESC (default: DESC)
///
/// `page` and `limit` are clamped so a hostile query can neither request
/// page zero nor drain the table in one response.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,

    /// Column to sort by; unknown columns fall back to the resource default
    pub sort: Option<String>,

    /// Sort direction, ASC or DESC (case-insensitive, default: DESC)
    pub order: Option<String>,
}

/// Validated sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl Pagination {
    /// Get the page number, clamped to at least 1.
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    /// Defaults to DEFAULT_LIMIT if not specified.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Row offset implied by page and limit.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    /// Resolve the sort column against a per-resource allow-list.
    ///
    /// The returned value is always one of the allow-list entries, so it is
    /// safe to interpolate into SQL. Unknown columns map to `default`.
    pub fn sort_column(&self, allowed: &[&'static str], default: &'static str) -> &'static str {
        match self.sort.as_deref() {
            Some(requested) => allowed.iter().copied().find(|c| *c == requested).unwrap_or(default),
            None => default,
        }
    }

    /// Resolve the sort direction, defaulting to descending.
    pub fn sort_order(&self) -> SortOrder {
        match self.order.as_deref() {
            Some(o) if o.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

/// Pagination metadata returned alongside every list response
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

/// Generic paginated response wrapper for list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    /// The items for the current page
    pub items: Vec<T>,
    /// Metadata for client-side pagination controls
    pub pagination: PageMeta,
}

impl<T: ToSchema> PaginatedResponse<T> {
    /// Wrap a page of items with metadata derived from the query
    pub fn new(items: Vec<T>, total_items: i64, pagination: &Pagination) -> Self {
        let limit = pagination.limit();
        Self {
            items,
            pagination: PageMeta {
                current_page: pagination.page(),
                // limit() is clamped to at least 1
                total_pages: (total_items + limit - 1) / limit,
                total_items,
                items_per_page: limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(page: Option<i64>, limit: Option<i64>) -> Pagination {
        Pagination {
            page,
            limit,
            sort: None,
            order: None,
        }
    }

    #[test]
    fn test_default_values() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_limit_clamping() {
        // Zero is clamped to 1
        assert_eq!(with(None, Some(0)).limit(), 1);

        // Negative is clamped to 1
        assert_eq!(with(None, Some(-5)).limit(), 1);

        // Over max is clamped to MAX_LIMIT
        assert_eq!(with(None, Some(1000)).limit(), MAX_LIMIT);

        // Valid value passes through
        assert_eq!(with(None, Some(50)).limit(), 50);
    }

    #[test]
    fn test_page_clamping() {
        // Zero and negative are clamped to 1
        assert_eq!(with(Some(0), None).page(), 1);
        assert_eq!(with(Some(-3), None).page(), 1);

        // Valid value passes through
        assert_eq!(with(Some(7), None).page(), 7);
    }

    #[test]
    fn test_offset() {
        assert_eq!(with(Some(1), Some(10)).offset(), 0);
        assert_eq!(with(Some(3), Some(25)).offset(), 50);
    }

    #[test]
    fn test_sort_column_allow_list() {
        let allowed = &["created_at", "title", "view_count"];

        let mut p = Pagination::default();
        assert_eq!(p.sort_column(allowed, "created_at"), "created_at");

        p.sort = Some("title".to_string());
        assert_eq!(p.sort_column(allowed, "created_at"), "title");

        // Unknown columns fall back to the default rather than erroring
        p.sort = Some("password_hash".to_string());
        assert_eq!(p.sort_column(allowed, "created_at"), "created_at");

        p.sort = Some("1; DROP TABLE posts".to_string());
        assert_eq!(p.sort_column(allowed, "created_at"), "created_at");
    }

    #[test]
    fn test_sort_order() {
        let mut p = Pagination::default();
        assert_eq!(p.sort_order(), SortOrder::Desc);

        p.order = Some("asc".to_string());
        assert_eq!(p.sort_order(), SortOrder::Asc);

        p.order = Some("ASC".to_string());
        assert_eq!(p.sort_order(), SortOrder::Asc);

        p.order = Some("sideways".to_string());
        assert_eq!(p.sort_order(), SortOrder::Desc);
    }

    #[test]
    fn test_string_encoded_numbers_deserialize() {
        let p: Pagination = serde_urlencoded::from_str("page=2&limit=25&sort=title&order=asc").unwrap();
        assert_eq!(p.page(), 2);
        assert_eq!(p.limit(), 25);
        assert_eq!(p.sort.as_deref(), Some("title"));
    }

    #[test]
    fn test_total_pages_arithmetic() {
        #[derive(serde::Serialize, utoipa::ToSchema)]
        struct Item;

        let p = with(Some(1), Some(10));
        let resp = PaginatedResponse::<Item>::new(vec![], 0, &p);
        assert_eq!(resp.pagination.total_pages, 0);
        assert_eq!(resp.pagination.total_items, 0);

        let resp = PaginatedResponse::<Item>::new(vec![], 21, &p);
        assert_eq!(resp.pagination.total_pages, 3);

        let resp = PaginatedResponse::<Item>::new(vec![], 20, &p);
        assert_eq!(resp.pagination.total_pages, 2);
    }
}
