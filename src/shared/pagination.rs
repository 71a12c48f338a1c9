//! Pagination parameters and the paginated response envelope.

use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Page/limit query parameters, clamped to sane bounds.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: None,
            limit: None,
        }
    }
}

/// Pagination metadata returned alongside list items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Standard list response envelope: `{items, pagination}`.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, params: &PageParams, total: i64) -> Self {
        let limit = params.limit();
        Self {
            items,
            pagination: Pagination {
                page: params.page(),
                limit,
                total,
                total_pages: (total + limit - 1) / limit.max(1),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let p = PageParams::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 20);
        assert_eq!(p.offset(), 0);

        let p = PageParams {
            page: Some(0),
            limit: Some(5000),
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 100);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PageParams {
            page: Some(2),
            limit: Some(20),
        };
        let page = Paginated::new(vec![1, 2, 3], &params, 41);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.page, 2);
        assert_eq!(page.pagination.total, 41);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page: Paginated<i32> = Paginated::new(vec![], &PageParams::default(), 0);
        assert_eq!(page.pagination.total_pages, 0);
    }
}
