//! Page-number pagination for list endpoints

use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw query parameters. Kept as strings so that junk values fall back
/// to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// A resolved page window over `total_count` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

impl PageWindow {
    /// Resolves requested page numbers the forgiving way: non-numeric or
    /// non-positive pages select the first page, pages past the end select
    /// the last one. An empty result set still has one (empty) page.
    pub fn resolve(params: &PageParams, total_count: i64) -> Self {
        let page_size = params
            .page_size
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        let total_pages = if total_count <= 0 {
            1
        } else {
            (total_count + page_size - 1) / page_size
        };

        let page = params
            .page
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1)
            .min(total_pages);

        Self {
            page,
            page_size,
            total_count: total_count.max(0),
            total_pages,
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}
