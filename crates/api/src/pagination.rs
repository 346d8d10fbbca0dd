//! Page-number pagination for list endpoints.

use foodgram_common::{AppError, AppResult, config::PaginationConfig};
use foodgram_core::Page;
use serde::{Deserialize, Serialize};

/// Largest offset the database accepts (`OFFSET` is a signed 64-bit value).
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// `page` and `limit` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Page size override.
    pub limit: Option<u64>,
}

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Resolve query parameters against the configured defaults.
    pub fn resolve(params: PageParams, config: &PaginationConfig) -> AppResult<Self> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::NotFound("Invalid page".to_string()));
        }

        let limit = params
            .limit
            .filter(|&l| l > 0)
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);

        // No table is that large; such a page cannot exist.
        if (page - 1).checked_mul(limit).is_none_or(|offset| offset > MAX_OFFSET) {
            return Err(AppError::NotFound("Invalid page".to_string()));
        }

        Ok(Self { page, limit })
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// `{count, next, previous, results}` envelope.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: Serialize> Paginated<T> {
    /// Build the envelope for one page.
    ///
    /// `query` is the request's raw query string; its other parameters are
    /// carried over into the `next` and `previous` links.
    pub fn new<U>(
        page: Page<U>,
        window: PageWindow,
        query: Option<&str>,
        project: impl FnMut(U) -> T,
    ) -> AppResult<Self> {
        // Only the first page may be empty.
        if window.page > 1 && window.offset() >= page.count {
            return Err(AppError::NotFound("Invalid page".to_string()));
        }

        let has_next = window.offset() + (page.items.len() as u64) < page.count;
        let next = has_next.then(|| page_link(query, window.page + 1));
        let previous = (window.page > 1).then(|| page_link(query, window.page - 1));

        Ok(Self {
            count: page.count,
            next,
            previous,
            results: page.items.into_iter().map(project).collect(),
        })
    }
}

/// Relative link to `page`, keeping every other query parameter.
fn page_link(query: Option<&str>, page: u64) -> String {
    let page_pair = format!("page={page}");
    let mut pairs: Vec<&str> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && *pair != "page" && !pair.starts_with("page="))
        .collect();
    pairs.push(&page_pair);

    format!("?{}", pairs.join("&"))
}
