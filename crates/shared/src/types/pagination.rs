//! Pagination types for list queries.

use serde::{Deserialize, Serialize};

/// Upper bound on the page size a caller may request.
pub const MAX_PER_PAGE: u32 = 200;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Creates a page request, clamping to sane bounds.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Calculates the offset for queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * self.limit()
    }

    /// Returns the limit for queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page.clamp(1, MAX_PER_PAGE))
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(request.limit())
        };

        Self {
            data,
            meta: PageMeta {
                page: request.page.max(1),
                per_page: request.per_page.clamp(1, MAX_PER_PAGE),
                total,
                total_pages,
            },
        }
    }

    /// Total number of matching items.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.meta.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 20, 0)]
    #[case(2, 20, 20)]
    #[case(3, 5, 10)]
    #[case(0, 10, 0)]
    fn test_offset(#[case] page: u32, #[case] per_page: u32, #[case] expected: u64) {
        let request = PageRequest { page, per_page };
        assert_eq!(request.offset(), expected);
    }

    #[test]
    fn test_default_page_request() {
        let request = PageRequest::default();
        assert_eq!(request.page, 1);
        assert_eq!(request.limit(), 20);
    }

    #[test]
    fn test_new_clamps_bounds() {
        let request = PageRequest::new(0, 10_000);
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, MAX_PER_PAGE);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(20, 1)]
    #[case(21, 2)]
    #[case(100, 5)]
    fn test_total_pages(#[case] total: u64, #[case] expected: u64) {
        let response: PageResponse<u8> = PageResponse::new(vec![], PageRequest::default(), total);
        assert_eq!(response.meta.total_pages, expected);
        assert_eq!(response.total(), total);
    }
}
