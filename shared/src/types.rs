//! Common types used across the backend

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

/// Upper bound for a single page
pub const MAX_PER_PAGE: u32 = 500;

impl Pagination {
    /// Rows to return, clamped to `1..=MAX_PER_PAGE`
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page.clamp(1, MAX_PER_PAGE))
    }

    /// Rows to skip
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * self.limit()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offsets() {
        let page = Pagination { page: 3, per_page: 20 };
        assert_eq!(page.limit(), 20);
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_pagination_clamps() {
        let page = Pagination { page: 0, per_page: 10_000 };
        assert_eq!(page.limit(), i64::from(MAX_PER_PAGE));
        assert_eq!(page.offset(), 0);
    }
}
