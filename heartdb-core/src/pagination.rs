//! Pagination for unfiltered listings

use serde::{Deserialize, Serialize};

/// Maximum items per page
const MAX_PER_PAGE: u32 = 500;

/// Default items per page
const DEFAULT_PER_PAGE: u32 = 50;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page (max 500)
    pub per_page: u32,
}

impl Pagination {
    /// Create pagination with clamping.
    ///
    /// - Page is clamped to minimum of 1
    /// - Per page is clamped to 1..=500
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Number of documents to skip. Page 0 reads as page 1.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page())
    }

    /// Maximum number of documents to return, never 0 (which would mean
    /// "no limit" to the server).
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page())
    }

    fn per_page(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_calculation() {
        assert_eq!(Pagination::new(1, 10).skip(), 0);
        assert_eq!(Pagination::new(2, 10).skip(), 10);
        assert_eq!(Pagination::new(3, 25).skip(), 50);
    }

    #[test]
    fn clamps_page() {
        let p = Pagination::new(0, 10);
        assert_eq!(p.page, 1);
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn clamps_per_page() {
        assert_eq!(Pagination::new(1, 0).per_page, 1);
        assert_eq!(Pagination::new(1, 9_999).per_page, 500);
    }

    #[test]
    fn deserialized_out_of_range_values_are_clamped() {
        let p: Pagination = serde_json::from_str(r#"{"page":0,"per_page":10}"#).unwrap();
        assert_eq!(p.skip(), 0);
        assert_eq!(p.limit(), 10);

        let p: Pagination = serde_json::from_str(r#"{"page":3,"per_page":0}"#).unwrap();
        assert_eq!(p.skip(), 2);
        assert_eq!(p.limit(), 1);

        let p: Pagination = serde_json::from_str(r#"{"page":2,"per_page":100000}"#).unwrap();
        assert_eq!(p.skip(), 500);
        assert_eq!(p.limit(), 500);
    }

    #[test]
    fn default_matches_first_fifty() {
        let p = Pagination::default();
        assert_eq!(p.skip(), 0);
        assert_eq!(p.limit(), 50);
    }
}
