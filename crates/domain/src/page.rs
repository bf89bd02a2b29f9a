//! Cloud Director list-response envelope and pagination parameters.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 100;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PageParams
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Normalized pagination parameters. Construct via [`PageParams::normalize`]
/// so the clamping rules are applied exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub page_size: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        PageParams {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    /// Apply defaults and clamps: `page >= 1`, `1 <= page_size <= 100`.
    /// Out-of-range values fall back to the defaults rather than erroring;
    /// oversized pages are clamped to the maximum.
    pub fn normalize(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p,
            _ => DEFAULT_PAGE,
        };
        let page_size = match page_size {
            Some(s) if s >= 1 => s.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        PageParams { page, page_size }
    }

    /// SQL OFFSET for this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// `ceil(total / page_size)`, 0 when the result set is empty.
    pub fn page_count(&self, result_total: i64) -> i64 {
        if result_total <= 0 {
            0
        } else {
            (result_total + self.page_size - 1) / self.page_size
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Page<T>
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The list-response envelope shared by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub result_total: i64,
    pub page_count: i64,
    pub page: i64,
    pub page_size: i64,
    /// Always present and always empty; kept for Cloud Director parity.
    pub associations: Vec<serde_json::Value>,
    pub values: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(values: Vec<T>, result_total: i64, params: PageParams) -> Self {
        Page {
            result_total,
            page_count: params.page_count(result_total),
            page: params.page,
            page_size: params.page_size,
            associations: Vec::new(),
            values,
        }
    }

    /// Paginate an already-materialized, already-sorted collection.
    pub fn slice(all: Vec<T>, params: PageParams) -> Self {
        let result_total = all.len() as i64;
        let start = params.offset().min(result_total) as usize;
        let end = (params.offset() + params.limit()).min(result_total) as usize;
        let values = all.into_iter().skip(start).take(end - start).collect();
        Page::new(values, result_total, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let p = PageParams::normalize(None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 25);
    }

    #[test]
    fn negative_and_zero_fall_back() {
        let p = PageParams::normalize(Some(-3), Some(0));
        assert_eq!(p, PageParams::default());
    }

    #[test]
    fn oversized_page_size_is_clamped() {
        let p = PageParams::normalize(Some(2), Some(5000));
        assert_eq!(p.page_size, MAX_PAGE_SIZE);
        assert_eq!(p.page, 2);
    }

    #[test]
    fn page_count_math() {
        let p = PageParams::normalize(Some(1), Some(2));
        assert_eq!(p.page_count(0), 0);
        assert_eq!(p.page_count(1), 1);
        assert_eq!(p.page_count(2), 1);
        assert_eq!(p.page_count(5), 3);
    }

    #[test]
    fn slice_matches_offsets() {
        let params = PageParams::normalize(Some(2), Some(2));
        let page = Page::slice(vec![0, 1, 2, 3, 4], params);
        assert_eq!(page.result_total, 5);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.values, vec![2, 3]);
    }

    #[test]
    fn slice_past_the_end_is_empty() {
        let params = PageParams::normalize(Some(9), Some(25));
        let page = Page::slice(vec![1, 2, 3], params);
        assert!(page.values.is_empty());
        assert_eq!(page.result_total, 3);
    }

    #[test]
    fn envelope_serializes_camel_case() {
        let page = Page::new(vec![1], 1, PageParams::default());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["resultTotal"], 1);
        assert_eq!(json["pageCount"], 1);
        assert_eq!(json["pageSize"], 25);
        assert!(json["associations"].as_array().unwrap().is_empty());
    }
}
