use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;

/// Page request after clamping to configured bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn clamp(page: Option<u32>, per_page: Option<u32>, config: &PaginationConfig) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page
            .unwrap_or(config.default_per_page)
            .clamp(1, config.max_per_page.max(1));
        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        let per_page = request.per_page.max(1) as i64;
        let total_pages = ((total + per_page - 1) / per_page) as u32;
        Self {
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }
}

/// The `{pagination, items}` envelope every list route returns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub pagination: Pagination,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            pagination: self.pagination,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig { default_per_page: 20, max_per_page: 100 }
    }

    #[test]
    fn clamps_page_and_size() {
        assert_eq!(PageRequest::clamp(None, None, &config()), PageRequest { page: 1, per_page: 20 });
        assert_eq!(PageRequest::clamp(Some(0), Some(0), &config()), PageRequest { page: 1, per_page: 1 });
        assert_eq!(PageRequest::clamp(Some(3), Some(5000), &config()).per_page, 100);
    }

    #[test]
    fn offset_from_page() {
        let req = PageRequest { page: 3, per_page: 25 };
        assert_eq!(req.offset(), 50);
        assert_eq!(req.limit(), 25);
    }

    #[test]
    fn total_pages_round_up() {
        let p = Pagination::new(PageRequest { page: 1, per_page: 10 }, 21);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);

        let p = Pagination::new(PageRequest { page: 3, per_page: 10 }, 21);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn empty_result_has_no_pages() {
        let p = Pagination::new(PageRequest { page: 1, per_page: 10 }, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
    }
}
