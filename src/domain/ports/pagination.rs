//! Pagination types shared by repository ports.

use serde::Serialize;

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl PageRequest {
    pub const MAX_LIMIT: u32 = 1000;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    pub const fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.limit as i64
    }
}

/// A page of results plus the unpaginated total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            page: request.page,
            limit: request.limit,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_is_clamped() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, 1);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(3, 5000);
        assert_eq!(request.limit, PageRequest::MAX_LIMIT);
        assert_eq!(request.offset(), 2000);
    }

    #[test]
    fn test_total_pages() {
        let page: Paginated<u8> = Paginated { items: vec![], total_count: 101, page: 1, limit: 50 };
        assert_eq!(page.total_pages(), 3);
    }
}
