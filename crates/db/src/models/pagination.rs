use sea_orm::{
    ColumnTrait,
    sea_query::{Expr, Func},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest row offset a SQL backend accepts.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, TS)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Pages past the last representable offset are pinned to it, so the
    /// request stays an empty page instead of overflowing.
    pub fn new(page: Option<u64>, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        let last_page = MAX_OFFSET / page_size + 1;
        Self {
            page: page.unwrap_or(1).clamp(1, last_page),
            page_size,
        }
    }

    /// Zero-based index as expected by sea-orm paginators.
    pub fn index(&self) -> u64 {
        self.page.saturating_sub(1)
    }

    pub fn offset(&self) -> usize {
        let offset = self.index().saturating_mul(self.page_size);
        usize::try_from(offset).unwrap_or(usize::MAX)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, DEFAULT_PAGE_SIZE)
    }
}

pub fn total_pages(count: u64, page_size: u64) -> u64 {
    count.div_ceil(page_size.max(1)).max(1)
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, count: u64, request: PageRequest) -> Self {
        Self {
            items,
            count,
            page: request.page,
            page_size: request.page_size,
            total_pages: total_pages(count, request.page_size),
        }
    }

    /// Pages an already filtered and ordered result set.
    pub fn from_all(all: Vec<T>, request: PageRequest) -> Self {
        let count = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.page_size as usize)
            .collect();
        Self::new(items, count, request)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

/// Case-insensitive substring match, portable across SQLite and Postgres.
pub fn contains_ci<C: ColumnTrait>(column: C, needle: &str) -> Expr {
    use sea_orm::sea_query::ExprTrait;
    let pattern = format!("%{}%", needle.trim().to_lowercase());
    Func::lower(Expr::col(column)).like(pattern)
}

/// Trimmed, non-empty search text.
pub fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|term| !term.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_boundaries() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(3, 0), 3);
    }

    #[test]
    fn page_request_clamps_to_first_page() {
        let request = PageRequest::new(Some(0), 10);
        assert_eq!(request.page, 1);
        assert_eq!(request.index(), 0);
        assert_eq!(PageRequest::new(Some(3), 10).offset(), 20);
    }

    #[test]
    fn in_memory_pages_slice_items() {
        let all: Vec<u32> = (1..=23).collect();
        let page = Page::from_all(all.clone(), PageRequest::new(Some(3), 10));
        assert_eq!(page.items, vec![21, 22, 23]);
        assert_eq!(page.count, 23);
        assert_eq!(page.total_pages, 3);

        let past_end = Page::from_all(all, PageRequest::new(Some(9), 10));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.page, 9);
    }

    #[test]
    fn huge_page_numbers_yield_an_empty_page() {
        let request = PageRequest::new(Some(u64::MAX), 10);
        assert_eq!(request.page, i64::MAX as u64 / 10 + 1);
        assert!(request.index().checked_mul(request.page_size).unwrap() <= i64::MAX as u64);

        let page = Page::from_all((1..=5).collect::<Vec<u32>>(), request);
        assert!(page.items.is_empty());
        assert_eq!(page.count, 5);
        assert_eq!(page.total_pages, 1);

        let single = PageRequest::new(Some(u64::MAX), 1);
        assert_eq!(single.index(), i64::MAX as u64);

        let raw = PageRequest {
            page: u64::MAX,
            page_size: u64::MAX,
        };
        assert_eq!(raw.offset(), usize::MAX);
    }
}
