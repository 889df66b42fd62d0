//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Table helpers: case-insensitive search, sort, and pagination.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Rows per page when the caller does not ask for a size.
pub const DEFAULT_PER_PAGE: usize = 10;
/// Largest page size a caller may request.
pub const MAX_PER_PAGE: usize = 100;

/// Records exposing text for the table search box.
pub trait Searchable {
    /// Columns the search box looks into, in display order.
    fn search_fields(&self) -> Vec<&str>;

    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Records sortable by a column key.
pub trait Sortable {
    /// Column identifier, usually a small enum.
    type Key: Copy;

    /// Ascending order of `self` against `other` on the `key` column.
    fn compare_by(&self, other: &Self, key: Self::Key) -> Ordering;
}

/// Sort order, `asc` or `desc` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// 1-based page request. Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Page 0 becomes page 1; `per_page` is clamped to `1..=MAX_PER_PAGE`.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }
}

/// One page of a table plus the totals the pager needs.
///
/// A page past the end has no items but still reports the real `total`
/// and `total_pages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching rows across all pages.
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Convert the items, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Slice `items` into the requested page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let request = PageRequest::new(request.page, request.per_page);
    let total = items.len();
    let total_pages = total.div_ceil(request.per_page);
    let start = (request.page - 1).saturating_mul(request.per_page);
    let items = items
        .into_iter()
        .skip(start)
        .take(request.per_page)
        .collect();
    Page {
        items,
        total,
        page: request.page,
        per_page: request.per_page,
        total_pages,
    }
}

/// Search, sort, and page parameters for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<K> {
    pub search: Option<String>,
    pub sort_by: Option<K>,
    pub direction: SortDirection,
    pub page: PageRequest,
}

impl<K> Default for ListQuery<K> {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: None,
            direction: SortDirection::Asc,
            page: PageRequest::default(),
        }
    }
}

impl<K: Copy> ListQuery<K> {
    /// Case-insensitive substring filter. Blank text matches everything.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Order by `key`. Without a key the input order is kept.
    pub fn sort(mut self, key: K, direction: SortDirection) -> Self {
        self.sort_by = Some(key);
        self.direction = direction;
        self
    }

    /// Select a page; see [`PageRequest::new`] for clamping.
    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.page = PageRequest::new(page, per_page);
        self
    }

    /// Apply search and sort without paging (used by exports).
    pub fn filter_sorted<T>(&self, items: Vec<T>) -> Vec<T>
    where
        T: Searchable + Sortable<Key = K>,
    {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let mut items: Vec<T> = match needle {
            Some(needle) => items.into_iter().filter(|i| i.matches(&needle)).collect(),
            None => items,
        };
        if let Some(key) = self.sort_by {
            items.sort_by(|a, b| {
                let ordering = a.compare_by(b, key);
                match self.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
        items
    }

    /// Search, sort, then paginate.
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T>
    where
        T: Searchable + Sortable<Key = K>,
    {
        paginate(self.filter_sorted(items), self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, u32);

    impl Searchable for Row {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.0]
        }
    }

    impl Sortable for Row {
        type Key = ();

        fn compare_by(&self, other: &Self, _key: ()) -> Ordering {
            self.1.cmp(&other.1)
        }
    }

    fn rows() -> Vec<Row> {
        vec![Row("Akta", 3), Row("Sertifikat", 1), Row("akta kredit", 2)]
    }

    #[test]
    fn search_is_case_insensitive() {
        let page = ListQuery::default().search("AKTA").apply(rows());
        assert_eq!(page.total, 2);
    }

    #[test]
    fn sort_desc_then_page() {
        let page = ListQuery::default()
            .sort((), SortDirection::Desc)
            .page(2, 2)
            .apply(rows());
        assert_eq!(page.items, vec![Row("Sertifikat", 1)]);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn page_bounds_are_clamped() {
        let page = paginate((0..250).collect::<Vec<_>>(), PageRequest { page: 0, per_page: 500 });
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, MAX_PER_PAGE);
        assert_eq!(page.items.len(), 100);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = paginate(vec![1, 2, 3], PageRequest::new(9, 2));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn empty_input_has_zero_pages() {
        let page: Page<u8> = paginate(Vec::new(), PageRequest::default());
        assert_eq!(page.total_pages, 0);
    }
}
