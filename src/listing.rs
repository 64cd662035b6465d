use serde::Serialize;

use crate::services::TransactionRecord;

/// Implemented by every entity type shown in a filterable table.
pub trait Listed {
    fn list_id(&self) -> &str;
    /// Fields the free-text search matches against, already string-coerced.
    fn search_fields(&self) -> Vec<String>;
    fn status_label(&self) -> Option<&str> {
        None
    }
    fn kind_label(&self) -> Option<&str> {
        None
    }
}

pub const FILTER_ALL: &str = "All";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "item")]
pub enum PageItem {
    Number { page: usize, current: bool },
    Ellipsis,
}

/// Client-held view over a full backend collection: AND-combined filters,
/// 1-indexed slicing, and surgical cache patches after mutations. Each
/// concrete view supplies only its entity type and page size.
#[derive(Clone, Debug)]
pub struct ListController<T> {
    items: Vec<T>,
    search: String,
    status: String,
    kind: String,
    page: usize,
    page_size: usize,
}

impl<T: Listed> ListController<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            search: String::new(),
            status: FILTER_ALL.into(),
            kind: FILTER_ALL.into(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Replaces the whole cached collection, e.g. after a refetch.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.page = 1;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    // Filter mutations reset the page so the view never lands past the end
    // of the newly filtered collection.

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
        self.page = 1;
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.page = 1;
    }

    pub fn set_kind(&mut self, kind: &str) {
        self.kind = kind.to_string();
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    fn matches(&self, item: &T) -> bool {
        let query = self.search.trim().to_lowercase();
        let search_ok = query.is_empty()
            || item
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&query));
        let status_ok = self.status == FILTER_ALL
            || item.status_label().is_some_and(|label| label == self.status);
        let kind_ok =
            self.kind == FILTER_ALL || item.kind_label().is_some_and(|label| label == self.kind);
        search_ok && status_ok && kind_ok
    }

    pub fn filtered(&self) -> Vec<&T> {
        self.items.iter().filter(|item| self.matches(item)).collect()
    }

    pub fn total_pages(&self) -> usize {
        let filtered = self.filtered().len();
        filtered.div_ceil(self.page_size)
    }

    /// The slice shown on the current page: `[(page-1)*size, page*size)` over
    /// the filtered collection.
    pub fn visible(&self) -> Vec<&T> {
        self.filtered()
            .into_iter()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .collect()
    }

    /// Rewrites the single cached item with the given id in place. Returns
    /// false when no cached item matches.
    pub fn patch<F: FnOnce(&mut T)>(&mut self, id: &str, apply: F) -> bool {
        match self.items.iter_mut().find(|item| item.list_id() == id) {
            Some(item) => {
                apply(item);
                true
            }
            None => false,
        }
    }

    /// Drops the cached item with the given id, leaving every other item
    /// untouched.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.list_id() != id);
        self.items.len() < before
    }

    /// Windowed pagination controls: up to `window` numbered buttons centered
    /// on the current page, with first/last shortcuts and ellipses when the
    /// window does not reach a boundary.
    pub fn page_index(&self, window: usize) -> Vec<PageItem> {
        page_index(self.page, self.total_pages(), window)
    }
}

pub fn page_index(current: usize, total_pages: usize, window: usize) -> Vec<PageItem> {
    if total_pages == 0 {
        return Vec::new();
    }
    let window = window.max(1);
    let current = current.clamp(1, total_pages);
    let start = current.saturating_sub(window / 2).max(1);
    let end = (start + window - 1).min(total_pages);

    let mut index = Vec::new();
    if start > 1 {
        index.push(PageItem::Number {
            page: 1,
            current: false,
        });
        if start > 2 {
            index.push(PageItem::Ellipsis);
        }
    }
    for page in start..=end {
        index.push(PageItem::Number {
            page,
            current: page == current,
        });
    }
    if end < total_pages {
        if end < total_pages - 1 {
            index.push(PageItem::Ellipsis);
        }
        index.push(PageItem::Number {
            page: total_pages,
            current: false,
        });
    }
    index
}

impl Listed for TransactionRecord {
    fn list_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.user_id.clone(),
            self.amount.to_string(),
            self.kind.as_str().to_string(),
            self.created_at.format("%Y-%m-%d").to_string(),
        ]
    }

    fn status_label(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn kind_label(&self) -> Option<&str> {
        Some(self.kind.as_str())
    }
}
