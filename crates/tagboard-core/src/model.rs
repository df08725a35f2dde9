//! Data model shared by the cache, the remote client and the view.
//!
//! Wire types mirror the tag collection service (`GET /tags`, `POST /tags`);
//! [`PageResult`] is the immutable, cache-owned projection of one response.

use serde::{Deserialize, Serialize};

/// Composite key identifying one cacheable server query.
///
/// Equality is structural: two keys are the same query iff filter and page
/// are both equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey {
    pub filter: String,
    pub page: u32,
}

impl QueryKey {
    /// Build a key, clamping `page` to the first page when it is zero.
    #[must_use]
    pub fn new(filter: impl Into<String>, page: u32) -> Self {
        Self {
            filter: filter.into(),
            page: page.max(1),
        }
    }

    /// Page 1 of the unfiltered collection.
    #[must_use]
    pub fn first() -> Self {
        Self::new("", 1)
    }

    /// The same filter, a different page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self::new(self.filter.clone(), page)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[filter={:?} page={}]", self.filter, self.page)
    }
}

/// A tag as returned by the collection service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub title: String,
    #[serde(rename = "amountOfVideos", default)]
    pub video_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Paginated envelope of `GET /tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagResponse {
    pub first: u32,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub last: u32,
    pub pages: u32,
    pub items: u64,
    pub data: Vec<Tag>,
}

/// Body of `POST /tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub title: String,
    pub slug: String,
    #[serde(rename = "amountOfVideos")]
    pub video_count: u64,
}

/// One fetched page, as held by the query cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    pub items: Vec<Tag>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub page_size: u32,
}

impl PageResult {
    #[must_use]
    pub fn from_response(key: &QueryKey, page_size: u32, response: TagResponse) -> Self {
        Self {
            items: response.data,
            current_page: key.page,
            total_pages: response.pages,
            total_items: response.items,
            page_size,
        }
    }

    #[must_use]
    pub const fn pagination(&self) -> Pagination {
        Pagination {
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            page_size: self.page_size,
        }
    }
}

/// Navigation facts derived from a [`PageResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub page_size: u32,
}

impl Pagination {
    /// Nothing matched: render the empty state, never offer another page.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_pages == 0 || self.total_items == 0
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    #[must_use]
    pub const fn prev(&self) -> Option<u32> {
        if self.has_prev() {
            Some(self.current_page - 1)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn next(&self) -> Option<u32> {
        if self.has_next() {
            Some(self.current_page + 1)
        } else {
            None
        }
    }

    /// Last navigable page; 1 when the collection is empty.
    #[must_use]
    pub const fn last(&self) -> u32 {
        if self.total_pages == 0 {
            1
        } else {
            self.total_pages
        }
    }

    #[must_use]
    pub const fn clamp(&self, page: u32) -> u32 {
        if page < 1 {
            1
        } else if page > self.last() {
            self.last()
        } else {
            page
        }
    }

    /// 1-based inclusive item range shown on this page.
    #[must_use]
    pub fn item_range(&self, shown: usize) -> Option<(u64, u64)> {
        if self.is_empty() || shown == 0 {
            return None;
        }
        let start =
            u64::from(self.current_page.saturating_sub(1)) * u64::from(self.page_size) + 1;
        let shown = u64::try_from(shown).unwrap_or(u64::MAX);
        let end = start.saturating_add(shown - 1);
        Some((start, end.min(self.total_items)))
    }
}
