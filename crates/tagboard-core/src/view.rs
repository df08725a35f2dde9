//! The tag list screen, minus rendering.
//!
//! [`TagListView`] wires the URL store, the debounced filter input and one
//! cache observer together. Input handlers only touch local state and the
//! URL; the cache is consulted when the host asks for a [`ListSnapshot`],
//! which is also when any needed fetch gets issued.

use crate::debounce::Debounced;
use crate::error::ApiError;
use crate::model::{Pagination, QueryKey, Tag};
use crate::params::{ParamStore, ViewParams};
use crate::query::{ObserverId, QueryCache};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Quiet period before the filter input counts as settled.
    pub debounce: Duration,
    /// Apply the settled filter automatically instead of waiting for an
    /// explicit submit.
    pub live_search: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            live_search: false,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    pub rows: Vec<Tag>,
    pub pagination: Option<Pagination>,
    /// First load of the key with nothing to show.
    pub is_loading: bool,
    /// Any fetch in flight for the key.
    pub is_fetching: bool,
    /// `rows` are from the previously displayed key.
    pub is_placeholder: bool,
    /// The applied filter matched nothing.
    pub is_empty: bool,
    pub error: Option<ApiError>,
    pub applied: ViewParams,
    pub raw_filter: String,
    pub debounced_filter: String,
}

#[derive(Debug)]
pub struct TagListView {
    params: ParamStore,
    raw_filter: String,
    debounced: Debounced<String>,
    observer: ObserverId,
    options: ViewOptions,
    /// Pagination last confirmed for an applied filter.
    known: Option<(String, Pagination)>,
}

impl TagListView {
    /// Open the screen at the location `query` (`"page=2&filter=rust"`).
    pub fn new(cache: &mut QueryCache, query: &str, options: ViewOptions) -> Self {
        let params = ParamStore::new(query);
        let raw_filter = params.current().filter;
        let debounced = Debounced::new(raw_filter.clone(), options.debounce);
        Self {
            params,
            raw_filter,
            debounced,
            observer: cache.subscribe(),
            options,
            known: None,
        }
    }

    #[must_use]
    pub const fn observer(&self) -> ObserverId {
        self.observer
    }

    #[must_use]
    pub const fn params(&self) -> &ParamStore {
        &self.params
    }

    #[must_use]
    pub const fn options(&self) -> ViewOptions {
        self.options
    }

    #[must_use]
    pub fn raw_filter(&self) -> &str {
        &self.raw_filter
    }

    /// Key the screen is showing, derived from the applied URL state.
    #[must_use]
    pub fn key(&self) -> QueryKey {
        let view = self.params.current();
        QueryKey::new(view.filter, view.page)
    }

    /// Next instant at which [`tick`](Self::tick) has work to do.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.debounced.deadline()
    }

    /// Replace the filter input text.
    pub fn type_filter(&mut self, text: &str, now: Instant) {
        text.clone_into(&mut self.raw_filter);
        self.debounced.set(self.raw_filter.clone(), now);
    }

    pub fn push_filter_char(&mut self, c: char, now: Instant) {
        let mut text = self.raw_filter.clone();
        text.push(c);
        self.type_filter(&text, now);
    }

    pub fn pop_filter_char(&mut self, now: Instant) {
        let mut text = self.raw_filter.clone();
        text.pop();
        self.type_filter(&text, now);
    }

    /// Advance the debounce clock. Returns `true` when the settled filter
    /// changed and the screen should redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(settled) = self.debounced.poll(now).cloned() else {
            return false;
        };
        debug!(filter = %settled, "filter input settled");
        if self.options.live_search {
            self.params.apply_filter(&settled);
        }
        true
    }

    /// Submit the filter input: resets to page 1 in the same navigation.
    pub fn apply_filter(&mut self) -> bool {
        self.debounced.flush();
        let filter = self.raw_filter.clone();
        self.params.apply_filter(&filter)
    }

    /// Jump to `page`, bounded by the last page once it is known.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        let page = self
            .pagination_for_applied()
            .map_or(page.max(1), |p| p.clamp(page));
        self.params.set_page(page)
    }

    /// No-op on the last page, and while the page count is unknown or zero.
    pub fn next_page(&mut self) -> bool {
        let page = self.params.current().page;
        match self.pagination_for_applied() {
            Some(p) if page < p.total_pages => self.params.set_page(page + 1),
            _ => false,
        }
    }

    pub fn prev_page(&mut self) -> bool {
        let page = self.params.current().page;
        if page > 1 {
            self.params.set_page(page - 1)
        } else {
            false
        }
    }

    pub fn back(&mut self) -> bool {
        let moved = self.params.back();
        if moved {
            self.reset_input();
        }
        moved
    }

    pub fn forward(&mut self) -> bool {
        let moved = self.params.forward();
        if moved {
            self.reset_input();
        }
        moved
    }

    /// Refetch the current key after an error.
    pub fn retry(&self, cache: &mut QueryCache) -> bool {
        cache.retry(self.observer)
    }

    /// Observe the current key and describe what to draw.
    pub fn snapshot(&mut self, cache: &mut QueryCache, now: Instant) -> ListSnapshot {
        let key = self.key();
        let state = cache.observe(self.observer, &key, now);

        let pagination = state.data.as_ref().map(|page| page.pagination());
        if let (Some(p), false) = (pagination, state.is_placeholder) {
            self.known = Some((key.filter.clone(), p));
        }
        let is_empty = !state.is_placeholder
            && state
                .data
                .as_ref()
                .is_some_and(|page| page.pagination().is_empty());

        ListSnapshot {
            rows: state
                .data
                .as_ref()
                .map(|page| page.items.clone())
                .unwrap_or_default(),
            pagination,
            is_loading: state.is_loading,
            is_fetching: state.is_fetching,
            is_placeholder: state.is_placeholder,
            is_empty,
            error: state.error,
            applied: self.params.current(),
            raw_filter: self.raw_filter.clone(),
            debounced_filter: self.debounced.value().clone(),
        }
    }

    /// Tear the screen down: no pending emission fires afterwards and the
    /// cache stops notifying this observer.
    pub fn close(mut self, cache: &mut QueryCache) {
        self.debounced.cancel();
        cache.unsubscribe(self.observer);
    }

    fn pagination_for_applied(&self) -> Option<Pagination> {
        let filter = self.params.current().filter;
        self.known
            .as_ref()
            .filter(|(known, _)| *known == filter)
            .map(|(_, p)| *p)
    }

    /// History navigation brings the input back in line with the URL.
    fn reset_input(&mut self) {
        self.raw_filter = self.params.current().filter;
        self.debounced = Debounced::new(self.raw_filter.clone(), self.options.debounce);
    }
}
