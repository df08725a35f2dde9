//! Query cache and fetch coordination.
//!
//! The cache never performs I/O. Observing a key that needs data enqueues a
//! [`FetchRequest`]; the host drains requests with
//! [`QueryCache::take_requests`], runs them however it likes (inline, on a
//! worker thread), and feeds each result back through
//! [`QueryCache::complete`]. Every transition is therefore a discrete event on
//! the caller's loop and the cache needs no locking.
//!
//! Guarantees:
//!
//! - At most one entry per [`QueryKey`], and at most one fetch in flight per
//!   key. Observing a key that is already loading never issues a second
//!   request.
//! - Results are stored under the key they were requested for, even if no
//!   observer is looking at that key any more.
//! - A failure is recorded against its own key only; no other entry changes.
//! - While an observer's new key loads for the first time, the observer keeps
//!   seeing the data it last displayed, flagged as a placeholder.

use crate::error::ApiError;
use crate::model::{PageResult, QueryKey, TagResponse};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Identifies one issued fetch. Completions are matched by id, never by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchId(u64);

/// Identifies one view observing the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Work the host must perform and report back via [`QueryCache::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: FetchId,
    pub key: QueryKey,
    pub page_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// How long a successful result counts as fresh.
    pub stale_time: Duration,
    /// `_per_page` sent with every fetch.
    pub page_size: u32,
    /// How long an entry nobody observes is kept before it is evicted.
    pub gc_time: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(60),
            page_size: 10,
            gc_time: Duration::from_secs(300),
        }
    }
}

/// What an observer should render for its active key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub data: Option<Arc<PageResult>>,
    /// No data of its own yet and a fetch is in flight.
    pub is_loading: bool,
    /// Any fetch in flight for the key, including background refreshes.
    pub is_fetching: bool,
    /// `data` belongs to the previously displayed key.
    pub is_placeholder: bool,
    /// `data` is shown but has been invalidated or outlived `stale_time`.
    pub is_stale: bool,
    pub error: Option<ApiError>,
}

/// Read-only view of one cache entry, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub data: Option<Arc<PageResult>>,
    pub fetched_at: Option<Instant>,
    pub invalidated: bool,
    pub fetching: bool,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: FetchId,
    invalidated_during: bool,
}

#[derive(Debug, Default)]
struct Entry {
    data: Option<Arc<PageResult>>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    error: Option<ApiError>,
    in_flight: Option<InFlight>,
    /// Last time any observer pointed at this key.
    observed_at: Option<Instant>,
}

impl Entry {
    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        !self.invalidated
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < stale_time)
    }
}

#[derive(Debug, Default)]
struct Observer {
    key: Option<QueryKey>,
    last_data: Option<Arc<PageResult>>,
}

/// Session-scoped cache of page results keyed by [`QueryKey`].
///
/// Created once at the composition root and passed to every view; dropping
/// it (or calling [`QueryCache::clear`]) ends the session.
#[derive(Debug)]
pub struct QueryCache {
    options: CacheOptions,
    entries: HashMap<QueryKey, Entry>,
    observers: BTreeMap<ObserverId, Observer>,
    in_flight: HashMap<FetchId, QueryKey>,
    pending: Vec<FetchRequest>,
    next_fetch: u64,
    next_observer: u64,
}

impl QueryCache {
    #[must_use]
    pub fn new(options: CacheOptions) -> Self {
        Self {
            options,
            entries: HashMap::new(),
            observers: BTreeMap::new(),
            in_flight: HashMap::new(),
            pending: Vec::new(),
            next_fetch: 1,
            next_observer: 1,
        }
    }

    #[must_use]
    pub const fn options(&self) -> CacheOptions {
        self.options
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Register a view. The returned id stays valid until
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&mut self) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.insert(id, Observer::default());
        id
    }

    /// Detach a view. Its in-flight fetches keep running and their results
    /// are still cached, but nothing is reported to it any more.
    pub fn unsubscribe(&mut self, observer: ObserverId) {
        self.observers.remove(&observer);
    }

    /// Point `observer` at `key` and return what it should render.
    ///
    /// Issues a fetch when the key has no data, when its data is stale, or
    /// when a previously failed key is observed again after looking at a
    /// different key. Repeated observation of the same failed key does not
    /// refetch; use [`retry`](Self::retry).
    pub fn observe(&mut self, observer: ObserverId, key: &QueryKey, now: Instant) -> QueryState {
        let Some(obs) = self.observers.get_mut(&observer) else {
            trace!(?observer, "observe on detached observer ignored");
            return QueryState::default();
        };
        let key_changed = obs.key.as_ref() != Some(key);
        if key_changed {
            obs.key = Some(key.clone());
        }

        let stale_time = self.options.stale_time;
        let entry = self.entries.entry(key.clone()).or_default();
        entry.observed_at = Some(now);
        let wants_data = entry.data.is_none() || !entry.is_fresh(now, stale_time);
        let may_retry = entry.error.is_none() || key_changed;
        if entry.in_flight.is_none() && wants_data && may_retry {
            self.start_fetch(key);
        }
        if key_changed {
            self.collect_garbage(now);
        }

        self.state_for(observer, now)
    }

    /// Current state for `observer` without triggering any fetch.
    pub fn state(&mut self, observer: ObserverId, now: Instant) -> QueryState {
        self.state_for(observer, now)
    }

    /// Re-issue the fetch for the observer's active key unless one is
    /// already in flight. Returns `true` when a request was issued.
    pub fn retry(&mut self, observer: ObserverId) -> bool {
        let Some(key) = self.observers.get(&observer).and_then(|o| o.key.clone()) else {
            return false;
        };
        if self
            .entries
            .get(&key)
            .is_some_and(|entry| entry.in_flight.is_some())
        {
            return false;
        }
        self.start_fetch(&key);
        true
    }

    // -----------------------------------------------------------------------
    // Fetch lifecycle
    // -----------------------------------------------------------------------

    /// Drain the requests issued since the last call.
    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn has_pending_requests(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of fetches issued and not yet completed.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Record the outcome of a fetch.
    ///
    /// Returns the observers whose active key is the completed key, i.e. the
    /// views that need to re-render. Unknown ids (superseded by
    /// [`clear`](Self::clear)) are ignored.
    pub fn complete(
        &mut self,
        id: FetchId,
        result: Result<TagResponse, ApiError>,
        now: Instant,
    ) -> Vec<ObserverId> {
        let Some(key) = self.in_flight.remove(&id) else {
            trace!(?id, "completion for unknown fetch ignored");
            return Vec::new();
        };
        let Some(entry) = self.entries.get_mut(&key) else {
            return Vec::new();
        };
        let Some(flight) = entry.in_flight.filter(|f| f.id == id) else {
            trace!(?id, %key, "completion for superseded fetch ignored");
            return Vec::new();
        };
        entry.in_flight = None;

        let refetch = match result {
            Ok(response) => {
                let page = PageResult::from_response(&key, self.options.page_size, response);
                debug!(%key, items = page.items.len(), pages = page.total_pages, "fetch completed");
                let page = Arc::new(page);
                for obs in self.observers.values_mut() {
                    if obs.key.as_ref() == Some(&key) {
                        obs.last_data = Some(Arc::clone(&page));
                    }
                }
                entry.data = Some(page);
                entry.fetched_at = Some(now);
                entry.error = None;
                entry.invalidated = flight.invalidated_during;
                flight.invalidated_during
            }
            Err(err) => {
                warn!(%key, error = %err, "fetch failed");
                entry.error = Some(err);
                false
            }
        };

        if refetch && self.is_observed(&key) {
            debug!(%key, "invalidated while in flight; refetching");
            self.start_fetch(&key);
        }

        self.observers_of(&key)
    }

    // -----------------------------------------------------------------------
    // Invalidation and lifecycle
    // -----------------------------------------------------------------------

    /// Mark every entry whose key satisfies `predicate` as stale and refetch
    /// the ones currently observed. Returns the number of entries marked.
    pub fn invalidate(&mut self, predicate: impl Fn(&QueryKey) -> bool) -> usize {
        let mut marked = 0;
        for (key, entry) in &mut self.entries {
            if !predicate(key) {
                continue;
            }
            entry.invalidated = true;
            if let Some(flight) = entry.in_flight.as_mut() {
                flight.invalidated_during = true;
            }
            marked += 1;
        }

        let to_refetch: Vec<QueryKey> = self
            .observers
            .values()
            .filter_map(|o| o.key.clone())
            .filter(|key| predicate(key))
            .filter(|key| {
                self.entries
                    .get(key)
                    .is_some_and(|entry| entry.in_flight.is_none())
            })
            .collect();
        for key in to_refetch {
            if self
                .entries
                .get(&key)
                .is_some_and(|entry| entry.in_flight.is_none())
            {
                self.start_fetch(&key);
            }
        }

        info!(marked, "cache entries invalidated");
        marked
    }

    pub fn invalidate_all(&mut self) -> usize {
        self.invalidate(|_| true)
    }

    /// Evict entries that no observer points at, have nothing in flight, and
    /// were last observed at least `gc_time` ago. Returns the number evicted.
    ///
    /// Runs on every key change in [`observe`](Self::observe); hosts may also
    /// call it directly.
    pub fn collect_garbage(&mut self, now: Instant) -> usize {
        let gc_time = self.options.gc_time;
        let observed: Vec<QueryKey> = self
            .observers
            .values()
            .filter_map(|o| o.key.clone())
            .collect();
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            entry.in_flight.is_some()
                || observed.contains(key)
                || entry
                    .observed_at
                    .is_some_and(|at| now.saturating_duration_since(at) < gc_time)
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "unobserved cache entries evicted");
        }
        evicted
    }

    /// Drop every entry, request and observer. Results of fetches still in
    /// flight are ignored when they arrive.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.observers.clear();
        self.in_flight.clear();
        self.pending.clear();
        debug!("query cache cleared");
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn peek(&self, key: &QueryKey) -> Option<EntryView> {
        self.entries.get(key).map(|entry| EntryView {
            data: entry.data.clone(),
            fetched_at: entry.fetched_at,
            invalidated: entry.invalidated,
            fetching: entry.in_flight.is_some(),
            error: entry.error.clone(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn start_fetch(&mut self, key: &QueryKey) {
        let id = FetchId(self.next_fetch);
        self.next_fetch += 1;
        let entry = self.entries.entry(key.clone()).or_default();
        entry.in_flight = Some(InFlight {
            id,
            invalidated_during: false,
        });
        self.in_flight.insert(id, key.clone());
        self.pending.push(FetchRequest {
            id,
            key: key.clone(),
            page_size: self.options.page_size,
        });
        debug!(?id, %key, "fetch issued");
    }

    fn is_observed(&self, key: &QueryKey) -> bool {
        self.observers.values().any(|o| o.key.as_ref() == Some(key))
    }

    fn observers_of(&self, key: &QueryKey) -> Vec<ObserverId> {
        self.observers
            .iter()
            .filter(|(_, o)| o.key.as_ref() == Some(key))
            .map(|(id, _)| *id)
            .collect()
    }

    fn state_for(&mut self, observer: ObserverId, now: Instant) -> QueryState {
        let stale_time = self.options.stale_time;
        let Some(obs) = self.observers.get_mut(&observer) else {
            return QueryState::default();
        };
        let Some(entry) = obs.key.as_ref().and_then(|key| self.entries.get(key)) else {
            return QueryState::default();
        };
        let is_fetching = entry.in_flight.is_some();

        if let Some(data) = &entry.data {
            obs.last_data = Some(Arc::clone(data));
            return QueryState {
                data: Some(Arc::clone(data)),
                is_loading: false,
                is_fetching,
                is_placeholder: false,
                is_stale: !entry.is_fresh(now, stale_time),
                error: entry.error.clone(),
            };
        }

        if is_fetching {
            let placeholder = obs.last_data.clone();
            return QueryState {
                is_placeholder: placeholder.is_some(),
                data: placeholder,
                is_loading: true,
                is_fetching: true,
                is_stale: false,
                error: None,
            };
        }

        QueryState {
            error: entry.error.clone(),
            ..QueryState::default()
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tag;

    fn response(titles: &[&str], pages: u32, items: u64) -> TagResponse {
        TagResponse {
            first: 1,
            prev: None,
            next: None,
            last: pages,
            pages,
            items,
            data: titles
                .iter()
                .enumerate()
                .map(|(i, title)| Tag {
                    id: format!("t{i}"),
                    title: (*title).to_string(),
                    video_count: 0,
                    slug: None,
                })
                .collect(),
        }
    }

    fn network_error() -> ApiError {
        ApiError::Transport {
            url: "http://localhost:3333/tags".into(),
            message: "connection refused".into(),
        }
    }

    #[test]
    fn first_observation_issues_one_fetch() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();

        let state = cache.observe(view, &QueryKey::first(), now);
        assert!(state.is_loading);
        assert!(state.data.is_none());
        assert_eq!(cache.take_requests().len(), 1);
    }

    #[test]
    fn repeated_observation_while_loading_is_deduplicated() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let a = cache.subscribe();
        let b = cache.subscribe();
        let key = QueryKey::first();

        cache.observe(a, &key, now);
        cache.observe(a, &key, now);
        cache.observe(b, &key, now);
        let requests = cache.take_requests();
        assert_eq!(requests.len(), 1);

        let notified = cache.complete(requests[0].id, Ok(response(&["x"], 1, 1)), now);
        assert_eq!(notified, vec![a, b]);
        assert_eq!(cache.state(a, now).data, cache.state(b, now).data);
    }

    #[test]
    fn fresh_data_is_served_without_refetch() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        let key = QueryKey::first();
        cache.observe(view, &key, now);
        let req = cache.take_requests().remove(0);
        cache.complete(req.id, Ok(response(&["x"], 1, 1)), now);

        let state = cache.observe(view, &key, now + Duration::from_secs(5));
        assert!(!state.is_loading);
        assert!(!state.is_fetching);
        assert!(cache.take_requests().is_empty());
    }

    #[test]
    fn stale_data_is_shown_while_refreshing() {
        let now = Instant::now();
        let mut cache = QueryCache::new(CacheOptions {
            stale_time: Duration::from_secs(1),
            ..CacheOptions::default()
        });
        let view = cache.subscribe();
        let key = QueryKey::first();
        cache.observe(view, &key, now);
        let req = cache.take_requests().remove(0);
        cache.complete(req.id, Ok(response(&["x"], 1, 1)), now);

        let later = now + Duration::from_secs(2);
        let state = cache.observe(view, &key, later);
        assert!(state.data.is_some());
        assert!(state.is_stale);
        assert!(state.is_fetching);
        assert!(!state.is_loading);
        assert_eq!(cache.take_requests().len(), 1);
    }

    #[test]
    fn placeholder_is_previous_page_until_new_page_arrives() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        let page1 = QueryKey::first();
        let page2 = page1.with_page(2);

        cache.observe(view, &page1, now);
        let req = cache.take_requests().remove(0);
        cache.complete(req.id, Ok(response(&["a", "b"], 2, 4)), now);

        let state = cache.observe(view, &page2, now);
        assert!(state.is_loading);
        assert!(state.is_placeholder);
        assert_eq!(state.data.as_ref().map(|d| d.current_page), Some(1));

        let req = cache.take_requests().remove(0);
        assert_eq!(req.key, page2);
        cache.complete(req.id, Ok(response(&["c", "d"], 2, 4)), now);
        let state = cache.state(view, now);
        assert!(!state.is_placeholder);
        assert_eq!(state.data.as_ref().map(|d| d.current_page), Some(2));
    }

    #[test]
    fn abandoned_key_result_is_cached_but_not_shown() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        let page1 = QueryKey::first();
        let page2 = page1.with_page(2);

        cache.observe(view, &page1, now);
        let slow = cache.take_requests().remove(0);
        cache.observe(view, &page2, now);
        let fast = cache.take_requests().remove(0);

        cache.complete(fast.id, Ok(response(&["p2"], 2, 2)), now);
        let notified = cache.complete(slow.id, Ok(response(&["p1"], 2, 2)), now);
        assert!(notified.is_empty());

        let shown = cache.state(view, now).data.unwrap();
        assert_eq!(shown.items[0].title, "p2");
        assert!(cache.peek(&page1).unwrap().data.is_some());

        // Going back to page 1 is served from cache.
        let state = cache.observe(view, &page1, now);
        assert_eq!(state.data.unwrap().items[0].title, "p1");
        assert!(cache.take_requests().is_empty());
    }

    #[test]
    fn failure_is_scoped_to_its_key() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        let page1 = QueryKey::first();
        let page2 = page1.with_page(2);

        cache.observe(view, &page1, now);
        let req = cache.take_requests().remove(0);
        cache.complete(req.id, Ok(response(&["a"], 2, 2)), now);
        let before = cache.peek(&page1);

        cache.observe(view, &page2, now);
        let req = cache.take_requests().remove(0);
        cache.complete(req.id, Err(network_error()), now);

        let state = cache.state(view, now);
        assert!(state.data.is_none());
        assert!(!state.is_loading);
        assert_eq!(state.error, Some(network_error()));
        assert_eq!(cache.peek(&page1), before);
    }

    #[test]
    fn failed_key_does_not_refetch_on_every_render() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        let key = QueryKey::first();
        cache.observe(view, &key, now);
        let req = cache.take_requests().remove(0);
        cache.complete(req.id, Err(network_error()), now);

        cache.observe(view, &key, now);
        cache.observe(view, &key, now);
        assert!(cache.take_requests().is_empty());

        assert!(cache.retry(view));
        assert!(!cache.retry(view), "retry while in flight is a no-op");
        let req = cache.take_requests();
        assert_eq!(req.len(), 1);
        cache.complete(req[0].id, Ok(response(&["ok"], 1, 1)), now);
        assert!(cache.state(view, now).error.is_none());
    }

    #[test]
    fn reobserving_failed_key_from_elsewhere_retries() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        let page1 = QueryKey::first();
        cache.observe(view, &page1, now);
        let req = cache.take_requests().remove(0);
        cache.complete(req.id, Err(network_error()), now);

        cache.observe(view, &page1.with_page(2), now);
        cache.take_requests();
        cache.observe(view, &page1, now);
        assert_eq!(cache.take_requests().len(), 1);
    }

    #[test]
    fn invalidate_refetches_only_observed_keys() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        let page1 = QueryKey::first();
        let page2 = page1.with_page(2);
        for key in [&page2, &page1] {
            cache.observe(view, key, now);
            let req = cache.take_requests().remove(0);
            cache.complete(req.id, Ok(response(&["x"], 2, 2)), now);
        }

        assert_eq!(cache.invalidate_all(), 2);
        let requests = cache.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, page1);
        assert!(cache.peek(&page2).unwrap().invalidated);
    }

    #[test]
    fn invalidation_during_flight_triggers_one_more_fetch() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        let key = QueryKey::first();
        cache.observe(view, &key, now);
        let req = cache.take_requests().remove(0);

        cache.invalidate_all();
        assert!(cache.take_requests().is_empty(), "already in flight");

        cache.complete(req.id, Ok(response(&["old"], 1, 1)), now);
        let again = cache.take_requests();
        assert_eq!(again.len(), 1);
        cache.complete(again[0].id, Ok(response(&["new"], 1, 1)), now);
        assert!(!cache.peek(&key).unwrap().invalidated);
        assert!(cache.take_requests().is_empty());
    }

    #[test]
    fn completion_sets_placeholder_for_all_observers_of_the_key() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let a = cache.subscribe();
        let b = cache.subscribe();
        let page1 = QueryKey::first();
        cache.observe(a, &page1, now);
        cache.observe(b, &page1, now);
        let req = cache.take_requests().remove(0);
        cache.complete(req.id, Ok(response(&["a"], 3, 3)), now);

        for (view, page) in [(a, 2), (b, 3)] {
            let state = cache.observe(view, &page1.with_page(page), now);
            assert!(state.is_loading);
            assert!(state.is_placeholder);
            assert_eq!(state.data.map(|d| d.current_page), Some(1));
        }
    }

    #[test]
    fn invalidate_with_predicate_leaves_other_keys_fresh() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let rust_view = cache.subscribe();
        let all_view = cache.subscribe();
        let rust = QueryKey::new("rust", 1);
        let all = QueryKey::first();
        for (view, key) in [(rust_view, &rust), (all_view, &all)] {
            cache.observe(view, key, now);
            let req = cache.take_requests().remove(0);
            cache.complete(req.id, Ok(response(&["x"], 1, 1)), now);
        }

        assert_eq!(cache.invalidate(|k| k.filter == "rust"), 1);
        let requests = cache.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, rust);

        let untouched = cache.peek(&all).unwrap();
        assert!(!untouched.invalidated);
        assert!(!untouched.fetching);
        let state = cache.observe(all_view, &all, now);
        assert!(!state.is_stale);
        assert!(cache.take_requests().is_empty());
    }

    #[test]
    fn unobserved_entries_are_evicted_after_gc_time() {
        let now = Instant::now();
        let mut cache = QueryCache::new(CacheOptions {
            gc_time: Duration::from_secs(10),
            ..CacheOptions::default()
        });
        let view = cache.subscribe();
        let page1 = QueryKey::first();
        let page2 = page1.with_page(2);
        for key in [&page1, &page2] {
            cache.observe(view, key, now);
            let req = cache.take_requests().remove(0);
            cache.complete(req.id, Ok(response(&["x"], 2, 2)), now);
        }

        assert_eq!(cache.collect_garbage(now + Duration::from_secs(9)), 0);
        assert_eq!(cache.collect_garbage(now + Duration::from_secs(10)), 1);
        assert!(cache.peek(&page1).is_none());
        assert!(cache.peek(&page2).is_some(), "observed key is kept");

        // Coming back refetches, with the page-2 data as placeholder.
        let state = cache.observe(view, &page1, now + Duration::from_secs(11));
        assert!(state.is_placeholder);
        assert_eq!(cache.take_requests().len(), 1);
    }

    #[test]
    fn in_flight_entries_survive_garbage_collection() {
        let now = Instant::now();
        let mut cache = QueryCache::new(CacheOptions {
            gc_time: Duration::ZERO,
            ..CacheOptions::default()
        });
        let view = cache.subscribe();
        let page1 = QueryKey::first();
        cache.observe(view, &page1, now);
        let slow = cache.take_requests().remove(0);
        cache.observe(view, &page1.with_page(2), now);

        assert!(cache.peek(&page1).is_some_and(|e| e.fetching));
        cache.complete(slow.id, Ok(response(&["p1"], 2, 2)), now);
        assert!(cache.peek(&page1).unwrap().data.is_some());
        assert_eq!(cache.collect_garbage(now), 1);
    }

    #[test]
    fn detached_observer_gets_nothing() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        let key = QueryKey::first();
        cache.observe(view, &key, now);
        let req = cache.take_requests().remove(0);

        cache.unsubscribe(view);
        let notified = cache.complete(req.id, Ok(response(&["x"], 1, 1)), now);
        assert!(notified.is_empty());
        assert!(cache.peek(&key).unwrap().data.is_some());
        assert_eq!(cache.observe(view, &key, now), QueryState::default());
    }

    #[test]
    fn clear_ignores_late_completions() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let view = cache.subscribe();
        cache.observe(view, &QueryKey::first(), now);
        let req = cache.take_requests().remove(0);
        cache.clear();
        assert!(cache.complete(req.id, Ok(response(&[], 0, 0)), now).is_empty());
        assert!(cache.is_empty());
    }
}
