//! URL parameter store.
//!
//! The query string is the persisted source of truth for which page and
//! filter the list shows. [`ParamStore`] parses it on read, writes canonical
//! values on update, and keeps a navigation history so back/forward behave
//! like a browser tab without reloading anything.

use std::fmt;
use url::form_urlencoded;

pub const PAGE_PARAM: &str = "page";
pub const FILTER_PARAM: &str = "filter";

/// Ordered query-string pairs. Unknown parameters are preserved in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    /// Parse a query string, with or without the leading `?`.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Replace the first `key` in place and drop later duplicates, or append
    /// when absent.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let mut seen = false;
        self.pairs.retain_mut(|(k, v)| {
            if k != key {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            v.clone_from(&value);
            true
        });
        if !seen {
            self.pairs.push((key.to_string(), value));
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Serialize as `application/x-www-form-urlencoded`, without the `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// The two parameters the list view cares about.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct ViewParams {
    pub page: u32,
    pub filter: String,
}

impl ViewParams {
    #[must_use]
    pub fn from_params(params: &SearchParams) -> Self {
        Self {
            page: parse_page(params.get(PAGE_PARAM)),
            filter: params.get(FILTER_PARAM).unwrap_or_default().to_string(),
        }
    }

    /// Write canonical values back.
    ///
    /// A parameter is written when it is already present or differs from its
    /// default, so updating the page of `?filter=x` does not grow a `filter=`
    /// a user never asked for, while `page=2%20` is rewritten as `page=2`.
    fn write_to(&self, params: &mut SearchParams) {
        let page = self.page.max(1);
        if page != 1 || params.contains(PAGE_PARAM) {
            params.set(PAGE_PARAM, page.to_string());
        }
        if !self.filter.is_empty() || params.contains(FILTER_PARAM) {
            params.set(FILTER_PARAM, self.filter.clone());
        }
    }
}

/// Parse a `page` value leniently.
///
/// Surrounding whitespace is ignored and a leading run of digits is accepted
/// (`" 3 "`, `"3abc"` are page 3). Missing, zero, or non-numeric values give
/// page 1.
#[must_use]
pub fn parse_page(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return 1;
    };
    let raw = raw.trim();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let digits_end = raw
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(raw.len(), |(i, _)| i);
    match raw[..digits_end].parse::<u32>() {
        Ok(page) if page >= 1 => page,
        Ok(_) => 1,
        // Only digits remain, so the sole failure mode is overflow.
        Err(_) if digits_end > 0 => u32::MAX,
        Err(_) => 1,
    }
}

/// Address-bar state plus navigation history.
#[derive(Debug, Clone)]
pub struct ParamStore {
    history: Vec<SearchParams>,
    cursor: usize,
}

impl ParamStore {
    /// Start from the location's query string.
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            history: vec![SearchParams::parse(query)],
            cursor: 0,
        }
    }

    #[must_use]
    pub fn params(&self) -> &SearchParams {
        &self.history[self.cursor]
    }

    /// Current `{page, filter}`, parsed from the active location.
    #[must_use]
    pub fn current(&self) -> ViewParams {
        ViewParams::from_params(self.params())
    }

    #[must_use]
    pub fn query_string(&self) -> String {
        self.params().to_query_string()
    }

    /// Apply `f` to the current `{page, filter}` and navigate to the result.
    ///
    /// Returns `true` when the location changed. Applying the same update
    /// twice leaves a single history entry and the same query string.
    pub fn update(&mut self, f: impl FnOnce(&mut ViewParams)) -> bool {
        let mut view = self.current();
        f(&mut view);
        let mut next = self.params().clone();
        view.write_to(&mut next);
        self.navigate(next)
    }

    /// Commit a filter: sets it and resets to the first page in one step.
    pub fn apply_filter(&mut self, filter: &str) -> bool {
        self.update(|view| {
            view.filter = filter.to_string();
            view.page = 1;
        })
    }

    pub fn set_page(&mut self, page: u32) -> bool {
        self.update(|view| view.page = page.max(1))
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.cursor -= 1;
        tracing::debug!(query = %self.params(), "navigated back");
        true
    }

    pub fn forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.cursor += 1;
        tracing::debug!(query = %self.params(), "navigated forward");
        true
    }

    fn navigate(&mut self, next: SearchParams) -> bool {
        if next.to_query_string() == self.query_string() {
            return false;
        }
        self.history.truncate(self.cursor + 1);
        self.history.push(next);
        self.cursor += 1;
        tracing::debug!(query = %self.params(), "navigated");
        true
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_params_missing() {
        let store = ParamStore::new("");
        assert_eq!(
            store.current(),
            ViewParams {
                page: 1,
                filter: String::new()
            }
        );
    }

    #[test]
    fn reads_page_and_filter() {
        let store = ParamStore::new("?page=3&filter=music");
        assert_eq!(store.current().page, 3);
        assert_eq!(store.current().filter, "music");
    }

    #[test]
    fn decodes_encoded_filter() {
        let store = ParamStore::new("filter=rock+%26+roll");
        assert_eq!(store.current().filter, "rock & roll");
    }

    #[test]
    fn page_parsing_is_lenient() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("1 ")), 1);
        assert_eq!(parse_page(Some(" 4")), 4);
        assert_eq!(parse_page(Some("2abc")), 2);
        assert_eq!(parse_page(Some("+5")), 5);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-2")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("")), 1);
        assert_eq!(parse_page(Some("99999999999")), u32::MAX);
    }

    #[test]
    fn page_is_written_without_stray_characters() {
        let mut store = ParamStore::new("page=2%20&filter=x");
        assert_eq!(store.current().page, 2);
        store.set_page(3);
        assert_eq!(store.query_string(), "page=3&filter=x");
    }

    #[test]
    fn apply_filter_resets_page() {
        let mut store = ParamStore::new("page=4");
        assert!(store.apply_filter("music"));
        assert_eq!(store.current().page, 1);
        assert_eq!(store.query_string(), "page=1&filter=music");
    }

    #[test]
    fn unrelated_params_survive_updates() {
        let mut store = ParamStore::new("tab=tags&page=2&sort=desc");
        store.apply_filter("jazz");
        assert_eq!(store.query_string(), "tab=tags&page=1&sort=desc&filter=jazz");
    }

    #[test]
    fn updating_page_does_not_add_empty_filter() {
        let mut store = ParamStore::new("");
        store.set_page(2);
        assert_eq!(store.query_string(), "page=2");
    }

    #[test]
    fn same_update_twice_is_idempotent() {
        let mut store = ParamStore::new("page=2");
        assert!(store.apply_filter("music"));
        let once = store.query_string();
        assert!(!store.apply_filter("music"));
        assert_eq!(store.query_string(), once);
        assert!(store.can_go_back());
        store.back();
        assert!(!store.can_go_back());
    }

    #[test]
    fn back_and_forward_walk_history() {
        let mut store = ParamStore::new("");
        store.set_page(2);
        store.set_page(3);
        assert!(store.back());
        assert_eq!(store.current().page, 2);
        assert!(store.forward());
        assert_eq!(store.current().page, 3);
        assert!(!store.forward());
    }

    #[test]
    fn navigating_after_back_drops_forward_entries() {
        let mut store = ParamStore::new("");
        store.set_page(2);
        store.set_page(3);
        store.back();
        store.set_page(5);
        assert!(!store.can_go_forward());
        assert_eq!(store.current().page, 5);
    }

    #[test]
    fn set_keeps_position_and_drops_duplicates() {
        let mut params = SearchParams::parse("a=1&page=2&b=2&page=9");
        params.set("page", "3");
        assert_eq!(params.to_query_string(), "a=1&page=3&b=2");
    }
}
