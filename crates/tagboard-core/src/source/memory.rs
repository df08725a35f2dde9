//! In-process tag collection with the same paging semantics as the HTTP
//! service. Counts calls and can inject failures.

use super::TagSource;
use crate::error::ApiError;
use crate::model::{CreateTagRequest, QueryKey, Tag, TagResponse};
use std::sync::{Mutex, MutexGuard, PoisonError};

const MEMORY_URL: &str = "memory://tags";

#[derive(Debug, Default)]
struct State {
    tags: Vec<Tag>,
    next_id: u64,
    fetch_calls: usize,
    create_calls: usize,
    fail_fetches: usize,
    fail_creates: usize,
}

#[derive(Debug, Default)]
pub struct MemoryTagSource {
    state: Mutex<State>,
}

impl MemoryTagSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A small catalogue for demos and offline runs.
    #[must_use]
    pub fn seeded() -> Self {
        let source = Self::new();
        for (title, videos) in [
            ("React", 12),
            ("Node.js", 8),
            ("TypeScript", 15),
            ("Rust", 21),
            ("Programação Funcional", 3),
            ("Testing", 6),
            ("CSS", 9),
            ("Docker", 4),
            ("GraphQL", 2),
            ("Kubernetes", 5),
            ("PostgreSQL", 7),
            ("Next.js", 11),
        ] {
            source.insert(title, videos);
        }
        source
    }

    /// Add a tag directly, bypassing call counters.
    pub fn insert(&self, title: &str, video_count: u64) -> Tag {
        let mut state = self.lock();
        let tag = Tag {
            id: next_id(&mut state),
            title: title.to_string(),
            video_count,
            slug: Some(crate::slug::derive_slug(title)),
        };
        state.tags.push(tag.clone());
        tag
    }

    /// Make the next `n` fetches fail with a transport error.
    pub fn fail_next_fetches(&self, n: usize) {
        self.lock().fail_fetches = n;
    }

    /// Make the next `n` creates fail with a transport error.
    pub fn fail_next_creates(&self, n: usize) {
        self.lock().fail_creates = n;
    }

    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn next_id(state: &mut State) -> String {
    state.next_id += 1;
    format!("tag-{:04}", state.next_id)
}

fn injected_failure() -> ApiError {
    ApiError::Transport {
        url: MEMORY_URL.to_string(),
        message: "injected failure".to_string(),
    }
}

impl TagSource for MemoryTagSource {
    fn fetch_page(&self, key: &QueryKey, per_page: u32) -> Result<TagResponse, ApiError> {
        let mut state = self.lock();
        state.fetch_calls += 1;
        if state.fail_fetches > 0 {
            state.fail_fetches -= 1;
            return Err(injected_failure());
        }

        let needle = key.filter.to_lowercase();
        let matching: Vec<&Tag> = state
            .tags
            .iter()
            .filter(|tag| tag.title.to_lowercase().contains(&needle))
            .collect();

        let per_page = per_page.max(1);
        let items = matching.len() as u64;
        let pages = u32::try_from(items.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX);
        let page = key.page.max(1);
        let skip = usize::try_from(u64::from(page - 1) * u64::from(per_page)).unwrap_or(usize::MAX);
        let data = matching
            .into_iter()
            .skip(skip)
            .take(per_page as usize)
            .cloned()
            .collect();

        Ok(TagResponse {
            first: 1,
            prev: (page > 1).then(|| page - 1),
            next: (page < pages).then(|| page + 1),
            last: pages.max(1),
            pages,
            items,
            data,
        })
    }

    fn create_tag(&self, request: &CreateTagRequest) -> Result<Tag, ApiError> {
        let mut state = self.lock();
        state.create_calls += 1;
        if state.fail_creates > 0 {
            state.fail_creates -= 1;
            return Err(injected_failure());
        }
        let tag = Tag {
            id: next_id(&mut state),
            title: request.title.clone(),
            video_count: request.video_count,
            slug: Some(request.slug.clone()),
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }
}
