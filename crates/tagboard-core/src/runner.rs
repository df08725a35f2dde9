//! Inline execution of queued fetches.

use crate::query::{ObserverId, QueryCache};
use crate::source::TagSource;
use std::time::Instant;

/// Run every queued fetch against `source` on the calling thread, including
/// follow-up fetches that completions enqueue. Returns the observers that
/// were notified, deduplicated, in first-notified order.
pub fn run_blocking(cache: &mut QueryCache, source: &dyn TagSource) -> Vec<ObserverId> {
    let mut notified = Vec::new();
    loop {
        let requests = cache.take_requests();
        if requests.is_empty() {
            break;
        }
        for request in requests {
            let result = source.fetch_page(&request.key, request.page_size);
            for observer in cache.complete(request.id, result, Instant::now()) {
                if !notified.contains(&observer) {
                    notified.push(observer);
                }
            }
        }
    }
    notified
}
