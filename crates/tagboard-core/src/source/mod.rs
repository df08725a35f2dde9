//! Remote tag collection.
//!
//! [`TagSource`] is the seam between the cache/mutation logic and whatever
//! serves tags: [`HttpTagSource`] talks to the real endpoint,
//! [`MemoryTagSource`] keeps everything in-process.

pub mod http;
pub mod memory;

pub use http::HttpTagSource;
pub use memory::MemoryTagSource;

use crate::error::ApiError;
use crate::model::{CreateTagRequest, QueryKey, Tag, TagResponse};

/// A paginated, filterable collection of tags.
///
/// Calls block; hosts that must stay responsive run them on a worker thread.
pub trait TagSource: Send + Sync {
    /// `GET /tags?_page={key.page}&_per_page={per_page}&title={key.filter}`
    fn fetch_page(&self, key: &QueryKey, per_page: u32) -> Result<TagResponse, ApiError>;

    /// `POST /tags`
    fn create_tag(&self, request: &CreateTagRequest) -> Result<Tag, ApiError>;
}

impl<T: TagSource + ?Sized> TagSource for std::sync::Arc<T> {
    fn fetch_page(&self, key: &QueryKey, per_page: u32) -> Result<TagResponse, ApiError> {
        (**self).fetch_page(key, per_page)
    }

    fn create_tag(&self, request: &CreateTagRequest) -> Result<Tag, ApiError> {
        (**self).create_tag(request)
    }
}
