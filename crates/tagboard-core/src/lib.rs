//! tagboard-core: view-state synchronization for a paginated, filterable tag
//! list.
//!
//! The pieces, bottom-up:
//!
//! - [`slug`]: title to URL-safe identifier.
//! - [`debounce`]: a value that settles after a quiet period.
//! - [`params`]: `page`/`filter` stored in a query string, with history.
//! - [`query`]: keyed page cache with request dedup and placeholder data.
//! - [`source`]: the remote collection (HTTP or in-memory).
//! - [`mutation`]: create-tag form and cache invalidation on success.
//! - [`view`]: the list screen tying all of the above together.
//!
//! # Conventions
//!
//! - **Time**: every time-dependent operation takes `now: Instant`.
//! - **I/O**: the cache never calls a [`source::TagSource`]; hosts drain
//!   [`query::FetchRequest`]s and report results back ([`runner`] does this
//!   inline).
//! - **Errors**: typed errors in [`error`]; `anyhow::Result` for config
//!   loading.
//! - **Logging**: `tracing` macros only; subscribers are the binary's job.

pub mod config;
pub mod debounce;
pub mod error;
pub mod model;
pub mod mutation;
pub mod params;
pub mod query;
pub mod runner;
pub mod slug;
pub mod source;
pub mod view;

pub use error::{ApiError, CreateError, ErrorCode, ValidationError};
pub use model::{PageResult, Pagination, QueryKey, Tag, TagResponse};
pub use query::{CacheOptions, QueryCache, QueryState};
pub use slug::derive_slug;
pub use view::{ListSnapshot, TagListView, ViewOptions};
