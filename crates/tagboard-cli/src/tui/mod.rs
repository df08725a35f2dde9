//! Terminal user interface for tagboard.
//!
//! ## Entry points
//!
//! - [`list::run_browse_tui`]: interactive tag list with filtering, paging
//!   and creation.

pub mod create_dialog;
pub mod dispatch;
pub mod list;
