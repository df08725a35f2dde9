pub mod browse;
pub mod completions;
pub mod create;
pub mod list;
pub mod slug;

use crate::output::OutputMode;
use std::sync::Arc;
use tagboard_core::config::TagboardConfig;
use tagboard_core::source::TagSource;

/// What every command needs: resolved configuration, the tag collection and
/// the output mode.
pub struct Context {
    pub config: TagboardConfig,
    pub source: Arc<dyn TagSource>,
    pub output: OutputMode,
}
