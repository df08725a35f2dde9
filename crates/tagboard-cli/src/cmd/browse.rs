//! `tb browse`: interactive list view.

use super::Context;
use clap::Args;

#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Initial location query string, e.g. "page=2&filter=rust".
    #[arg(short, long, default_value = "")]
    pub query: String,
}

pub fn run_browse(args: &BrowseArgs, ctx: &Context) -> anyhow::Result<()> {
    crate::tui::list::run_browse_tui(ctx, &args.query)
}
