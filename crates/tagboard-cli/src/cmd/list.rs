//! `tb list`: fetch and print one page of tags.

use super::Context;
use crate::output::{CliError, pretty_kv, pretty_rule, pretty_section, render_error, render_mode};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Instant;
use tagboard_core::model::Pagination;
use tagboard_core::params::ParamStore;
use tagboard_core::runner::run_blocking;
use tagboard_core::{ListSnapshot, QueryCache, Tag, TagListView};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only tags whose title contains this text.
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Page to show (1-based).
    #[arg(short, long)]
    pub page: Option<u32>,

    /// Start from a location query string such as "page=2&filter=rust".
    #[arg(short, long)]
    pub query: Option<String>,
}

impl ListArgs {
    /// Merge `--query` with the explicit flags; flags win.
    pub fn location(&self) -> String {
        let mut store = ParamStore::new(self.query.as_deref().unwrap_or_default());
        if let Some(filter) = &self.filter {
            store.apply_filter(filter);
        }
        if let Some(page) = self.page {
            store.set_page(page);
        }
        store.query_string()
    }
}

#[derive(Debug, Serialize)]
struct ListOutput {
    query: String,
    filter: String,
    page: u32,
    pagination: Option<Pagination>,
    items: Vec<Tag>,
}

impl ListOutput {
    fn from_snapshot(query: String, snapshot: ListSnapshot) -> Self {
        Self {
            query,
            filter: snapshot.applied.filter,
            page: snapshot.applied.page,
            pagination: snapshot.pagination,
            items: snapshot.rows,
        }
    }

    fn summary(&self) -> String {
        match self.pagination {
            Some(p) if !p.is_empty() => {
                let range = p
                    .item_range(self.items.len())
                    .map_or_else(String::new, |(a, b)| format!("{a}-{b} of "));
                format!(
                    "page {} of {} ({range}{} tags)",
                    self.page, p.total_pages, p.total_items
                )
            }
            _ => "no tags".to_string(),
        }
    }
}

pub fn run_list(args: &ListArgs, ctx: &Context) -> anyhow::Result<()> {
    let query = args.location();
    let mut cache = QueryCache::new(ctx.config.cache_options());
    let mut view = TagListView::new(&mut cache, &query, ctx.config.view_options());

    view.snapshot(&mut cache, Instant::now());
    run_blocking(&mut cache, ctx.source.as_ref());
    let snapshot = view.snapshot(&mut cache, Instant::now());
    view.close(&mut cache);

    if let Some(err) = &snapshot.error {
        render_error(ctx.output, &CliError::from_code(err.code(), err.to_string()))?;
        anyhow::bail!("{err}");
    }

    let result = ListOutput::from_snapshot(query, snapshot);
    render_mode(ctx.output, &result, render_text, render_pretty)
}

fn render_text(result: &ListOutput, w: &mut dyn Write) -> io::Result<()> {
    if result.items.is_empty() {
        return writeln!(w, "{}", empty_message(&result.filter));
    }
    writeln!(w, "id\ttitle\tslug\tvideos")?;
    for tag in &result.items {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            tag.id,
            tag.title,
            tag.slug.as_deref().unwrap_or_default(),
            tag.video_count
        )?;
    }
    writeln!(w, "# {}", result.summary())
}

fn render_pretty(result: &ListOutput, w: &mut dyn Write) -> io::Result<()> {
    let heading = if result.filter.is_empty() {
        "Tags".to_string()
    } else {
        format!("Tags matching \"{}\"", result.filter)
    };
    pretty_section(w, &heading)?;
    if result.items.is_empty() {
        return writeln!(w, "{}", empty_message(&result.filter));
    }
    for tag in &result.items {
        writeln!(
            w,
            "{:<32} {:<32} {:>6}",
            truncate(&tag.title, 32),
            truncate(tag.slug.as_deref().unwrap_or("-"), 32),
            tag.video_count
        )?;
    }
    pretty_rule(w)?;
    pretty_kv(w, "Showing", result.summary())
}

fn empty_message(filter: &str) -> String {
    if filter.is_empty() {
        "No tags yet.".to_string()
    } else {
        format!("No tags match \"{filter}\".")
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
