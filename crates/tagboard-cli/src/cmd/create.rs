//! `tb create`: create one tag through the mutation pathway.

use super::Context;
use crate::output::{CliError, Renderable, pretty_kv, render_error, render_item};
use clap::Args;
use std::io::{self, Write};
use tagboard_core::mutation::{NewTag, create_tag};
use tagboard_core::{QueryCache, Tag};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title of the new tag.
    #[arg(short, long)]
    pub title: String,
}

struct CreatedTag(Tag);

impl Renderable for CreatedTag {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "✓ Created tag \"{}\"", self.0.title)?;
        pretty_kv(w, "ID", &self.0.id)?;
        pretty_kv(w, "Slug", self.0.slug.as_deref().unwrap_or_default())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, &self.0).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}",
            self.0.id,
            self.0.title,
            self.0.slug.as_deref().unwrap_or_default()
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "title", "slug"]
    }
}

pub fn run_create(args: &CreateArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut cache = QueryCache::new(ctx.config.cache_options());
    let input = NewTag {
        title: args.title.clone(),
    };
    match create_tag(
        ctx.source.as_ref(),
        &mut cache,
        &input,
        ctx.config.form.min_title_len,
    ) {
        Ok(tag) => {
            render_item(&CreatedTag(tag), ctx.output)?;
            Ok(())
        }
        Err(err) => {
            render_error(ctx.output, &CliError::from(&err))?;
            anyhow::bail!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CreateArgs,
    }

    #[test]
    fn title_is_required() {
        assert!(Wrapper::try_parse_from(["test"]).is_err());
        let w = Wrapper::parse_from(["test", "--title", "Rust"]);
        assert_eq!(w.args.title, "Rust");
    }

    #[test]
    fn json_row_uses_wire_names() {
        let tag = CreatedTag(Tag {
            id: "tag-0001".into(),
            title: "Rust".into(),
            video_count: 0,
            slug: Some("rust".into()),
        });
        let mut buf = Vec::new();
        tag.render_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["slug"], "rust");
        assert_eq!(value["amountOfVideos"], 0);
    }
}
