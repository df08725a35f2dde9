//! `tb slug`: show the slug a title would get.

use crate::output::{OutputMode, render};
use clap::Args;
use serde::Serialize;
use tagboard_core::derive_slug;

#[derive(Args, Debug)]
pub struct SlugArgs {
    /// Title to derive the slug from.
    pub title: String,
}

#[derive(Debug, Serialize)]
struct SlugOutput<'a> {
    title: &'a str,
    slug: String,
}

pub fn run_slug(args: &SlugArgs, output: OutputMode) -> anyhow::Result<()> {
    let result = SlugOutput {
        title: &args.title,
        slug: derive_slug(&args.title),
    };
    render(output, &result, |r, w| writeln!(w, "{}", r.slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: SlugArgs,
    }

    #[test]
    fn title_is_positional() {
        let w = Wrapper::parse_from(["test", "Olá Mundo"]);
        assert_eq!(w.args.title, "Olá Mundo");
    }
}
