#![forbid(unsafe_code)]

mod cmd;
mod output;
mod tui;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tagboard_core::ErrorCode;
use tagboard_core::config::{self, Overrides};
use tagboard_core::source::{HttpTagSource, MemoryTagSource, TagSource};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tb: browse, filter and create tags",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Base URL of the tag service (overrides config and TAGBOARD_URL).
    #[arg(long, global = true)]
    url: Option<String>,

    /// Use a seeded in-memory collection instead of the tag service.
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "List one page of tags",
        long_about = "Fetch and print one page of tags, optionally filtered by title.",
        after_help = "EXAMPLES:\n    # First page\n    tb list\n\n    # Second page of tags matching \"rust\"\n    tb list --filter rust --page 2\n\n    # Reproduce a browser location\n    tb list --query \"page=2&filter=rust\""
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Create a tag",
        long_about = "Create a tag; its slug is derived from the title.",
        after_help = "EXAMPLES:\n    # Create a tag\n    tb create --title \"Programação Funcional\"\n\n    # Emit machine-readable output\n    tb create --title \"Rust\" --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        about = "Print the slug for a title",
        after_help = "EXAMPLES:\n    tb slug \"Olá Mundo\""
    )]
    Slug(cmd::slug::SlugArgs),

    #[command(
        about = "Browse tags interactively",
        long_about = "Open a full-screen list with filtering, paging and tag creation."
    )]
    Browse(cmd::browse::BrowseArgs),

    #[command(
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    tb completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Install the global subscriber. With `log_file` set, events go to that
/// file so the terminal UI is not overwritten.
fn init_tracing(verbose: bool, log_file: Option<PathBuf>) {
    let filter = EnvFilter::try_from_env("TAGBOARD_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "tagboard=debug,info"
        } else {
            "tagboard=info,warn"
        })
    });

    let format = env::var("TAGBOARD_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    let file = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        fs::OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match (file, format.as_str()) {
        (Some(file), "json") => registry
            .with(fmt::layer().json().with_ansi(false).with_writer(Mutex::new(file)))
            .init(),
        (Some(file), _) => registry
            .with(fmt::layer().compact().with_ansi(false).with_writer(Mutex::new(file)))
            .init(),
        (None, "json") => registry
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .init(),
        (None, _) => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
}

fn browse_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("tagboard").join("tb.log"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = matches!(cli.command, Commands::Browse(_))
        .then(browse_log_path)
        .flatten();
    init_tracing(cli.verbose, log_file);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let overrides = Overrides {
        base_url: cli.url.clone(),
    };
    let effective = match config::resolve_config(&project_root, &overrides) {
        Ok(effective) => effective,
        Err(err) => {
            let mode = output::resolve_output_mode(cli.format, cli.json, None);
            output::render_error(
                mode,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
            )?;
            return Err(err);
        }
    };
    if let Some(path) = &effective.source {
        debug!(path = %path.display(), "using config file");
    }

    let output = output::resolve_output_mode(cli.format, cli.json, effective.config.output.as_deref());
    let source: Arc<dyn TagSource> = if cli.memory {
        Arc::new(MemoryTagSource::seeded())
    } else {
        Arc::new(HttpTagSource::new(
            &effective.config.api.base_url,
            effective.config.api.timeout(),
        ))
    };
    let ctx = cmd::Context {
        config: effective.config,
        source,
        output,
    };

    match cli.command {
        Commands::List(ref args) => cmd::list::run_list(args, &ctx),
        Commands::Create(ref args) => cmd::create::run_create(args, &ctx),
        Commands::Slug(ref args) => cmd::slug::run_slug(args, ctx.output),
        Commands::Browse(ref args) => cmd::browse::run_browse(args, &ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
