//! gfm CLI - GitHub Flavored Markdown.
//!
//! Provides commands for:
//! - `html`: Render Markdown as HTML
//! - `commonmark`: Normalize Markdown to CommonMark
//! - `tasks`: List task list items and their identifiers
//! - `toggle`: Check or uncheck a task list item
//! - `events`: Print the ENTER/EXIT event stream of the parsed tree

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CommonMarkArgs, EventsArgs, HtmlArgs, TasksArgs, ToggleArgs};
use output::Output;

/// gfm - GitHub Flavored Markdown tool.
#[derive(Parser)]
#[command(name = "gfm", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render Markdown as HTML.
    Html(HtmlArgs),
    /// Render Markdown as normalized CommonMark.
    #[command(name = "commonmark")]
    CommonMark(CommonMarkArgs),
    /// List task list items.
    Tasks(TasksArgs),
    /// Check, uncheck or flip a task list item.
    Toggle(ToggleArgs),
    /// Print the ENTER/EXIT event stream.
    Events(EventsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Html(args) => args.execute(),
        Commands::CommonMark(args) => args.execute(),
        Commands::Tasks(args) => args.execute(),
        Commands::Toggle(args) => args.execute(),
        Commands::Events(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
