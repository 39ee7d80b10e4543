//! fluentpages: layout pages and template choices from the command line.
//!
//! # Usage
//!
//! ```text
//! fluentpages check
//! fluentpages templates [--json]
//! fluentpages layout list|add|edit|show|remove
//! fluentpages page list|add-layout-page|add-contents-page|set-layout|form
//! fluentpages serve [--listen <addr>]
//! fluentpages fetch <layout-id> [--server <url>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs, fetch::FetchArgs, layout::LayoutCommand, page::PageCommand,
    serve::ServeArgs, templates::TemplatesArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fluentpages",
    version,
    about = "Manage page layouts and the templates they render with",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate ~/.fluentpages/config.yaml and the template directory.
    Check(CheckArgs),

    /// List the template files a layout can use.
    Templates(TemplatesArgs),

    /// Manage layouts.
    Layout {
        #[command(subcommand)]
        command: LayoutCommand,
    },

    /// Manage pages.
    Page {
        #[command(subcommand)]
        command: PageCommand,
    },

    /// Serve the JSON endpoints in the foreground.
    Serve(ServeArgs),

    /// Ask a running server for a layout's placeholders.
    Fetch(FetchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Templates(args) => args.run(),
        Commands::Layout { command } => commands::layout::run(command),
        Commands::Page { command } => commands::page::run(command),
        Commands::Serve(args) => args.run(),
        Commands::Fetch(args) => args.run(),
    }
}
