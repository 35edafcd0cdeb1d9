//! MF CLI - Mermaid figures for markdown.
//!
//! Provides commands for:
//! - `render`: Render markdown files to HTML with mermaid charts as SVG
//! - `init`: Prepare the working directory and tool configuration files

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{InitArgs, RenderArgs};
use output::Output;

/// MF - Mermaid figures for markdown.
#[derive(Parser)]
#[command(name = "mf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render markdown files to HTML.
    Render(RenderArgs),
    /// Prepare the working and output directories.
    Init(InitArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG
    let verbose = match &cli.command {
        Commands::Render(args) => args.verbose,
        Commands::Init(args) => args.verbose,
    };
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Init(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
