//! smap CLI - Sitemap generator.
//!
//! Provides commands for:
//! - `build`: Build a sitemap from `smap.toml`, its routes and JSON model files
//! - `index`: Write a sitemap index listing other sitemap files

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, IndexArgs};
use output::Output;

/// smap - Sitemap generator.
#[derive(Parser)]
#[command(name = "smap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a sitemap.
    Build(BuildArgs),
    /// Build a sitemap index.
    Index(IndexArgs),
}

/// Install the log subscriber.
///
/// `debug` enables DEBUG level, otherwise `RUST_LOG` applies. Only the first
/// call in a process takes effect.
pub(crate) fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Index(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
