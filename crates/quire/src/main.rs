//! Quire CLI - minimal Jekyll-style static site generator.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Minimal Jekyll-style static site generator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Source directory
    #[arg(short, long, global = true, default_value = "src")]
    source: PathBuf,

    /// Destination directory
    #[arg(short, long, global = true, default_value = "_site")]
    destination: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build your site
    #[command(visible_alias = "b")]
    Build {
        /// Exit with an error when any document fails to build
        #[arg(long)]
        strict: bool,
    },

    /// Serve your site locally
    #[command(visible_aliases = ["server", "s"])]
    Serve {
        /// Port to listen on
        #[arg(short = 'P', long, default_value = "4000")]
        port: u16,

        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Use LiveReload to automatically refresh browsers
        #[arg(short = 'l', long)]
        livereload: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Command::Build { strict } => {
            commands::build::run(cli.source, cli.destination, strict)?;
        }
        Command::Serve {
            port,
            host,
            livereload,
        } => {
            commands::serve::run(cli.source, cli.destination, host, port, livereload).await?;
        }
    }

    Ok(())
}
