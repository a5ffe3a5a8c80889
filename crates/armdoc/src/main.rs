//! armdoc - Document Azure resource groups from their exported ARM templates

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod output;
mod pipeline;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env before parsing so clap's env fallbacks see it too
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose > 0 {
        EnvFilter::new(match cli.verbose {
            1 => "armdoc=debug,armdoc_client=debug,armdoc_core=debug",
            _ => "armdoc=trace,armdoc_client=trace,armdoc_core=trace",
        })
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("armdoc=info,armdoc_client=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env file"),
    }

    if cli.no_color {
        colored::control::set_override(false);
    }

    cli.run().await
}
