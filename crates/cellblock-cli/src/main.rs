//! Cellblock CLI application
//!
//! Plays the part of the hosting handler around `ExecutionService`: it reads
//! code or JSON payloads, runs them, and prints JSON results. It performs no
//! authentication, rate limiting or persistence.

mod args;
mod commands;
mod router;

use anyhow::Result;
use args::{Cli, LogFormat};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);
    router::route(cli).await
}

/// Install the global subscriber; logs go to stderr, RUST_LOG sets the filter
fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
