use clap::Parser;
use tracing::{debug, Level};

mod cli;
mod config;
mod core;
mod error;

use cli::Cli;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    debug!("Starting pythaw v{}", env!("CARGO_PKG_VERSION"));

    std::process::exit(cli.execute());
}
