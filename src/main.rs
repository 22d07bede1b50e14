//! KrmPesan CLI binary entry point.

use std::io;

use clap::Parser;
use krmpesan::cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=krmpesan=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = krmpesan::cli::commands::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
