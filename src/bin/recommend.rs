//! Recommend CLI binary.

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use curio::cli::args::RecommendArgs;
use curio::cli::commands::execute_command;

fn main() {
    let args = RecommendArgs::parse();

    // RUST_LOG takes precedence over -v/-q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
