mod cli;
mod commands;
mod error;
mod logging;
mod progress;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, &cli.log_file)?;

    info!("ppdg v{} starting up", env!("CARGO_PKG_VERSION"));
    debug!("Parsed arguments: {:?}", &cli);

    let result = match cli.command {
        Commands::Compute(args) => commands::compute::run(args),
        Commands::Average(args) => commands::average::run(args),
        Commands::Predict(args) => commands::predict::run(args),
        Commands::Clean(args) => commands::clean::run(args),
        Commands::Config(args) => commands::config::run(args),
    };

    if let Err(e) = &result {
        error!("Command failed: {e}");
    }
    result
}
