use clap::Parser;
use std::process::ExitCode;

use bespoken::cli::{self, CliArgs};
use bespoken::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Exiting with error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
