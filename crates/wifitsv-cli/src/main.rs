//! # wifitsv
//!
//! Converts wifi scan logs from war-driving and location-cache tools into one canonical,
//! tab-separated access point sighting format.
//!
//! ## Running
//!
//! ```bash
//! wifitsv --format wigle-csv wigle-2013-03-06.csv > sightings.tsv
//! wifitsv --format ns1 --output ns1.tsv survey-*.ns1.txt
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use wifitsv_cli::{args::Cli, logging, run};
use wifitsv_core::{Config, WifiTsvError};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is configured by this file, so failures here go straight to stderr.
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let err = WifiTsvError::from(err);
            eprintln!("Error [{}]: {err}", err.error_code());
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = logging::init(&config.logging, cli.verbosity()) {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    }

    info!(format = cli.format.name(), files = cli.files.len(), "Starting wifitsv");

    match run::run(&cli, &config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = error_code(&err), "Conversion failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Everything `run` reports is either a [`WifiTsvError`] or an I/O failure with context.
fn error_code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<WifiTsvError>()
        .map_or("IO_ERROR", WifiTsvError::error_code)
}
