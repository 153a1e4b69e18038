//! Command line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::adapters::Format;

#[derive(Debug, Parser)]
#[command(
    name = "wifitsv",
    version,
    about = "Convert wifi scan logs into canonical access point sighting TSV"
)]
pub struct Cli {
    /// Source format of every input file.
    #[arg(short, long, value_enum)]
    pub format: Format,

    /// Write TSV here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Configuration file. Defaults to the platform config directory.
    #[arg(short, long, value_name = "PATH", env = "WIFITSV_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output on stderr (repeatable).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Less log output on stderr (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Input files, converted in order.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Net verbosity: positive for `-v`, negative for `-q`.
    #[must_use]
    pub fn verbosity(&self) -> i8 {
        let verbose = i8::try_from(self.verbose).unwrap_or(i8::MAX);
        let quiet = i8::try_from(self.quiet).unwrap_or(i8::MAX);
        verbose.saturating_sub(quiet)
    }
}
