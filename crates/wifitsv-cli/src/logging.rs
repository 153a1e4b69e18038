//! Logging initialization.
//!
//! Human-readable logs always go to stderr so stdout carries nothing but TSV. When
//! `logging.directory` is configured, a second layer writes JSON to a daily rolling file.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wifitsv_core::LoggingConfig;

/// Overrides `logging.level` from the configuration file.
pub const LOG_LEVEL_ENV: &str = "WIFITSV_LOG_LEVEL";

/// Keeps the non-blocking file writer alive for the lifetime of the program.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Initialize the logging system.
///
/// The filter comes from `RUST_LOG` if set, otherwise from `WIFITSV_LOG_LEVEL`, otherwise from
/// `config.level`, shifted by `verbosity` steps (`-v` positive, `-q` negative).
///
/// # Errors
///
/// Returns an error if the filter cannot be parsed, the log directory cannot be created, or a
/// global subscriber is already installed.
pub fn init(config: &LoggingConfig, verbosity: i8) -> anyhow::Result<()> {
    let base = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| config.level.clone());
    let directive = shift_level(&base, verbosity);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .with_context(|| format!("invalid log filter \"{directive}\""))?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal());

    let file_layer = config
        .directory
        .as_deref()
        .map(file_writer)
        .transpose()?
        .map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

/// Non-blocking writer for `<dir>/wifitsv.<date>`.
fn file_writer(dir: &Path) -> anyhow::Result<NonBlocking> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::new(Rotation::DAILY, dir, "wifitsv");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);
    Ok(writer)
}

/// Moves a plain level name `steps` places along error..trace. Anything that is not a plain
/// level (e.g. `wifitsv_cli=debug`) is returned untouched unless `steps` is non-zero, in which
/// case the shift starts from `info`.
fn shift_level(level: &str, steps: i8) -> String {
    if steps == 0 {
        return level.to_owned();
    }
    let start = LEVELS
        .iter()
        .position(|l| l.eq_ignore_ascii_case(level.trim()))
        .unwrap_or(2);
    let shifted = i64::try_from(start).unwrap_or(2) + i64::from(steps);
    let index = usize::try_from(shifted.clamp(0, 4)).unwrap_or(2);
    LEVELS[index].to_owned()
}
