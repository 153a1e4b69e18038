//! Unified fatal error type for wifitsv.
//!
//! [`WifiTsvError`] is the single "stop the run" signal. Each module keeps its own specific
//! error type (`BssidError`, `InvariantViolation`, `ConfigError`) and converts into this one.
//!
//! Filtered observations are not errors: dropping a mobile hotspot or
//! a null-island fix is a normal outcome, reported as `Ok(None)` by the validator.
//!
//! # Example
//!
//! ```rust
//! use wifitsv_core::error::{Result, WifiTsvError};
//!
//! fn expect_header(line: &str) -> Result<()> {
//!     if !line.starts_with("MAC,SSID") {
//!         return Err(WifiTsvError::grammar("wigle-csv", "line 2", "missing header"));
//!     }
//!     Ok(())
//! }
//! # assert!(expect_header("BSSID").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::bssid::BssidError;
use crate::config::ConfigError;
use crate::validator::InvariantViolation;

/// Every failure that aborts a conversion run.
#[derive(Debug, Error)]
pub enum WifiTsvError {
    // =========================================================================
    // CALLER CONTRACT
    // =========================================================================
    /// An adapter handed the validator an observation that breaks the contract.
    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    /// An adapter met a hardware address it could not canonicalize.
    #[error(transparent)]
    InvalidBssid(#[from] BssidError),

    // =========================================================================
    // SOURCE GRAMMAR
    // =========================================================================
    /// A source record does not match its format's grammar.
    #[error("{format}: {location}: {message}")]
    Grammar {
        /// Source format name.
        format: &'static str,
        /// Where in the input, e.g. `line 12` or `placemark 3`.
        location: String,
        /// What did not match.
        message: String,
    },

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration file exists but could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // I/O ERRORS
    // =========================================================================
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for wifitsv operations.
pub type Result<T> = std::result::Result<T, WifiTsvError>;

impl WifiTsvError {
    /// Builds a [`WifiTsvError::Grammar`].
    pub fn grammar(
        format: &'static str,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Grammar {
            format,
            location: location.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if an adapter broke the validator's contract.
    #[inline]
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Invariant(_) | Self::InvalidBssid(_))
    }

    /// Returns `true` if the input did not match its format.
    #[inline]
    #[must_use]
    pub const fn is_grammar_error(&self) -> bool {
        matches!(self, Self::Grammar { .. })
    }

    /// Returns a machine-readable error code.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Invariant(_) => "INVARIANT_VIOLATION",
            Self::InvalidBssid(_) => "INVALID_BSSID",
            Self::Grammar { .. } => "GRAMMAR_MISMATCH",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<ConfigError> for WifiTsvError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path.into()),
            ConfigError::ReadError { source, .. } => Self::IoError(source),
            ConfigError::ParseError(e) => Self::ConfigParseError(e.to_string()),
            err @ ConfigError::ValidationError { .. } => {
                Self::ConfigValidationError(err.to_string())
            }
            ConfigError::MultipleValidationErrors(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                Self::ConfigValidationError(messages.join("; "))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
