//! Converter configuration.
//!
//! Handles loading and validating wifitsv configuration:
//! - Log level and optional JSON log directory
//! - Survey date for NetStumbler exports, which only record time of day
//!
//! Configuration is optional. Without a file every setting takes its default.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default NS1 survey date: NetStumbler summary exports carry only `HH:MM:SS (GMT)`.
const DEFAULT_NS1_SURVEY_DATE: (i32, u32, u32) = (2012, 4, 25);

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// The configuration file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    ReadError {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`Config`].
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A setting has an unusable value.
    #[error("{field}: {message}")]
    ValidationError {
        /// Dotted setting name.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several settings have unusable values.
    #[error("{} configuration errors", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level converter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,

    /// NetStumbler text export settings.
    pub ns1: Ns1Config,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive such as `info` or `wifitsv=debug`.
    pub level: String,

    /// Directory for daily-rotated JSON logs. Logs go to stderr only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// NetStumbler text export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ns1Config {
    /// Date the survey's time-of-day stamps belong to (UTC).
    pub survey_date: NaiveDate,
}

impl Default for Ns1Config {
    fn default() -> Self {
        let (y, m, d) = DEFAULT_NS1_SURVEY_DATE;
        Self {
            survey_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        }
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// With `path`, that file must exist. Without it, the platform configuration file is used
    /// if present, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.display().to_string())),
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No configuration file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Reads, parses and validates one configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every setting and reports all problems at once.
    ///
    /// # Errors
    ///
    /// Returns the single problem, or [`ConfigError::MultipleValidationErrors`].
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.logging.level.trim().is_empty() {
            errors.push(ConfigError::ValidationError {
                field: "logging.level".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let min_date = chrono::DateTime::from_timestamp(crate::constraints::MIN_TIMESTAMP, 0)
            .map(|dt| dt.date_naive())
            .unwrap_or_default();
        if self.ns1.survey_date < min_date {
            errors.push(ConfigError::ValidationError {
                field: "ns1.survey_date".to_string(),
                message: format!(
                    "{} is before {min_date}; every NS1 timestamp would be discarded",
                    self.ns1.survey_date
                ),
            });
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }

    /// Platform configuration file path, e.g. `~/.config/wifitsv/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "wifitsv")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.directory.is_none());
        assert_eq!(
            config.ns1.survey_date,
            NaiveDate::from_ymd_opt(2012, 4, 25).unwrap()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.ns1, Ns1Config::default());
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml(
            r#"
            [logging]
            level = "wifitsv=trace"
            directory = "/tmp/wifitsv-logs"

            [ns1]
            survey_date = "2013-06-01"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.logging.directory,
            Some(PathBuf::from("/tmp/wifitsv-logs"))
        );
        assert_eq!(
            config.ns1.survey_date,
            NaiveDate::from_ymd_opt(2013, 6, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_error() {
        let err = Config::from_toml("[ns1]\nsurvey_date = \"yesterday\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_single_validation_error() {
        let err = Config::from_toml("[ns1]\nsurvey_date = \"1999-12-31\"\n").unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "ns1.survey_date"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_multiple_validation_errors() {
        let err = Config::from_toml(
            "[logging]\nlevel = \" \"\n[ns1]\nsurvey_date = \"1999-12-31\"\n",
        )
        .unwrap_err();
        match err {
            ConfigError::MultipleValidationErrors(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"warn\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "warn");
    }
}
