//! # wifitsv-core
//!
//! Record normalization and validation for the wifitsv access point converter.
//!
//! Every source format ends up here: adapters extract loosely-typed fields from one source
//! record, and this crate decides whether the record becomes a canonical sighting, is silently
//! dropped, or exposes a defect that must stop the run.
//!
//! ## Architecture
//!
//! - [`bssid`] - MAC address canonicalization
//! - [`mobile`] - SSID heuristic for phones, hotspots and vehicle wifi
//! - [`constraints`] - The process-wide table of ranges, sentinels and pattern lists
//! - [`sighting`] - Raw observations and validated sightings
//! - [`validator`] - The sighting-construction algorithm
//! - [`config`] - Converter configuration loading and validation
//! - [`error`] - Unified fatal error type for the crate

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod bssid;
pub mod config;
pub mod constraints;
pub mod error;
pub mod mobile;
pub mod sighting;
pub mod validator;

// Re-export primary types for convenience
pub use bssid::{canonicalize, Bssid, BssidError};
pub use config::{Config, ConfigError, ConfigResult, LoggingConfig, Ns1Config};
pub use constraints::{ConstraintTable, CONSTRAINTS};
pub use error::{Result, WifiTsvError};
pub use mobile::{is_mobile, MobileMatch, MobileSsidTable};
pub use sighting::{ApSighting, RawObservation};
pub use validator::{DropReason, InvariantViolation, RecordValidator, Verdict};
