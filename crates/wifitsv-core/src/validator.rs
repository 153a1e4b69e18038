//! Sighting construction.
//!
//! [`RecordValidator::build`] turns a [`RawObservation`] into an [`ApSighting`] in four stages:
//!
//! 1. **Fix up** an implausible timestamp to 0 ("unknown"). This is a repair, never a rejection.
//! 2. **Check caller invariants**: canonical BSSID, legal coordinates, SSID length, ranges of the
//!    optional fields and the channel band. A failure means the calling adapter is broken, so it
//!    surfaces as an [`InvariantViolation`] and the run must stop.
//! 3. **Filter** observations that would pollute a fixed-infrastructure dataset: the null BSSID,
//!    the (0, 0) coordinate, and mobile hotspot SSIDs. These come back as `Ok(None)`.
//! 4. **Emit** the immutable sighting.

use std::fmt;

use thiserror::Error;
use tracing::trace;

use crate::bssid;
use crate::constraints::{ConstraintTable, CONSTRAINTS, UNKNOWN_TIMESTAMP};
use crate::mobile::MobileMatch;
use crate::sighting::{ApSighting, RawObservation};

/// A broken caller contract. Always fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvariantViolation {
    /// The BSSID was not passed through canonicalization.
    #[error("bssid: \"{0}\" is not in canonical form")]
    NonCanonicalBssid(String),

    /// Latitude outside -90..=90.
    #[error("latitude: \"{0}\" is out of range")]
    Latitude(f64),

    /// Longitude outside -180..=180.
    #[error("longitude: \"{0}\" is out of range")]
    Longitude(f64),

    /// SSID longer than 32 bytes.
    #[error("ssid: \"{ssid}\" is {bytes} bytes long (max {max})")]
    SsidTooLong {
        /// The offending SSID.
        ssid: String,
        /// Its length in bytes.
        bytes: usize,
        /// The limit.
        max: usize,
    },

    /// Accuracy outside 0..=20000 meters.
    #[error("accuracy: \"{0}\" is out of range")]
    Accuracy(f64),

    /// Altitude outside -418..=8848 meters.
    #[error("altitude: \"{0}\" is out of range")]
    Altitude(f64),

    /// Altitude accuracy outside 0..=20000 meters.
    #[error("altitude_accuracy: \"{0}\" is out of range")]
    AltitudeAccuracy(f64),

    /// Signal outside -120..=0 dBm.
    #[error("signal: \"{0}\" is out of range")]
    Signal(i32),

    /// Non-zero channel outside every channel band.
    #[error("channel: \"{0}\" is not in any channel band")]
    Channel(u32),
}

impl InvariantViolation {
    /// Name of the field that violated its invariant.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NonCanonicalBssid(_) => "bssid",
            Self::Latitude(_) => "latitude",
            Self::Longitude(_) => "longitude",
            Self::SsidTooLong { .. } => "ssid",
            Self::Accuracy(_) => "accuracy",
            Self::Altitude(_) => "altitude",
            Self::AltitudeAccuracy(_) => "altitude_accuracy",
            Self::Signal(_) => "signal",
            Self::Channel(_) => "channel",
        }
    }
}

/// Why an otherwise valid observation was left out of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// BSSID `00:00:00:00:00:00`.
    NullBssid,
    /// Latitude and longitude both exactly zero.
    NullCoordinates,
    /// The SSID matched the mobile hotspot heuristic.
    MobileSsid(MobileMatch),
}

impl DropReason {
    /// Short stable name, suitable for counters and log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NullBssid => "null_bssid",
            Self::NullCoordinates => "null_coordinates",
            Self::MobileSsid(_) => "mobile_ssid",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MobileSsid(MobileMatch::Prefix(p)) => write!(f, "mobile_ssid (prefix {p:?})"),
            Self::MobileSsid(MobileMatch::Suffix(s)) => write!(f, "mobile_ssid (suffix {s:?})"),
            Self::MobileSsid(MobileMatch::Substring(s)) => {
                write!(f, "mobile_ssid (substring {s:?})")
            }
            other => f.write_str(other.as_str()),
        }
    }
}

/// Outcome of validating one observation that honored the caller contract.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The observation becomes a sighting.
    Accepted(ApSighting),
    /// The observation was filtered out.
    Dropped(DropReason),
}

impl Verdict {
    /// Returns the sighting, discarding the drop reason.
    #[must_use]
    pub fn into_sighting(self) -> Option<ApSighting> {
        match self {
            Self::Accepted(sighting) => Some(sighting),
            Self::Dropped(_) => None,
        }
    }
}

/// Builds validated sightings from raw observations.
#[derive(Debug, Clone, Copy)]
pub struct RecordValidator {
    table: &'static ConstraintTable,
    clock: fn() -> i64,
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordValidator {
    /// Creates a validator over the shared constraint table and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: &CONSTRAINTS,
            clock: system_now,
        }
    }

    /// Creates a validator whose notion of "now" comes from `clock`.
    #[must_use]
    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self {
            table: &CONSTRAINTS,
            clock,
        }
    }

    /// Validates `raw` and returns the sighting, or `None` if it was filtered.
    ///
    /// `None` is not an error; it only means the observation does not belong in the dataset.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] when the caller broke the adapter contract. The run must
    /// stop.
    pub fn build(&self, raw: RawObservation) -> Result<Option<ApSighting>, InvariantViolation> {
        self.evaluate(raw).map(Verdict::into_sighting)
    }

    /// Like [`build`](Self::build), but reports why a filtered observation was dropped.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] when the caller broke the adapter contract.
    pub fn evaluate(&self, mut raw: RawObservation) -> Result<Verdict, InvariantViolation> {
        let now = (self.clock)();
        if !self.table.is_plausible_timestamp(raw.timestamp, now) {
            raw.timestamp = UNKNOWN_TIMESTAMP;
        }

        let bssid = self.check_invariants(&raw)?;

        if let Some(reason) = self.screen(&raw) {
            trace!(
                bssid = %raw.bssid,
                ssid = %String::from_utf8_lossy(&raw.ssid),
                %reason,
                "Observation dropped"
            );
            return Ok(Verdict::Dropped(reason));
        }

        Ok(Verdict::Accepted(ApSighting {
            bssid,
            ssid: raw.ssid,
            latitude: raw.latitude,
            longitude: raw.longitude,
            accuracy: raw.accuracy,
            altitude: raw.altitude,
            altitude_accuracy: raw.altitude_accuracy,
            channel: raw.channel,
            signal: raw.signal,
            timestamp: raw.timestamp,
        }))
    }

    fn check_invariants(&self, raw: &RawObservation) -> Result<bssid::Bssid, InvariantViolation> {
        let t = self.table;

        let bssid = bssid::parse(&raw.bssid)
            .ok()
            .filter(|parsed| parsed.to_string() == raw.bssid)
            .ok_or_else(|| InvariantViolation::NonCanonicalBssid(raw.bssid.clone()))?;

        if !t.latitude.contains(&raw.latitude) {
            return Err(InvariantViolation::Latitude(raw.latitude));
        }
        if !t.longitude.contains(&raw.longitude) {
            return Err(InvariantViolation::Longitude(raw.longitude));
        }
        if raw.ssid.len() > t.max_ssid_bytes {
            return Err(InvariantViolation::SsidTooLong {
                ssid: String::from_utf8_lossy(&raw.ssid).into_owned(),
                bytes: raw.ssid.len(),
                max: t.max_ssid_bytes,
            });
        }

        if let Some(accuracy) = raw.accuracy.filter(|v| !t.accuracy.contains(v)) {
            return Err(InvariantViolation::Accuracy(accuracy));
        }
        if let Some(altitude) = raw.altitude.filter(|v| !t.altitude.contains(v)) {
            return Err(InvariantViolation::Altitude(altitude));
        }
        if let Some(vertical) = raw.altitude_accuracy.filter(|v| !t.accuracy.contains(v)) {
            return Err(InvariantViolation::AltitudeAccuracy(vertical));
        }
        if let Some(signal) = raw.signal.filter(|v| !t.signal.contains(v)) {
            return Err(InvariantViolation::Signal(signal));
        }
        if let Some(channel) = raw.channel.filter(|&c| !t.is_valid_channel(c)) {
            return Err(InvariantViolation::Channel(channel));
        }

        Ok(bssid)
    }

    fn screen(&self, raw: &RawObservation) -> Option<DropReason> {
        if raw.bssid == crate::constraints::NULL_BSSID {
            return Some(DropReason::NullBssid);
        }
        if raw.latitude == 0.0 && raw.longitude == 0.0 {
            return Some(DropReason::NullCoordinates);
        }
        self.table
            .mobile_ssids
            .first_match(&raw.ssid)
            .map(DropReason::MobileSsid)
    }
}

fn system_now() -> i64 {
    chrono::Utc::now().timestamp()
}
