//! Process-wide validation constants.
//!
//! The table is a compile-time constant: it is built once, never mutated, and every validation
//! call reads the same [`CONSTRAINTS`] instance.

use std::ops::RangeInclusive;

use crate::mobile::MobileSsidTable;

/// Accuracy radius bounds, meters.
pub const ACCURACY_RANGE: RangeInclusive<f64> = 0.0..=20_000.0;

/// Altitude bounds, meters: Dead Sea shore to the summit of Everest.
pub const ALTITUDE_RANGE: RangeInclusive<f64> = -418.0..=8_848.0;

/// Latitude bounds, degrees.
pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;

/// Longitude bounds, degrees.
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// Signal strength bounds, dBm.
pub const SIGNAL_RANGE: RangeInclusive<i32> = -120..=0;

/// Channel numbering bands (2.4 GHz, 5 GHz, and the two extended numbering schemes).
pub const CHANNEL_BANDS: &[RangeInclusive<u32>] = &[1..=14, 36..=679, 2816..=5580, 16386..=18432];

/// 2000-01-01T00:00:01Z. Earlier timestamps are unset clocks.
pub const MIN_TIMESTAMP: i64 = 946_684_801;

/// Timestamp value meaning "unknown".
pub const UNKNOWN_TIMESTAMP: i64 = 0;

/// Maximum SSID length in bytes.
pub const MAX_SSID_BYTES: usize = 32;

/// Canonical text of the null address.
pub const NULL_BSSID: &str = "00:00:00:00:00:00";

/// All ranges, sentinels and pattern lists used by validation.
#[derive(Debug, Clone)]
pub struct ConstraintTable {
    /// Allowed accuracy and altitude accuracy, meters.
    pub accuracy: RangeInclusive<f64>,
    /// Allowed altitude, meters.
    pub altitude: RangeInclusive<f64>,
    /// Allowed latitude, degrees.
    pub latitude: RangeInclusive<f64>,
    /// Allowed longitude, degrees.
    pub longitude: RangeInclusive<f64>,
    /// Allowed signal strength, dBm.
    pub signal: RangeInclusive<i32>,
    /// Allowed non-zero channel numbers.
    pub channel_bands: &'static [RangeInclusive<u32>],
    /// Earliest plausible timestamp, seconds since the Unix epoch.
    pub min_timestamp: i64,
    /// Maximum SSID length in bytes.
    pub max_ssid_bytes: usize,
    /// Mobile hotspot naming rules.
    pub mobile_ssids: MobileSsidTable,
}

impl ConstraintTable {
    /// The table every run uses.
    pub const STANDARD: Self = Self {
        accuracy: ACCURACY_RANGE,
        altitude: ALTITUDE_RANGE,
        latitude: LATITUDE_RANGE,
        longitude: LONGITUDE_RANGE,
        signal: SIGNAL_RANGE,
        channel_bands: CHANNEL_BANDS,
        min_timestamp: MIN_TIMESTAMP,
        max_ssid_bytes: MAX_SSID_BYTES,
        mobile_ssids: MobileSsidTable::CURATED,
    };

    /// Returns `true` if `channel` is 0 ("unknown") or lies in one of the channel bands.
    #[must_use]
    pub fn is_valid_channel(&self, channel: u32) -> bool {
        channel == 0 || self.channel_bands.iter().any(|band| band.contains(&channel))
    }

    /// Returns `true` if `timestamp` is a known, plausible time no later than `now`.
    #[must_use]
    pub const fn is_plausible_timestamp(&self, timestamp: i64, now: i64) -> bool {
        timestamp >= self.min_timestamp && timestamp <= now
    }
}

impl Default for ConstraintTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// The shared, read-only constraint table.
pub static CONSTRAINTS: ConstraintTable = ConstraintTable::STANDARD;
