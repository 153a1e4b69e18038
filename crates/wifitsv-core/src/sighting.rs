//! Raw observations and validated sightings.

use crate::bssid::Bssid;

/// Fields extracted from one source record, before validation.
///
/// Adapters fill this in after canonicalizing the BSSID, converting the timestamp to epoch
/// seconds, and clamping values their format is known to overshoot to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    /// Canonical BSSID text.
    pub bssid: String,
    /// Network name as raw bytes, at most 32. Usually, but not necessarily, UTF-8.
    pub ssid: Vec<u8>,
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
    /// Horizontal accuracy radius, meters.
    pub accuracy: Option<f64>,
    /// Meters above sea level.
    pub altitude: Option<f64>,
    /// Vertical accuracy, meters.
    pub altitude_accuracy: Option<f64>,
    /// Channel number; 0 means unknown.
    pub channel: Option<u32>,
    /// Signal strength, dBm.
    pub signal: Option<i32>,
    /// Seconds since the Unix epoch; 0 means unknown.
    pub timestamp: i64,
}

impl RawObservation {
    /// Creates an observation with only the required fields set.
    #[must_use]
    pub fn new(bssid: impl Into<String>, latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            bssid: bssid.into(),
            ssid: Vec::new(),
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            altitude_accuracy: None,
            channel: None,
            signal: None,
            timestamp,
        }
    }

    /// Sets the SSID.
    #[must_use]
    pub fn with_ssid(mut self, ssid: impl Into<Vec<u8>>) -> Self {
        self.ssid = ssid.into();
        self
    }

    /// Sets the accuracy radius.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: Option<f64>) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Sets the altitude.
    #[must_use]
    pub fn with_altitude(mut self, altitude: Option<f64>) -> Self {
        self.altitude = altitude;
        self
    }

    /// Sets the vertical accuracy.
    #[must_use]
    pub fn with_altitude_accuracy(mut self, altitude_accuracy: Option<f64>) -> Self {
        self.altitude_accuracy = altitude_accuracy;
        self
    }

    /// Sets the channel.
    #[must_use]
    pub fn with_channel(mut self, channel: Option<u32>) -> Self {
        self.channel = channel;
        self
    }

    /// Sets the signal strength.
    #[must_use]
    pub fn with_signal(mut self, signal: Option<i32>) -> Self {
        self.signal = signal;
        self
    }
}

/// A validated access point sighting.
///
/// Only [`RecordValidator`](crate::RecordValidator) constructs these, so every instance satisfies
/// the range, sentinel and mobile-SSID rules. Fields are read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ApSighting {
    pub(crate) bssid: Bssid,
    pub(crate) ssid: Vec<u8>,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) accuracy: Option<f64>,
    pub(crate) altitude: Option<f64>,
    pub(crate) altitude_accuracy: Option<f64>,
    pub(crate) channel: Option<u32>,
    pub(crate) signal: Option<i32>,
    pub(crate) timestamp: i64,
}

impl ApSighting {
    /// Hardware address of the access point.
    #[must_use]
    pub const fn bssid(&self) -> Bssid {
        self.bssid
    }

    /// Network name, byte for byte as the source recorded it.
    #[must_use]
    pub fn ssid(&self) -> &[u8] {
        &self.ssid
    }

    /// Degrees north.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Degrees east.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Horizontal accuracy radius, meters.
    #[must_use]
    pub const fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    /// Meters above sea level.
    #[must_use]
    pub const fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    /// Vertical accuracy, meters.
    #[must_use]
    pub const fn altitude_accuracy(&self) -> Option<f64> {
        self.altitude_accuracy
    }

    /// Channel number.
    #[must_use]
    pub const fn channel(&self) -> Option<u32> {
        self.channel
    }

    /// Signal strength, dBm.
    #[must_use]
    pub const fn signal(&self) -> Option<i32> {
        self.signal
    }

    /// Seconds since the Unix epoch, or 0 when unknown.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns `true` when the observation time is known.
    #[must_use]
    pub const fn has_timestamp(&self) -> bool {
        self.timestamp != crate::constraints::UNKNOWN_TIMESTAMP
    }
}
