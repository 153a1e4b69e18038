//! CSV dump of the iOS location cache (`consolidated.db`, table `WifiLocation`).
//!
//! Columns: MAC, Timestamp, Latitude, Longitude, HorizontalAccuracy, Altitude,
//! VerticalAccuracy, Speed, Course, Confidence. Every value is double-quoted and MAC octets
//! drop their leading zero:
//!
//! ```text
//! "0:26:50:8c:a:31","298883375.530953","37.84438252","-122.25573939","82","0","-1","-1","-1","50"
//! ```
//!
//! Timestamps are Cocoa `NSDate` values: seconds since 2001-01-01T00:00:00Z.

use once_cell::sync::Lazy;
use regex::Regex;
use wifitsv_core::{canonicalize, RawObservation, Result, WifiTsvError};

use super::{line_location, parse_field, Extracted, LineAdapter};

/// Command line name.
pub const FORMAT: &str = "iphone-consolidated-db";

/// Seconds between the Unix epoch and the `NSDate` reference date.
const NSDATE_EPOCH_OFFSET: f64 = 978_307_200.0;

/// Confidence values the location cache is known to write.
const CONFIDENCE_LEVELS: [u32; 6] = [0, 50, 60, 65, 68, 70];

static RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^"((?:[0-9a-f]{1,2}:){5}[0-9a-f]{1,2})","(\d{9,}\.\d+)","(0|-?\d{1,2}\.\d+)","(0|-?1?\d{1,2}\.\d+)","(-1|\d{2,3})","0","-1","-1","-1","(\d+)""#,
    )
    .expect("valid consolidated.db regex")
});

/// Converts an `NSDate` to Unix seconds, rounding half up.
fn timestamp_from_nsdate(nsdate: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let seconds = (nsdate + NSDATE_EPOCH_OFFSET + 0.5).floor() as i64;
    seconds
}

/// `consolidated.db` line adapter. The dump has no header.
#[derive(Debug, Default)]
pub struct ConsolidatedDb;

impl ConsolidatedDb {
    /// Creates an adapter for one file.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LineAdapter for ConsolidatedDb {
    fn parse_line(&mut self, lineno: u64, line: &str) -> Result<Extracted> {
        let at = line_location(lineno);
        let caps = RECORD
            .captures(line)
            .ok_or_else(|| WifiTsvError::grammar(FORMAT, &at, format!("no match: {line}")))?;

        let confidence: u32 = parse_field(FORMAT, &at, "confidence", &caps[6])?;
        if !CONFIDENCE_LEVELS.contains(&confidence) {
            return Err(WifiTsvError::grammar(
                FORMAT,
                &at,
                format!("confidence: \"{confidence}\""),
            ));
        }

        let accuracy = match &caps[5] {
            "-1" => None,
            meters => Some(parse_field(FORMAT, &at, "horizontal accuracy", meters)?),
        };

        let nsdate: f64 = parse_field(FORMAT, &at, "timestamp", &caps[2])?;
        let raw = RawObservation::new(
            canonicalize(&caps[1])?,
            parse_field(FORMAT, &at, "latitude", &caps[3])?,
            parse_field(FORMAT, &at, "longitude", &caps[4])?,
            timestamp_from_nsdate(nsdate),
        )
        .with_accuracy(accuracy);

        Ok(Extracted::Observation(raw))
    }
}
