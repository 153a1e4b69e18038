//! G-MoN export.
//!
//! ```text
//! BSSID;LAT;LON;SSID;Crypt;Beacon Interval;Connection Mode;Channel;RXL;Date;Time
//! 00:00:C5:B2:18:7C;46.80945;7.14751;johannes;Wep;-81;Infra;7;-79;2013/12/04;18:00:33
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use wifitsv_core::{canonicalize, RawObservation, Result, WifiTsvError};

use super::{line_location, parse_field, utc_timestamp, Extracted, LineAdapter};

/// Command line name.
pub const FORMAT: &str = "gmon";

const HEADER: &str = "BSSID;LAT;LON;SSID;Crypt;Beacon Interval;Connection Mode;Channel;RXL;Date;Time";

static RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^((?:[0-9A-F]{2}:){5}[0-9A-F]{2});             # BSSID
        (NaN|-?\?|-?\d{1,2}(?:\.\d+)?);                 # latitude
        (NaN|-?\?|-?\d{1,3}(?:\.\d+)?);                 # longitude
        (.{0,32});                                      # SSID
        (?:Open|Wep|WPA2|WpaPsk|\?);                    # security
        -\d{2,4};                                       # beacon interval
        (?:Infra|Open);                                 # connection mode
        ([1-9]\d{0,2});                                 # channel
        (-\d{1,3});                                     # RXL
        ((?:19|20)?\d{2}/[0-2]\d/[0-3]\d);              # date
        ([0-2]\d:[0-5]\d:[0-5]\d)                       # time
        ",
    )
    .expect("valid G-MoN regex")
});

/// Positions G-MoN writes when it had no fix.
fn is_unknown_position(text: &str) -> bool {
    matches!(text, "NaN" | "?" | "-?")
}

/// G-MoN line adapter. Line 1 must be the header.
#[derive(Debug, Default)]
pub struct Gmon;

impl Gmon {
    /// Creates an adapter for one file.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LineAdapter for Gmon {
    fn parse_line(&mut self, lineno: u64, line: &str) -> Result<Extracted> {
        let at = line_location(lineno);

        if lineno == 1 {
            if !line.starts_with(HEADER) {
                return Err(WifiTsvError::grammar(
                    FORMAT,
                    at,
                    format!("expected header \"{HEADER}\", got \"{line}\""),
                ));
            }
            return Ok(Extracted::Skip);
        }

        let caps = RECORD
            .captures(line)
            .ok_or_else(|| WifiTsvError::grammar(FORMAT, &at, format!("no match: {line}")))?;

        let (latitude, longitude) = (&caps[2], &caps[3]);
        if is_unknown_position(latitude) || is_unknown_position(longitude) {
            return Ok(Extracted::Unusable("no position fix"));
        }

        let datetime = format!("{} {}", &caps[7], &caps[8]);
        let timestamp = utc_timestamp(&datetime, "%Y/%m/%d %H:%M:%S").ok_or_else(|| {
            WifiTsvError::grammar(FORMAT, &at, format!("bad date/time: \"{datetime}\""))
        })?;

        let raw = RawObservation::new(
            canonicalize(&caps[1])?,
            parse_field(FORMAT, &at, "latitude", latitude)?,
            parse_field(FORMAT, &at, "longitude", longitude)?,
            timestamp,
        )
        .with_ssid(&caps[4])
        .with_channel(Some(parse_field(FORMAT, &at, "channel", &caps[5])?))
        .with_signal(Some(parse_field(FORMAT, &at, "RXL", &caps[6])?));

        Ok(Extracted::Observation(raw))
    }
}
