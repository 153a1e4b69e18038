//! NetStumbler text summary export.
//!
//! ```text
//! # Latitude	Longitude	( SSID )	Type	( BSSID )	Time (GMT)	[ SNR Sig Noise ]	# ( Name )	Flags	Channelbits	BcnIntvl
//! N 43.6477510	W 79.3932570	( aghq2 )	BSS	( 90:27:E4:5E:65:B1 )	05:38:01 (GMT)	[ 12 12 0 ]	# ( Apple )	0011	0000	0
//! ```
//!
//! Rows only carry a time of day, so every timestamp is placed on the configured survey date.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use wifitsv_core::{canonicalize, RawObservation, Result, WifiTsvError};

use super::{line_location, parse_field, Extracted, LineAdapter};

/// Command line name.
pub const FORMAT: &str = "ns1";

/// NetStumbler reports SNR, not dBm. Offset that maps SNR 99 to 0 dBm.
const SNR_TO_DBM_OFFSET: i32 = 99;

static RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^([NS])\x20(\d{1,3}\.\d+)\t                          # latitude
        ([EW])\x20(\d{1,3}\.\d+)\t                           # longitude
        \(\x20(.+)\x20\)\t                                   # SSID
        (?:ad-hoc|I?BSS|\?\?\?)\t                            # type
        \(\x20((?:[0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2})\x20\)\t # BSSID
        (\d\d:\d\d:\d\d)\x20\(GMT\)\t                        # time of day
        \[\x20+(\d+)\x20+(?:\d+\x20\d+\x20)?\]\t             # SNR [signal noise]
        \x23                                                 # name follows
        ",
    )
    .expect("valid NS1 regex")
});

/// NS1 line adapter.
#[derive(Debug)]
pub struct Ns1 {
    survey_date: NaiveDate,
}

impl Ns1 {
    /// Creates an adapter that dates every row on `survey_date`.
    #[must_use]
    pub const fn new(survey_date: NaiveDate) -> Self {
        Self { survey_date }
    }
}

impl LineAdapter for Ns1 {
    fn parse_line(&mut self, lineno: u64, line: &str) -> Result<Extracted> {
        if line.starts_with('#') {
            return Ok(Extracted::Skip);
        }

        let at = line_location(lineno);
        let caps = RECORD
            .captures(line)
            .ok_or_else(|| WifiTsvError::grammar(FORMAT, &at, format!("no match: {line}")))?;

        let mut latitude: f64 = parse_field(FORMAT, &at, "latitude", &caps[2])?;
        if &caps[1] == "S" {
            latitude = -latitude;
        }
        let mut longitude: f64 = parse_field(FORMAT, &at, "longitude", &caps[4])?;
        if &caps[3] == "W" {
            longitude = -longitude;
        }

        let time = NaiveTime::parse_from_str(&caps[7], "%H:%M:%S").map_err(|_| {
            WifiTsvError::grammar(FORMAT, &at, format!("bad time: \"{}\"", &caps[7]))
        })?;
        let timestamp = self.survey_date.and_time(time).and_utc().timestamp();

        let snr: i32 = parse_field(FORMAT, &at, "SNR", &caps[8])?;
        if !(0..=99).contains(&snr) {
            return Err(WifiTsvError::grammar(FORMAT, &at, format!("snr: \"{snr}\"")));
        }

        let raw = RawObservation::new(canonicalize(&caps[6])?, latitude, longitude, timestamp)
            .with_ssid(&caps[5])
            .with_signal(Some(snr - SNR_TO_DBM_OFFSET));

        Ok(Extracted::Observation(raw))
    }
}
