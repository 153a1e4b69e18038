//! WiGLE tilde-separated dump.
//!
//! ```text
//! netid~ssid~trilat~trilong~firsttime~channel~qos~flags~wep~lasttime~transid
//! 00:06:25:61:04:d0~linksys macHOME~37.78773880~-122.40343475~2002-05-17 00:00:00~6~0~0001~N~2004-05-03 00:00:00~20020605
//! ```
//!
//! There is no signal strength. `qos` (0 to 7) measures how often a network was confirmed and is
//! mapped linearly onto -99..=-64 dBm.

use once_cell::sync::Lazy;
use regex::Regex;
use wifitsv_core::{canonicalize, RawObservation, Result, WifiTsvError};

use super::{line_location, parse_field, utc_timestamp, Extracted, LineAdapter};

/// Command line name.
pub const FORMAT: &str = "wigle-tildesv";

static RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^((?:[0-9a-f]{2}:){5}[0-9a-f]{2})~                                           # netid
        ([^~]*)~                                                                     # SSID
        (-?\d{1,2}\.\d{8})~                                                          # trilat
        (-?\d{1,3}\.\d{8})~                                                          # trilong
        (?:20[01]\d-[0-2]\d-[0-3]\d|0000-00-00|1969-12-31|1970-01-\d{2})\x2000:00:00~  # firsttime
        (\d+|\x20)~                                                                  # channel
        ([0-7\x20])~                                                                 # qos
        (?:\d+|\x20)~                                                                # flags
        [?2NYW]~                                                                     # wep
        (20[01]\d-[0-2]\d-[0-3]\d\x2000:00:00)~                                      # lasttime
        (?:20[01]\d[01]\d[0-3]\d)?                                                   # transid
        ",
    )
    .expect("valid WiGLE tildesv regex")
});

/// Converts a 0..=7 confirmation score to a nominal dBm value.
const fn signal_from_qos(qos: i32) -> i32 {
    -99 + 5 * qos
}

/// SSIDs WiGLE writes for hidden networks.
fn is_hidden_ssid(ssid: &str) -> bool {
    matches!(ssid, "<no ssid>" | "(null)")
}

/// WiGLE tildesv line adapter. Line 1 is the column header.
#[derive(Debug, Default)]
pub struct WigleTildesv;

impl WigleTildesv {
    /// Creates an adapter for one file.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LineAdapter for WigleTildesv {
    fn parse_line(&mut self, lineno: u64, line: &str) -> Result<Extracted> {
        if lineno == 1 {
            return Ok(Extracted::Skip);
        }

        let at = line_location(lineno);
        let caps = RECORD
            .captures(line)
            .ok_or_else(|| WifiTsvError::grammar(FORMAT, &at, format!("no match: {line}")))?;

        let channel = match &caps[5] {
            " " => None,
            text => Some(parse_field::<u32>(FORMAT, &at, "channel", text)?).filter(|&ch| ch != 0),
        };
        let qos = match &caps[6] {
            " " => 0,
            text => parse_field(FORMAT, &at, "qos", text)?,
        };

        let timestamp = utc_timestamp(&caps[7], "%Y-%m-%d %H:%M:%S").ok_or_else(|| {
            WifiTsvError::grammar(FORMAT, &at, format!("bad lasttime: \"{}\"", &caps[7]))
        })?;

        let ssid = &caps[2];
        let raw = RawObservation::new(
            canonicalize(&caps[1])?,
            parse_field(FORMAT, &at, "trilat", &caps[3])?,
            parse_field(FORMAT, &at, "trilong", &caps[4])?,
            timestamp,
        )
        .with_ssid(if is_hidden_ssid(ssid) { "" } else { ssid })
        .with_channel(channel)
        .with_signal(Some(signal_from_qos(qos)));

        Ok(Extracted::Observation(raw))
    }
}
