//! Kismet `.gpsxml` track.
//!
//! ```text
//! <gps-run gps-version="5" start-time="Sat Oct 26 12:01:55 2013">
//!     <network-file>2013-10-26_12_01_58.netxml</network-file>
//!     <gps-point bssid="84:9C:A6:68:A6:EB" source="84:9C:A6:68:A6:EB" time-sec="1382788919" time-usec="68917" lat="52.534924" lon="6.040472" spd="5.536000" heading="308.750000" fix="3" alt="-10.300000" signal_dbm="-55" noise_dbm="0"/>
//! </gps-run>
//! ```
//!
//! Points recorded for the GPS track itself use the pseudo-BSSID `GP:SD:TR:AC:KL:OG` and are
//! skipped. The track carries no SSIDs.

use std::borrow::Cow;
use std::io::{BufRead, Write};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use wifitsv_core::{canonicalize, RawObservation, Result, WifiTsvError, CONSTRAINTS};

use super::{parse_field, Extracted, Pipeline};

/// Command line name.
pub const FORMAT: &str = "kismet-gpsxml";

const TRACK_BSSID: &str = "GP:SD:TR:AC:KL:OG";

/// Smallest NMEA fix mode with a position (2 = 2D).
const MIN_FIX: u8 = 2;

/// Converts a whole gpsxml document.
///
/// # Errors
///
/// Returns the first grammar error, invariant violation or I/O failure.
pub fn convert<R: BufRead, W: Write>(input: R, pipeline: &mut Pipeline<'_, W>) -> Result<()> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut seen_root = false;
    let mut points = 0u64;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|err| {
            WifiTsvError::grammar(FORMAT, format!("byte {}", reader.buffer_position()), err.to_string())
        })?;

        match event {
            Event::Start(element) | Event::Empty(element) => {
                if !seen_root {
                    let name = element.local_name();
                    if name.as_ref() != b"gps-run" {
                        return Err(WifiTsvError::grammar(
                            FORMAT,
                            "document",
                            format!(
                                "expected <gps-run> root, got <{}>",
                                String::from_utf8_lossy(name.as_ref())
                            ),
                        ));
                    }
                    seen_root = true;
                } else if element.local_name().as_ref() == b"gps-point" {
                    points += 1;
                    pipeline.accept(parse_point(&element, points)?)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if seen_root {
        Ok(())
    } else {
        Err(WifiTsvError::grammar(FORMAT, "document", "no <gps-run> root element"))
    }
}

fn parse_point(point: &BytesStart<'_>, index: u64) -> Result<Extracted> {
    let at = format!("gps-point {index}");

    let bssid = required(point, &at, "bssid")?;
    if bssid == TRACK_BSSID {
        return Ok(Extracted::Skip);
    }

    if let Some(fix) = attribute(point, &at, "fix")? {
        let fix: u8 = parse_field(FORMAT, &at, "fix", &fix)?;
        if fix < MIN_FIX {
            return Ok(Extracted::Unusable("no position fix"));
        }
    }

    let altitude = attribute(point, &at, "alt")?
        .map(|alt| parse_field::<f64>(FORMAT, &at, "alt", &alt))
        .transpose()?
        .filter(|alt| CONSTRAINTS.altitude.contains(alt));

    let signal = attribute(point, &at, "signal_dbm")?
        .map(|dbm| parse_field::<i32>(FORMAT, &at, "signal_dbm", &dbm))
        .transpose()?
        .filter(|&dbm| dbm != 0);

    let raw = RawObservation::new(
        canonicalize(&bssid)?,
        parse_field(FORMAT, &at, "lat", &required(point, &at, "lat")?)?,
        parse_field(FORMAT, &at, "lon", &required(point, &at, "lon")?)?,
        parse_field(FORMAT, &at, "time-sec", &required(point, &at, "time-sec")?)?,
    )
    .with_altitude(altitude)
    .with_signal(signal);

    Ok(Extracted::Observation(raw))
}

fn attribute(point: &BytesStart<'_>, at: &str, name: &str) -> Result<Option<String>> {
    let grammar = |err: &dyn std::fmt::Display| WifiTsvError::grammar(FORMAT, at, err.to_string());
    point
        .try_get_attribute(name)
        .map_err(|err| grammar(&err))?
        .map(|attr| attr.unescape_value().map(Cow::into_owned).map_err(|err| grammar(&err)))
        .transpose()
}

fn required(point: &BytesStart<'_>, at: &str, name: &str) -> Result<String> {
    attribute(point, at, name)?
        .ok_or_else(|| WifiTsvError::grammar(FORMAT, at, format!("missing {name}")))
}
