//! WiFiFoFum KML export.
//!
//! ```text
//! <Placemark>
//! <name><![CDATA[Evm Basin]]></name>
//! <description><![CDATA[MAC: 0:15:6d:a9:6f:b3<br>Channel: 11<br>MaxRssi: -95<br>Security: WPA<br>Type: Access Point<br>FirstSeen: 2011-04-09 22:41:34 +0000<br>LastSeen: 2011-04-09 22:41:34 +0000]]></description>
//! <Point>
//! <coordinates>-122.303577,37.825634,0.188093</coordinates>
//! </Point>
//! </Placemark>
//! ```

use std::collections::HashMap;
use std::io::{BufRead, Write};

use chrono::DateTime;
use wifitsv_core::{canonicalize, RawObservation, Result, WifiTsvError};

use super::kml::{self, Placemark};
use super::{parse_field, Extracted, Pipeline};

/// Command line name.
pub const FORMAT: &str = "wififofum-kml";

const NAMESPACE: &str = "http://earth.google.com/kml/2.2";

const SECURITY_MODES: [&str; 5] = ["None", "Open", "WEP", "WPA", "WPA2"];

/// Converts a whole WiFiFoFum KML document.
///
/// # Errors
///
/// Returns the first grammar error, invariant violation or I/O failure.
pub fn convert<R: BufRead, W: Write>(input: R, pipeline: &mut Pipeline<'_, W>) -> Result<()> {
    kml::for_each_placemark(input, FORMAT, NAMESPACE, |placemark| {
        pipeline.accept(parse_placemark(&placemark)?)
    })
}

fn parse_placemark(placemark: &Placemark) -> Result<Extracted> {
    let at = placemark.location();
    let ssid = kml::parse_ssid(FORMAT, placemark)?;

    let fields = description_fields(&at, placemark.description(FORMAT)?)?;
    let field = |key: &str| {
        fields
            .get(key)
            .copied()
            .ok_or_else(|| WifiTsvError::grammar(FORMAT, &at, format!("missing {key}")))
    };

    let security = field("Security")?;
    if !SECURITY_MODES.contains(&security) {
        return Err(WifiTsvError::grammar(
            FORMAT,
            &at,
            format!("bad security \"{security}\""),
        ));
    }

    let last_seen = field("LastSeen")?;
    let timestamp = DateTime::parse_from_str(last_seen, "%Y-%m-%d %H:%M:%S %z")
        .map_err(|_| WifiTsvError::grammar(FORMAT, &at, format!("bad LastSeen: \"{last_seen}\"")))?
        .timestamp();

    let coordinates = kml::parse_coordinates(FORMAT, &at, placemark.coordinates(FORMAT)?)?;
    if coordinates.altitude.is_none() {
        return Err(WifiTsvError::grammar(FORMAT, &at, "missing altitude"));
    }

    let raw = RawObservation::new(
        canonicalize(field("MAC")?)?,
        coordinates.latitude,
        coordinates.longitude,
        timestamp,
    )
    .with_ssid(ssid)
    .with_altitude(coordinates.altitude)
    .with_channel(Some(parse_field(FORMAT, &at, "channel", field("Channel")?)?))
    .with_signal(Some(parse_field(FORMAT, &at, "MaxRssi", field("MaxRssi")?)?));

    Ok(Extracted::Observation(raw))
}

/// Splits `Key: value<br>Key: value...` into a map.
fn description_fields<'a>(at: &str, description: &'a str) -> Result<HashMap<&'a str, &'a str>> {
    description
        .split("<br>")
        .map(|entry| {
            entry.split_once(": ").ok_or_else(|| {
                WifiTsvError::grammar(FORMAT, at, format!("bad description entry \"{entry}\""))
            })
        })
        .collect()
}
