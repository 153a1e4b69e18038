//! WiGLE KML export.
//!
//! Each description entry wraps its value in `<b>...</b>`:
//!
//! ```text
//! <Placemark>
//! <name>linksys</name>
//! <description><![CDATA[BSSID: <b>00:06:25:61:04:d0</b><br/>Capabilities: <b>[ESS]</b><br/>Frequency: <b>2437</b><br/>Timestamp: <b>1386180033000</b>]]></description>
//! <Point><coordinates>-122.40343475,37.7877388</coordinates></Point>
//! </Placemark>
//! ```
//!
//! Cell towers share the file with Wi-Fi networks and carry ids such as `31040410_56978_2731527`
//! instead of a BSSID. They are mapped to the null BSSID so the validator filters them.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use once_cell::sync::Lazy;
use regex::Regex;
use wifitsv_core::constraints::NULL_BSSID;
use wifitsv_core::{canonicalize, RawObservation, Result, WifiTsvError};

use super::kml::{self, Placemark};
use super::{parse_field, Extracted, Pipeline};

/// Command line name.
pub const FORMAT: &str = "wigle-kml";

const NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

static CELL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+_\d{5}_\d+").expect("valid cell id regex"));

/// Converts a whole WiGLE KML document.
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

    let bssid = field("BSSID")?;
    let bssid = if CELL_ID.is_match(bssid) {
        NULL_BSSID.to_owned()
    } else {
        canonicalize(bssid)?
    };

    let millis: i64 = parse_field(FORMAT, &at, "timestamp", field("Timestamp")?)?;
    let coordinates = kml::parse_coordinates(FORMAT, &at, placemark.coordinates(FORMAT)?)?;

    let raw = RawObservation::new(
        bssid,
        coordinates.latitude,
        coordinates.longitude,
        millis.div_euclid(1000),
    )
    .with_ssid(ssid);

    Ok(Extracted::Observation(raw))
}

/// Splits `Key: <b>value</b><br/>...` into a map of unwrapped values.
fn description_fields<'a>(at: &str, description: &'a str) -> Result<HashMap<&'a str, &'a str>> {
    description
        .split("<br/>")
        .map(|entry| {
            entry
                .split_once(": ")
                .and_then(|(key, value)| Some((key, unwrap_tag(value)?)))
                .ok_or_else(|| {
                    WifiTsvError::grammar(FORMAT, at, format!("bad description entry \"{entry}\""))
                })
        })
        .collect()
}

/// Strips a 3-byte opening and 4-byte closing tag, e.g. `<b>` and `</b>`.
fn unwrap_tag(value: &str) -> Option<&str> {
    value.get(3..value.len().checked_sub(4)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::convert_str;
    use crate::adapters::Format;

    fn document(placemarks: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document>\n\
             <Folder><name>Wifi Networks</name>\n{placemarks}</Folder>\n</Document></kml>\n"
        )
    }

    fn placemark(name: &str, bssid: &str, millis: &str, coordinates: &str) -> String {
        format!(
            "<Placemark>\n<name><![CDATA[{name}]]></name>\n\
             <description><![CDATA[BSSID: <b>{bssid}</b><br/>Capabilities: <b>[WPA2-PSK-CCMP][ESS]</b><br/>Frequency: <b>2437</b><br/>Timestamp: <b>{millis}</b>]]></description>\n\
             <styleUrl>#highConfidence</styleUrl>\n\
             <Point>\n<coordinates>{coordinates}</coordinates>\n</Point>\n</Placemark>\n"
        )
    }

    #[test]
    fn test_convert_placemark() {
        let xml = document(&placemark(
            "linksys",
            "00:06:25:61:04:d0",
            "1386180033999",
            "-122.40343475,37.7877388",
        ));
        let (out, stats) = convert_str(Format::WigleKml, &xml).unwrap();
        assert_eq!(
            out,
            "00:06:25:61:04:d0\t1386180033\t37.787739\t-122.403435\t\t\t\t\t\tlinksys\n"
        );
        assert_eq!(stats.emitted, 1);
    }

    #[test]
    fn test_cell_tower_filtered() {
        let xml = document(&placemark(
            "T-Mobile",
            "31040410_56978_2731527",
            "1386180033000",
            "-122.40343475,37.7877388",
        ));
        let (out, stats) = convert_str(Format::WigleKml, &xml).unwrap();
        assert!(out.is_empty());
        assert_eq!(stats.null_bssid, 1);
    }

    #[test]
    fn test_null_name_is_hidden_ssid() {
        let xml = document(&placemark(
            "(null)",
            "00:06:25:61:04:d0",
            "1386180033000",
            "-122.40343475,37.7877388,12.5",
        ));
        let (out, _) = convert_str(Format::WigleKml, &xml).unwrap();
        assert!(out.ends_with("\t\t\t\t\t\t\n"), "{out}");
    }

    #[test]
    fn test_bad_bssid_is_fatal() {
        let xml = document(&placemark(
            "linksys",
            "not-a-mac",
            "1386180033000",
            "-122.40343475,37.7877388",
        ));
        let err = convert_str(Format::WigleKml, &xml).unwrap_err();
        assert!(!err.is_grammar_error());
        assert_eq!(err.error_code(), "INVALID_BSSID");
    }

    #[test]
    fn test_other_namespace_rejected() {
        let xml = "<kml xmlns=\"http://earth.google.com/kml/2.2\"></kml>";
        assert!(convert_str(Format::WigleKml, xml).unwrap_err().is_grammar_error());
    }

    #[test]
    fn test_unwrap_tag() {
        assert_eq!(unwrap_tag("<b>[ESS]</b>"), Some("[ESS]"));
        assert_eq!(unwrap_tag("<b></b>"), Some(""));
        assert_eq!(unwrap_tag("<b>"), None);
    }

    #[test]
    fn test_description_fields() {
        let fields = description_fields(
            "placemark 1",
            "BSSID: <b>00:06:25:61:04:d0</b><br/>Timestamp: <b>1</b>",
        )
        .unwrap();
        assert_eq!(fields["BSSID"], "00:06:25:61:04:d0");
        assert_eq!(fields["Timestamp"], "1");
        assert!(description_fields("placemark 1", "BSSID <b>x</b>").is_err());
    }
}
