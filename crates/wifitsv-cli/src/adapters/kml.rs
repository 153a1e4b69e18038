//! Streaming `Placemark` walker shared by the KML adapters.
//!
//! Only the three leaves the adapters need are collected: the placemark's own `name` and
//! `description`, and `Point/coordinates`. Text and CDATA content are concatenated.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use wifitsv_core::{Result, WifiTsvError, CONSTRAINTS};

/// The parts of one `<Placemark>` the adapters read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placemark {
    /// 1-based position in the document.
    pub index: u64,
    /// `<name>` text.
    pub name: Option<String>,
    /// `<description>` text.
    pub description: Option<String>,
    /// `<Point><coordinates>` text.
    pub coordinates: Option<String>,
}

impl Placemark {
    /// Location used in error messages.
    #[must_use]
    pub fn location(&self) -> String {
        format!("placemark {}", self.index)
    }

    /// Returns the description or a grammar error naming the placemark.
    ///
    /// # Errors
    ///
    /// Returns a grammar error if the placemark has no description.
    pub fn description(&self, format: &'static str) -> Result<&str> {
        self.description
            .as_deref()
            .ok_or_else(|| WifiTsvError::grammar(format, self.location(), "missing description"))
    }

    /// Returns the coordinates or a grammar error naming the placemark.
    ///
    /// # Errors
    ///
    /// Returns a grammar error if the placemark has no point coordinates.
    pub fn coordinates(&self, format: &'static str) -> Result<&str> {
        self.coordinates
            .as_deref()
            .ok_or_else(|| WifiTsvError::grammar(format, self.location(), "missing coordinates"))
    }
}

/// `<coordinates>` content: `lon,lat[,alt]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
enum Leaf {
    Name,
    Description,
    Coordinates,
}

/// Calls `on_placemark` for every `<Placemark>` in a KML document whose root `<kml>` element
/// declares `namespace`.
///
/// # Errors
///
/// Returns a grammar error for malformed XML or an unexpected root element, and any error
/// returned by `on_placemark`.
pub fn for_each_placemark<R, F>(
    input: R,
    format: &'static str,
    namespace: &str,
    mut on_placemark: F,
) -> Result<()>
where
    R: BufRead,
    F: FnMut(Placemark) -> Result<()>,
{
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;
    let mut count = 0u64;
    let mut current: Option<Placemark> = None;
    let mut leaf: Option<Leaf> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|err| {
            WifiTsvError::grammar(format, format!("byte {}", reader.buffer_position()), err.to_string())
        })?;

        match event {
            Event::Start(element) => {
                if !seen_root {
                    check_root(&element, format, namespace)?;
                    seen_root = true;
                }
                let tag = element.local_name().as_ref().to_vec();
                let parent = open.last().map(Vec::as_slice);
                match (tag.as_slice(), parent) {
                    (b"Placemark", _) => {
                        count += 1;
                        current = Some(Placemark {
                            index: count,
                            ..Placemark::default()
                        });
                    }
                    (b"name", Some(b"Placemark")) if current.is_some() => leaf = Some(Leaf::Name),
                    (b"description", Some(b"Placemark")) if current.is_some() => {
                        leaf = Some(Leaf::Description);
                    }
                    (b"coordinates", Some(b"Point")) if current.is_some() => {
                        leaf = Some(Leaf::Coordinates);
                    }
                    _ => {}
                }
                open.push(tag);
            }
            Event::Empty(element) => {
                if !seen_root {
                    check_root(&element, format, namespace)?;
                    seen_root = true;
                } else if element.local_name().as_ref() == b"Placemark" {
                    count += 1;
                    on_placemark(Placemark {
                        index: count,
                        ..Placemark::default()
                    })?;
                }
            }
            Event::Text(text) => {
                if let (Some(leaf), Some(placemark)) = (leaf, current.as_mut()) {
                    let text = text.unescape().map_err(|err| {
                        WifiTsvError::grammar(format, placemark.location(), err.to_string())
                    })?;
                    append(placemark, leaf, &text);
                }
            }
            Event::CData(data) => {
                if let (Some(leaf), Some(placemark)) = (leaf, current.as_mut()) {
                    append(placemark, leaf, &String::from_utf8_lossy(&data));
                }
            }
            Event::End(element) => {
                leaf = None;
                open.pop();
                if element.local_name().as_ref() == b"Placemark" {
                    if let Some(placemark) = current.take() {
                        on_placemark(placemark)?;
                    }
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
        Err(WifiTsvError::grammar(format, "document", "no <kml> root element"))
    }
}

fn check_root(root: &BytesStart<'_>, format: &'static str, namespace: &str) -> Result<()> {
    let name = root.local_name();
    if name.as_ref() != b"kml" {
        return Err(WifiTsvError::grammar(
            format,
            "document",
            format!("expected <kml> root, got <{}>", String::from_utf8_lossy(name.as_ref())),
        ));
    }

    let declared = root
        .try_get_attribute("xmlns")
        .map_err(|err| WifiTsvError::grammar(format, "document", err.to_string()))?
        .map(|attr| attr.unescape_value().map(|value| value.into_owned()))
        .transpose()
        .map_err(|err| WifiTsvError::grammar(format, "document", err.to_string()))?;

    match declared {
        Some(ns) if ns == namespace => Ok(()),
        Some(ns) => Err(WifiTsvError::grammar(
            format,
            "document",
            format!("namespace \"{ns}\", expected \"{namespace}\""),
        )),
        None => Err(WifiTsvError::grammar(
            format,
            "document",
            format!("missing xmlns, expected \"{namespace}\""),
        )),
    }
}

fn append(placemark: &mut Placemark, leaf: Leaf, text: &str) {
    let slot = match leaf {
        Leaf::Name => &mut placemark.name,
        Leaf::Description => &mut placemark.description,
        Leaf::Coordinates => &mut placemark.coordinates,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

/// Placemark name as an SSID. A missing name and the literal `(null)` both mean hidden.
///
/// # Errors
///
/// Returns a grammar error if the name is longer than an SSID can be.
pub fn parse_ssid(format: &'static str, placemark: &Placemark) -> Result<String> {
    let name = placemark.name.as_deref().unwrap_or_default();
    if name.len() > CONSTRAINTS.max_ssid_bytes {
        return Err(WifiTsvError::grammar(
            format,
            placemark.location(),
            format!("SSID too long: \"{name}\""),
        ));
    }
    if name == "(null)" {
        return Ok(String::new());
    }
    Ok(name.to_owned())
}

/// Parses `lon,lat[,alt]`.
///
/// # Errors
///
/// Returns a grammar error if either coordinate is missing or not a number.
pub fn parse_coordinates(format: &'static str, location: &str, text: &str) -> Result<Coordinates> {
    let parts: Vec<&str> = text.trim().split(',').map(str::trim).collect();
    let [longitude, latitude, rest @ ..] = parts.as_slice() else {
        return Err(WifiTsvError::grammar(
            format,
            location,
            format!("expected lon,lat[,alt], got \"{text}\""),
        ));
    };

    let longitude = super::parse_field(format, location, "longitude", longitude)?;
    let latitude = super::parse_field(format, location, "latitude", latitude)?;
    let altitude = rest
        .first()
        .map(|altitude| super::parse_field(format, location, "altitude", altitude))
        .transpose()?;

    Ok(Coordinates {
        longitude,
        latitude,
        altitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://earth.google.com/kml/2.2";

    fn collect(xml: &str) -> Result<Vec<Placemark>> {
        let mut placemarks = Vec::new();
        for_each_placemark(xml.as_bytes(), "test-kml", NS, |p| {
            placemarks.push(p);
            Ok(())
        })?;
        Ok(placemarks)
    }

    #[test]
    fn test_collects_leaves() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://earth.google.com/kml/2.2">
<Document>
<name>document name</name>
<Placemark>
<name><![CDATA[Evm Basin]]></name>
<description><![CDATA[MAC: 0:15:6d:a9:6f:b3<br>Channel: 11]]></description>
<Style><name>ignored</name></Style>
<Point>
<coordinates>-122.303577,37.825634,0.188093</coordinates>
</Point>
</Placemark>
<Placemark>
<name>A &amp; B</name>
</Placemark>
</Document>
</kml>"#;
        let placemarks = collect(xml).unwrap();
        assert_eq!(placemarks.len(), 2);

        let first = &placemarks[0];
        assert_eq!(first.index, 1);
        assert_eq!(first.name.as_deref(), Some("Evm Basin"));
        assert_eq!(
            first.description.as_deref(),
            Some("MAC: 0:15:6d:a9:6f:b3<br>Channel: 11")
        );
        assert_eq!(first.coordinates.as_deref(), Some("-122.303577,37.825634,0.188093"));

        let second = &placemarks[1];
        assert_eq!(second.index, 2);
        assert_eq!(second.name.as_deref(), Some("A & B"));
        assert!(second.description("test-kml").is_err());
        assert!(second.coordinates("test-kml").is_err());
    }

    #[test]
    fn test_wrong_namespace_rejected() {
        let err = collect(r#"<kml xmlns="http://www.opengis.net/kml/2.2"></kml>"#).unwrap_err();
        assert!(err.is_grammar_error());
        assert!(err.to_string().contains("namespace"));
    }

    #[test]
    fn test_wrong_root_rejected() {
        let err = collect("<gpx></gpx>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "test-kml: document: expected <kml> root, got <gpx>"
        );
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(collect("").unwrap_err().is_grammar_error());
    }

    #[test]
    fn test_malformed_xml_rejected() {
        let xml = r#"<kml xmlns="http://earth.google.com/kml/2.2"><Placemark></Document></kml>"#;
        assert!(collect(xml).unwrap_err().is_grammar_error());
    }

    #[test]
    fn test_parse_ssid() {
        let named = |name: &str| Placemark {
            index: 1,
            name: Some(name.to_owned()),
            ..Placemark::default()
        };
        assert_eq!(parse_ssid("test-kml", &named("(null)")).unwrap(), "");
        assert_eq!(parse_ssid("test-kml", &Placemark::default()).unwrap(), "");
        assert_eq!(parse_ssid("test-kml", &named("linksys")).unwrap(), "linksys");
        assert!(parse_ssid("test-kml", &named(&"x".repeat(33))).is_err());
    }

    #[test]
    fn test_parse_coordinates() {
        let c = parse_coordinates("test-kml", "placemark 1", "-122.303577,37.825634,0.188093").unwrap();
        assert_eq!(c.longitude, -122.303_577);
        assert_eq!(c.latitude, 37.825_634);
        assert_eq!(c.altitude, Some(0.188_093));

        let c = parse_coordinates("test-kml", "placemark 1", " 6.14352,46.20082 ").unwrap();
        assert_eq!(c.altitude, None);

        assert!(parse_coordinates("test-kml", "placemark 1", "6.14352").is_err());
        assert!(parse_coordinates("test-kml", "placemark 1", "6.1,46.2,high").is_err());
    }
}
