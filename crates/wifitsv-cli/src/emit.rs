//! Canonical TSV output.

use std::borrow::Cow;
use std::fmt::Display;
use std::io::{self, Write};

use wifitsv_core::ApSighting;

/// Column header, in output order.
pub const HEADER: &str =
    "# BSSID\tTimestamp\tLatitude\tLongitude\tAccuracy\tAltitude\tAltitude_Accuracy\tChannel\tSignal_dBm\tSSID";

/// Writes sightings as tab-separated rows.
pub struct TsvEmitter<W: Write> {
    out: W,
    rows: u64,
}

impl<W: Write> TsvEmitter<W> {
    /// Wraps a writer. Nothing is written until [`write_header`](Self::write_header).
    pub const fn new(out: W) -> Self {
        Self { out, rows: 0 }
    }

    /// Writes the column header line.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.out, "{HEADER}")
    }

    /// Writes one data row. Absent optional fields are empty.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_sighting(&mut self, sighting: &ApSighting) -> io::Result<()> {
        write!(
            self.out,
            "{}\t{}\t{:.6}\t{:.6}\t{}\t{}\t{}\t{}\t{}\t",
            sighting.bssid(),
            sighting.timestamp(),
            sighting.latitude(),
            sighting.longitude(),
            Optional(sighting.accuracy()),
            Optional(sighting.altitude()),
            Optional(sighting.altitude_accuracy()),
            Optional(sighting.channel()),
            Optional(sighting.signal()),
        )?;
        self.out.write_all(&escape_ssid(sighting.ssid()))?;
        self.out.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    /// Number of data rows written so far.
    pub const fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Displays `Some(v)` as `v` and `None` as nothing.
struct Optional<T>(Option<T>);

impl<T: Display> Display for Optional<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => Ok(()),
        }
    }
}

/// Keeps every row on one line with exactly ten fields. Other bytes pass through untouched.
fn escape_ssid(ssid: &[u8]) -> Cow<'_, [u8]> {
    if !ssid.iter().any(|&b| matches!(b, b'\\' | b'\t' | b'\n' | b'\r')) {
        return Cow::Borrowed(ssid);
    }
    let mut escaped = Vec::with_capacity(ssid.len() + 4);
    for &byte in ssid {
        match byte {
            b'\\' => escaped.extend_from_slice(b"\\\\"),
            b'\t' => escaped.extend_from_slice(b"\\t"),
            b'\n' => escaped.extend_from_slice(b"\\n"),
            b'\r' => escaped.extend_from_slice(b"\\r"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifitsv_core::{RawObservation, RecordValidator};

    fn sighting(raw: RawObservation) -> ApSighting {
        RecordValidator::new().build(raw).unwrap().unwrap()
    }

    fn render(sightings: &[ApSighting]) -> String {
        let mut emitter = TsvEmitter::new(Vec::new());
        emitter.write_header().unwrap();
        for s in sightings {
            emitter.write_sighting(s).unwrap();
        }
        assert_eq!(emitter.rows(), sightings.len() as u64);
        String::from_utf8(emitter.into_inner()).unwrap()
    }

    #[test]
    fn test_header_only() {
        assert_eq!(render(&[]), format!("{HEADER}\n"));
    }

    #[test]
    fn test_full_row() {
        let s = sighting(
            RawObservation::new("00:21:7c:36:ea:a1", 37.842_907_248_996_2, -122.247_739_993_036, 1_323_632_065)
                .with_ssid("2WIRE493")
                .with_accuracy(Some(15.0))
                .with_altitude(Some(44.200_012_207_031_2))
                .with_channel(Some(2))
                .with_signal(Some(-84)),
        );
        let out = render(&[s]);
        let row = out.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "00:21:7c:36:ea:a1\t1323632065\t37.842907\t-122.247740\t15\t44.2000122070312\t\t2\t-84\t2WIRE493"
        );
    }

    #[test]
    fn test_absent_fields_are_empty() {
        let s = sighting(RawObservation::new("00:0b:33:02:00:0c", 37.88997, -122.13794, 0));
        let out = render(&[s]);
        let fields: Vec<&str> = out.lines().nth(1).unwrap().split('\t').collect();
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[1], "0");
        assert!(fields[4..].iter().all(|f| f.is_empty()));
    }

    #[test]
    fn test_zero_is_not_absent() {
        let s = sighting(
            RawObservation::new("00:0b:33:02:00:0c", 37.88997, -122.13794, 0)
                .with_altitude(Some(0.0))
                .with_channel(Some(0)),
        );
        let out = render(&[s]);
        let fields: Vec<&str> = out.lines().nth(1).unwrap().split('\t').collect();
        assert_eq!(fields[5], "0");
        assert_eq!(fields[7], "0");
    }

    #[test]
    fn test_ssid_control_characters_escaped() {
        assert_eq!(&*escape_ssid(b"plain"), b"plain");
        assert_eq!(&*escape_ssid(b"a\tb\nc\r"), b"a\\tb\\nc\\r");
    }

    #[test]
    fn test_ssid_backslash_escaped() {
        assert_eq!(&*escape_ssid(br"a\tb"), br"a\\tb");
        assert_ne!(escape_ssid(br"a\tb"), escape_ssid(b"a\tb"));
    }

    #[test]
    fn test_non_utf8_ssid_written_raw() {
        let s = sighting(
            RawObservation::new("00:0b:33:02:00:0c", 37.88997, -122.13794, 0).with_ssid(b"Caf\xe9".to_vec()),
        );
        let mut emitter = TsvEmitter::new(Vec::new());
        emitter.write_sighting(&s).unwrap();
        let out = emitter.into_inner();
        assert!(out.ends_with(b"\tCaf\xe9\n"));
        assert_eq!(out.iter().filter(|&&b| b == b'\t').count(), 9);
    }
}
