//! Source format adapters.
//!
//! Each adapter turns one source record into a [`Extracted`] value: non-data to skip, a record
//! the format itself marks as unusable, or a [`RawObservation`] for the validator. Anything that
//! does not fit the format's grammar is a fatal [`WifiTsvError::Grammar`].
//!
//! Adapters are built fresh for every input file, so header-line bookkeeping never leaks from
//! one file into the next.

use std::borrow::Cow;
use std::io::{BufRead, Write};

use chrono::NaiveDateTime;
use clap::ValueEnum;
use tracing::{debug, info};
use wifitsv_core::{Config, DropReason, RawObservation, RecordValidator, Result, Verdict, WifiTsvError};

use crate::emit::TsvEmitter;

pub mod gmon;
pub mod iphone;
pub mod kismet_gpsxml;
pub mod kml;
pub mod ns1;
pub mod wififofum_kml;
pub mod wigle_csv;
pub mod wigle_kml;
pub mod wigle_tildesv;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// G-MoN semicolon-separated export.
    Gmon,
    /// CSV dump of the iOS `consolidated.db` WifiLocation table.
    IphoneConsolidatedDb,
    /// Kismet `.gpsxml` track.
    KismetGpsxml,
    /// NetStumbler text summary export.
    Ns1,
    /// WiFiFoFum KML export.
    WififofumKml,
    /// WiGLE Android CSV export.
    WigleCsv,
    /// WiGLE KML export.
    WigleKml,
    /// WiGLE tilde-separated dump.
    WigleTildesv,
}

impl Format {
    /// Name used in messages and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gmon => gmon::FORMAT,
            Self::IphoneConsolidatedDb => iphone::FORMAT,
            Self::KismetGpsxml => kismet_gpsxml::FORMAT,
            Self::Ns1 => ns1::FORMAT,
            Self::WififofumKml => wififofum_kml::FORMAT,
            Self::WigleCsv => wigle_csv::FORMAT,
            Self::WigleKml => wigle_kml::FORMAT,
            Self::WigleTildesv => wigle_tildesv::FORMAT,
        }
    }
}

/// What an adapter made of one source record.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// Header, comment or blank line.
    Skip,
    /// A data record the format itself marks as unusable (e.g. no position fix).
    Unusable(&'static str),
    /// Fields for the validator.
    Observation(RawObservation),
}

/// Per-file conversion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    /// Records read, including skipped ones.
    pub records: u64,
    /// Headers, comments and blank lines.
    pub skipped: u64,
    /// Records the adapter declared unusable.
    pub unusable: u64,
    /// Sightings written.
    pub emitted: u64,
    /// Dropped for the null BSSID.
    pub null_bssid: u64,
    /// Dropped for (0, 0) coordinates.
    pub null_coordinates: u64,
    /// Dropped for a mobile hotspot SSID.
    pub mobile_ssid: u64,
}

impl ConvertStats {
    /// Observations the validator filtered out.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.null_bssid + self.null_coordinates + self.mobile_ssid
    }
}

/// A line-oriented format.
pub trait LineAdapter {
    /// Parses one trimmed, non-blank line. `lineno` starts at 1.
    ///
    /// # Errors
    ///
    /// Returns a grammar error when the line does not belong to the format.
    fn parse_line(&mut self, lineno: u64, line: &str) -> Result<Extracted>;
}

/// Feeds extracted records through the validator into the emitter, keeping counts.
pub struct Pipeline<'a, W: Write> {
    validator: &'a RecordValidator,
    emitter: &'a mut TsvEmitter<W>,
    stats: ConvertStats,
}

impl<'a, W: Write> Pipeline<'a, W> {
    /// Creates a pipeline writing to `emitter`.
    pub fn new(validator: &'a RecordValidator, emitter: &'a mut TsvEmitter<W>) -> Self {
        Self {
            validator,
            emitter,
            stats: ConvertStats::default(),
        }
    }

    /// Handles one extracted record.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation from the validator, or a write error.
    pub fn accept(&mut self, extracted: Extracted) -> Result<()> {
        self.stats.records += 1;
        match extracted {
            Extracted::Skip => self.stats.skipped += 1,
            Extracted::Unusable(why) => {
                debug!(reason = why, "Record unusable");
                self.stats.unusable += 1;
            }
            Extracted::Observation(raw) => match self.validator.evaluate(raw)? {
                Verdict::Accepted(sighting) => {
                    self.emitter.write_sighting(&sighting)?;
                    self.stats.emitted += 1;
                }
                Verdict::Dropped(DropReason::NullBssid) => self.stats.null_bssid += 1,
                Verdict::Dropped(DropReason::NullCoordinates) => self.stats.null_coordinates += 1,
                Verdict::Dropped(DropReason::MobileSsid(_)) => self.stats.mobile_ssid += 1,
            },
        }
        Ok(())
    }

    /// Returns the counters.
    pub fn finish(self) -> ConvertStats {
        self.stats
    }
}

/// Converts one input stream in `format`, writing accepted sightings to `emitter`.
///
/// # Errors
///
/// Returns the first fatal error: grammar mismatch, invariant violation, or I/O failure.
pub fn convert<R: BufRead, W: Write>(
    format: Format,
    input: R,
    config: &Config,
    validator: &RecordValidator,
    emitter: &mut TsvEmitter<W>,
) -> Result<ConvertStats> {
    let mut pipeline = Pipeline::new(validator, emitter);

    match format {
        Format::Gmon => convert_lines(&mut gmon::Gmon::new(), input, &mut pipeline)?,
        Format::IphoneConsolidatedDb => {
            convert_lines(&mut iphone::ConsolidatedDb::new(), input, &mut pipeline)?;
        }
        Format::KismetGpsxml => kismet_gpsxml::convert(input, &mut pipeline)?,
        Format::Ns1 => convert_lines(
            &mut ns1::Ns1::new(config.ns1.survey_date),
            input,
            &mut pipeline,
        )?,
        Format::WififofumKml => wififofum_kml::convert(input, &mut pipeline)?,
        Format::WigleCsv => convert_lines(&mut wigle_csv::WigleCsv::new(), input, &mut pipeline)?,
        Format::WigleKml => wigle_kml::convert(input, &mut pipeline)?,
        Format::WigleTildesv => {
            convert_lines(&mut wigle_tildesv::WigleTildesv::new(), input, &mut pipeline)?;
        }
    }

    let stats = pipeline.finish();
    info!(
        format = format.name(),
        records = stats.records,
        skipped = stats.skipped,
        unusable = stats.unusable,
        emitted = stats.emitted,
        null_bssid = stats.null_bssid,
        null_coordinates = stats.null_coordinates,
        mobile_ssid = stats.mobile_ssid,
        "Converted input"
    );
    Ok(stats)
}

/// Runs a line adapter over every line of `input`.
///
/// Lines are trimmed of ASCII whitespace. Blank lines are skipped without reaching the adapter,
/// but still count towards line numbers. A line that is not valid UTF-8 is read as Latin-1 and
/// the SSID of its observation is mapped back to the original bytes.
///
/// # Errors
///
/// Returns the first fatal error from the adapter, the validator or the reader.
pub fn convert_lines<A: LineAdapter, R: BufRead, W: Write>(
    adapter: &mut A,
    mut input: R,
    pipeline: &mut Pipeline<'_, W>,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut lineno = 0u64;

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        lineno += 1;

        let (line, latin1) = match std::str::from_utf8(&buf) {
            Ok(line) => (Cow::Borrowed(line), false),
            Err(_) => (Cow::Owned(buf.iter().copied().map(char::from).collect()), true),
        };
        let line = line.trim_matches(|c: char| c.is_ascii_whitespace());
        if line.is_empty() {
            pipeline.accept(Extracted::Skip)?;
            continue;
        }
        let extracted = match adapter.parse_line(lineno, line)? {
            Extracted::Observation(mut raw) if latin1 => {
                raw.ssid = latin1_bytes(&raw.ssid);
                Extracted::Observation(raw)
            }
            extracted => extracted,
        };
        pipeline.accept(extracted)?;
    }
}

/// Re-encodes text decoded from Latin-1 into its source bytes.
fn latin1_bytes(text: &[u8]) -> Vec<u8> {
    String::from_utf8_lossy(text)
        .chars()
        .map(|c| u8::try_from(c).unwrap_or(b'?'))
        .collect()
}

/// Parses a naive date-time and interprets it as UTC.
pub(crate) fn utc_timestamp(text: &str, fmt: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(text, fmt)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Parses a number, mapping failure to a grammar error at `location`.
pub(crate) fn parse_field<T: std::str::FromStr>(
    format: &'static str,
    location: &str,
    name: &str,
    text: &str,
) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| WifiTsvError::grammar(format, location, format!("bad {name}: \"{text}\"")))
}

pub(crate) fn line_location(lineno: u64) -> String {
    format!("line {lineno}")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Runs `input` through `format` with default configuration and a validator pinned to
    /// 2020-01-01, returning the rendered TSV.
    pub fn convert_str(format: Format, input: &str) -> Result<(String, ConvertStats)> {
        let (out, stats) = convert_bytes(format, input.as_bytes())?;
        Ok((String::from_utf8(out).expect("utf-8 output"), stats))
    }

    /// Like [`convert_str`], for input and output that need not be UTF-8.
    pub fn convert_bytes(format: Format, input: &[u8]) -> Result<(Vec<u8>, ConvertStats)> {
        fn clock() -> i64 {
            1_577_836_800
        }
        let validator = RecordValidator::with_clock(clock);
        let mut emitter = TsvEmitter::new(Vec::new());
        let stats = convert(format, input, &Config::default(), &validator, &mut emitter)?;
        Ok((emitter.into_inner(), stats))
    }

    /// Unwraps an [`Extracted::Observation`].
    pub fn observation(extracted: Extracted) -> RawObservation {
        match extracted {
            Extracted::Observation(raw) => raw,
            other => panic!("expected observation, got {other:?}"),
        }
    }
}
