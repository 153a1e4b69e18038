//! Conversion driver: one header, then every input file in order.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use anyhow::Context;
use tracing::{info, info_span};
use wifitsv_core::{Config, RecordValidator};

use crate::adapters::{self, ConvertStats};
use crate::args::Cli;
use crate::emit::TsvEmitter;

/// Totals over all input files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files converted.
    pub files: usize,
    /// Records read.
    pub records: u64,
    /// Sightings written.
    pub emitted: u64,
    /// Observations filtered out by the validator.
    pub dropped: u64,
}

impl RunSummary {
    fn add(&mut self, stats: &ConvertStats) {
        self.files += 1;
        self.records += stats.records;
        self.emitted += stats.emitted;
        self.dropped += stats.dropped();
    }
}

/// Converts every file named on the command line.
///
/// # Errors
///
/// Stops at the first file that cannot be opened or contains a fatal record.
pub fn run(cli: &Cli, config: &Config) -> anyhow::Result<RunSummary> {
    let out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    convert_files(cli, config, BufWriter::new(out))
}

/// Writes the header and converts `cli.files` into `out`.
///
/// # Errors
///
/// Stops at the first file that cannot be opened or contains a fatal record.
pub fn convert_files<W: Write>(cli: &Cli, config: &Config, out: W) -> anyhow::Result<RunSummary> {
    let validator = RecordValidator::new();
    let mut emitter = TsvEmitter::new(out);
    emitter.write_header().context("failed to write header")?;

    let mut summary = RunSummary::default();
    for path in &cli.files {
        let _span = info_span!("file", path = %path.display()).entered();

        let input = File::open(path)
            .map(BufReader::new)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let result = adapters::convert(cli.format, input, config, &validator, &mut emitter);

        // Rows already written stay valid; flush them before reporting.
        emitter.flush().context("failed to flush output")?;
        let stats = result.with_context(|| format!("{}", path.display()))?;
        summary.add(&stats);
    }

    info!(
        files = summary.files,
        records = summary.records,
        emitted = summary.emitted,
        dropped = summary.dropped,
        "Conversion complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;
    use tempfile::TempDir;

    const GMON_HEADER: &str =
        "BSSID;LAT;LON;SSID;Crypt;Beacon Interval;Connection Mode;Channel;RXL;Date;Time";

    fn write(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn cli(files: &[&str]) -> Cli {
        let mut args = vec!["wifitsv", "--format", "gmon"];
        args.extend_from_slice(files);
        Cli::try_parse_from(args).unwrap()
    }

    fn run_to_string(cli: &Cli) -> (anyhow::Result<RunSummary>, String) {
        let mut out = Vec::new();
        let result = convert_files(cli, &Config::default(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_single_header_for_many_files() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.txt",
            &format!("{GMON_HEADER}\n00:00:C5:B2:18:7C;46.80945;7.14751;johannes;Wep;-81;Infra;7;-79;2013/12/04;18:00:33\n"),
        );
        let b = write(
            &dir,
            "b.txt",
            &format!("{GMON_HEADER}\nFE:F5:28:D1:38:70;46.52202;6.62910;kolal;WPA2;-90;Infra;13;-88;2014/01/01;04:05:53\n"),
        );

        let (result, out) = run_to_string(&cli(&[a.as_str(), b.as_str()]));
        let summary = result.unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.emitted, 2);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], crate::emit::HEADER);
        assert!(lines[1].starts_with("00:00:c5:b2:18:7c\t"));
        assert!(lines[2].starts_with("fe:f5:28:d1:38:70\t"));
    }

    #[test]
    fn test_fatal_record_stops_run_after_flushing() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.txt",
            &format!("{GMON_HEADER}\n00:00:C5:B2:18:7C;46.80945;7.14751;johannes;Wep;-81;Infra;7;-79;2013/12/04;18:00:33\ngarbage\n"),
        );
        let b = write(&dir, "b.txt", &format!("{GMON_HEADER}\n"));

        let (result, out) = run_to_string(&cli(&[a.as_str(), b.as_str()]));
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("gmon: line 3: no match: garbage"));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_missing_file_names_path() {
        let missing = Path::new("/nonexistent/wifitsv/input.txt");
        let (result, out) = run_to_string(&cli(&[missing.to_str().unwrap()]));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to open /nonexistent/wifitsv/input.txt"));
        assert_eq!(out, format!("{}\n", crate::emit::HEADER));
    }

    #[test]
    fn test_run_writes_output_file() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "in.txt", &format!("{GMON_HEADER}\n"));
        let output = dir.path().join("out.tsv");

        let cli = Cli::try_parse_from([
            "wifitsv",
            "--format",
            "gmon",
            "--output",
            output.to_str().unwrap(),
            input.as_str(),
        ])
        .unwrap();
        let summary = run(&cli, &Config::default()).unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            format!("{}\n", crate::emit::HEADER)
        );
    }
}
