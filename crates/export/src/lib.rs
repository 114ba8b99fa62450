//! Export helpers for CSV flight data and JSON sweep manifests.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no channels selected for export")]
    NoChannels,
    #[error("comment marker `{0}` would be quoted in the header row")]
    CommentMarker(String),
    #[error("flight data has no `{0}` channel")]
    MissingChannel(String),
    #[error("channel `{symbol}` has {found} values, expected {expected}")]
    RaggedBranch {
        symbol: String,
        expected: usize,
        found: usize,
    },
}

pub mod flight_csv {
    use std::fs::File;
    use std::io::{BufWriter, Write};
    use std::path::Path;

    use sweep_core::channels::DataChannel;
    use sweep_engine::FlightDataBranch;

    use super::ExportError;

    /// Layout of an exported CSV file.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CsvFormat {
        pub delimiter: u8,
        /// Fixed number of decimals per value.
        pub precision: usize,
        pub comment_marker: String,
        /// Write the commented `name (unit)` header row.
        pub field_comments: bool,
    }

    impl Default for CsvFormat {
        fn default() -> Self {
            Self {
                delimiter: b',',
                precision: 3,
                comment_marker: "#".to_string(),
                field_comments: true,
            }
        }
    }

    /// Header fields for `channels`, the first one prefixed by the comment marker.
    pub fn header_fields(channels: &[DataChannel], format: &CsvFormat) -> Vec<String> {
        channels
            .iter()
            .enumerate()
            .map(|(i, channel)| {
                if i == 0 {
                    format!("{} {}", format.comment_marker, channel.label())
                } else {
                    channel.label()
                }
            })
            .collect()
    }

    /// Write `branch` as CSV, one column per channel in order. Returns the row count.
    pub fn export_csv<W: Write>(
        writer: W,
        branch: &FlightDataBranch,
        channels: &[DataChannel],
        format: &CsvFormat,
    ) -> Result<usize, ExportError> {
        if channels.is_empty() {
            return Err(ExportError::NoChannels);
        }
        if format.field_comments
            && format
                .comment_marker
                .bytes()
                .any(|b| b == format.delimiter || matches!(b, b'"' | b'\r' | b'\n'))
        {
            return Err(ExportError::CommentMarker(format.comment_marker.clone()));
        }
        let columns = channels
            .iter()
            .map(|channel| {
                let symbol = channel.quantity.symbol();
                branch
                    .get(symbol)
                    .ok_or_else(|| ExportError::MissingChannel(symbol.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = columns[0].len();
        for (channel, column) in channels.iter().zip(&columns) {
            if column.len() != rows {
                return Err(ExportError::RaggedBranch {
                    symbol: channel.quantity.symbol().to_string(),
                    expected: rows,
                    found: column.len(),
                });
            }
        }

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(format.delimiter)
            .has_headers(false)
            .from_writer(writer);
        if format.field_comments {
            csv_writer.write_record(header_fields(channels, format))?;
        }
        let mut record = Vec::with_capacity(channels.len());
        for row in 0..rows {
            record.clear();
            for (channel, column) in channels.iter().zip(&columns) {
                let value = channel.unit.from_si(column[row]);
                record.push(format!("{:.*}", format.precision, value));
            }
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(rows)
    }

    /// Create (or truncate) `path` and export into it. The parent directory must exist.
    pub fn export_csv_file(
        path: &Path,
        branch: &FlightDataBranch,
        channels: &[DataChannel],
        format: &CsvFormat,
    ) -> Result<usize, ExportError> {
        let file = File::create(path)?;
        export_csv(BufWriter::new(file), branch, channels, format)
    }
}

pub mod manifest {
    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::{Path, PathBuf};
    use sweep_core::options::LaunchSettings;
    use sweep_core::schedule::SweepParameters;

    use super::ExportError;

    /// File name of the manifest inside a sweep directory.
    pub const MANIFEST_FILE: &str = "sweep.json";

    /// Summary of one completed sweep.
    #[derive(Debug, Clone, Serialize)]
    pub struct Manifest {
        pub document: PathBuf,
        /// Sweep start, truncated to the minute.
        pub started_at: String,
        pub parameters: SweepParameters,
        pub launch: LaunchSettings,
        pub channels: Vec<String>,
        pub runs: Vec<ManifestRun>,
    }

    /// Parameters and output of one iteration.
    #[derive(Debug, Clone, Serialize)]
    pub struct ManifestRun {
        pub iteration: usize,
        pub wind_speed_m_s: f64,
        pub turbulence_intensity: f64,
        pub file: String,
        pub rows: usize,
    }

    /// Write `manifest` as pretty JSON into `dir`, returning the file path.
    pub fn write_manifest(dir: &Path, manifest: &Manifest) -> Result<PathBuf, ExportError> {
        let path = dir.join(MANIFEST_FILE);
        to_writer_pretty(BufWriter::new(File::create(&path)?), manifest)?;
        Ok(path)
    }
}
