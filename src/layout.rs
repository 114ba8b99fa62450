//! Timestamped output directory layout.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Timelike};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H-%M";

/// Where one sweep writes its files: `<root>/<YYYY-MM-DD>/<HH-MM>/<i>.csv`.
///
/// The stamp is taken once when the sweep starts, so every file of a sweep
/// lands in the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    started_at: NaiveDateTime,
}

impl OutputLayout {
    /// Layout under `root` for a sweep started at `started_at`.
    pub fn new(root: impl Into<PathBuf>, started_at: NaiveDateTime) -> Self {
        Self {
            root: root.into(),
            started_at: truncate_to_minute(started_at),
        }
    }

    /// Base results directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sweep start, truncated to the minute.
    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    /// `<root>/<YYYY-MM-DD>/<HH-MM>`.
    pub fn directory(&self) -> PathBuf {
        self.root
            .join(self.started_at.format(DATE_FORMAT).to_string())
            .join(self.started_at.format(TIME_FORMAT).to_string())
    }

    /// CSV path of iteration `iteration`, e.g. `.../3.csv`.
    pub fn file_for(&self, iteration: usize) -> PathBuf {
        self.directory().join(format!("{iteration}.csv"))
    }

    /// Create the sweep directory and its parents. Succeeds if it already exists.
    pub fn create(&self) -> io::Result<PathBuf> {
        let dir = self.directory();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.date()
        .and_hms_opt(at.hour(), at.minute(), 0)
        .unwrap_or(at)
}
