//! Common subtitle types and structures.
//!
//! This module defines the core types shared by the subtitle writers: the
//! millisecond [`Timestamp`] and the [`CaptionFrame`] record produced by the
//! teletext frame formatter.

use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with subtitle output.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubtitleError {
    /// The underlying writer failed.
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for subtitle operations.
pub type SubtitleResult<T> = Result<T, SubtitleError>;

/// Represents a timestamp with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    /// Total milliseconds from the start.
    pub milliseconds: u64,
}

impl Timestamp {
    /// Creates a new timestamp from hours, minutes, seconds, and milliseconds.
    pub fn new(hours: u64, minutes: u64, seconds: u64, milliseconds: u64) -> Self {
        Self {
            milliseconds: hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + milliseconds,
        }
    }

    /// Creates a new timestamp from total milliseconds.
    pub fn from_millis(milliseconds: u64) -> Self {
        Self { milliseconds }
    }

    /// Returns the hours component.
    pub fn hours(&self) -> u64 {
        self.milliseconds / 3_600_000
    }

    /// Returns the minutes component (0-59).
    pub fn minutes(&self) -> u64 {
        (self.milliseconds % 3_600_000) / 60_000
    }

    /// Returns the seconds component (0-59).
    pub fn seconds(&self) -> u64 {
        (self.milliseconds % 60_000) / 1000
    }

    /// Returns the milliseconds component (0-999).
    pub fn millis(&self) -> u64 {
        self.milliseconds % 1000
    }

    /// Returns the total duration in seconds as a float.
    pub fn as_seconds_f64(&self) -> f64 {
        self.milliseconds as f64 / 1000.0
    }

    /// Formats the timestamp in SRT format (HH:MM:SS,mmm).
    pub fn to_srt_string(&self) -> String {
        format!(
            "{:02}:{:02}:{:02},{:03}",
            self.hours(),
            self.minutes(),
            self.seconds(),
            self.millis()
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_srt_string())
    }
}

/// One decoded subtitle: show time, hide time and formatted text rows.
///
/// Rows arrive from the frame formatter already trimmed and, in colour mode,
/// already carrying `<font>` markup and HTML entities. How rows are joined
/// (CRLF for SRT, a single space for search-engine output) is the writer's
/// decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionFrame {
    /// When the subtitle appears.
    pub show: Timestamp,
    /// When the subtitle disappears. Never earlier than `show`.
    pub hide: Timestamp,
    /// Formatted text rows, top to bottom. May be empty.
    pub rows: Vec<String>,
}

impl CaptionFrame {
    /// Creates a new caption frame, clamping `hide` to `show` if needed.
    pub fn new(show: Timestamp, hide: Timestamp, rows: Vec<String>) -> Self {
        Self {
            show,
            hide: hide.max(show),
            rows,
        }
    }

    /// Duration of the frame in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.hide.milliseconds - self.show.milliseconds
    }
}
