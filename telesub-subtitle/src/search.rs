//! Search-engine output writer.
//!
//! A line-oriented alternative to SRT meant for indexing pipelines: each
//! frame becomes one line of the form `seconds|row row row `, where the show
//! time is printed as a floating-point second count (millisecond precision)
//! and every text row is followed by a single space.

use crate::types::{CaptionFrame, SubtitleError, SubtitleResult};
use std::io::Write;

/// Serializes caption frames to search-engine lines.
pub fn write(frames: &[CaptionFrame]) -> String {
    let mut output = String::new();

    for frame in frames {
        output.push_str(&format!("{:.3}|", frame.show.as_seconds_f64()));
        for row in &frame.rows {
            output.push_str(row);
            output.push(' ');
        }
        output.push_str("\r\n");
    }

    output
}

/// Writes search-engine lines to a writer.
pub fn write_to<W: Write>(frames: &[CaptionFrame], mut writer: W) -> SubtitleResult<()> {
    let content = write(frames);
    writer
        .write_all(content.as_bytes())
        .map_err(|e| SubtitleError::IoError(e.to_string()))?;
    Ok(())
}
