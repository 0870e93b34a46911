//! SRT (SubRip) subtitle writer.
//!
//! SRT is a simple and widely used subtitle format consisting of:
//! - A numeric index
//! - Timing in HH:MM:SS,mmm --> HH:MM:SS,mmm format
//! - Subtitle text (may contain basic HTML-like formatting)
//! - Blank line separator
//!
//! Entries are written with CRLF line endings, matching what most consumers
//! of broadcast-extracted subtitles expect.

use crate::types::{CaptionFrame, SubtitleError, SubtitleResult};
use std::io::Write;

/// UTF-8 byte order mark, written at the top of a file unless suppressed.
pub const UTF8_BOM: &str = "\u{feff}";

/// Serializes caption frames to an SRT document.
///
/// Indices are 1-based and follow the order of `frames`.
pub fn write(frames: &[CaptionFrame]) -> String {
    let mut output = String::new();

    for (index, frame) in frames.iter().enumerate() {
        output.push_str(&format!("{}\r\n", index + 1));
        output.push_str(&format!(
            "{} --> {}\r\n",
            frame.show.to_srt_string(),
            frame.hide.to_srt_string()
        ));
        for row in &frame.rows {
            output.push_str(row);
            output.push_str("\r\n");
        }
        output.push_str("\r\n");
    }

    output
}

/// Writes caption frames to an SRT writer.
pub fn write_to<W: Write>(frames: &[CaptionFrame], mut writer: W) -> SubtitleResult<()> {
    let content = write(frames);
    writer
        .write_all(content.as_bytes())
        .map_err(|e| SubtitleError::IoError(e.to_string()))?;
    Ok(())
}

/// The single placeholder entry emitted when a run produced no frames but the
/// caller asked for a non-empty document.
pub fn dummy_entry() -> String {
    "1\r\n00:00:00,000 --> 00:00:01,000\r\n\r\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn frame(show: u64, hide: u64, rows: &[&str]) -> CaptionFrame {
        CaptionFrame::new(
            Timestamp::from_millis(show),
            Timestamp::from_millis(hide),
            rows.iter().map(|r| r.to_string()).collect(),
        )
    }

    #[test]
    fn test_write_single_entry() {
        let output = write(&[frame(40, 4760, &["Hello, world!"])]);
        assert_eq!(
            output,
            "1\r\n00:00:00,040 --> 00:00:04,760\r\nHello, world!\r\n\r\n"
        );
    }

    #[test]
    fn test_write_multiline_entry() {
        let output = write(&[frame(
            1000,
            2000,
            &["-Chci tu pracovat.", "-Pro vás je lepší volná noha."],
        )]);
        assert!(output.contains("-Chci tu pracovat.\r\n-Pro vás je lepší volná noha.\r\n"));
    }

    #[test]
    fn test_write_sequential_indices() {
        let output = write(&[
            frame(0, 1000, &["a"]),
            frame(2000, 3000, &["b"]),
            frame(4000, 5000, &["c"]),
        ]);
        assert!(output.starts_with("1\r\n"));
        assert!(output.contains("\r\n\r\n2\r\n"));
        assert!(output.contains("\r\n\r\n3\r\n"));
    }

    #[test]
    fn test_write_empty_rows_entry() {
        // A frame whose rows were all trimmed away still gets its timing pair.
        let output = write(&[frame(0, 1000, &[])]);
        assert_eq!(output, "1\r\n00:00:00,000 --> 00:00:01,000\r\n\r\n");
    }

    #[test]
    fn test_write_empty_input() {
        assert_eq!(write(&[]), "");
    }

    #[test]
    fn test_dummy_entry_shape() {
        assert_eq!(dummy_entry(), "1\r\n00:00:00,000 --> 00:00:01,000\r\n\r\n");
    }

    #[test]
    fn test_write_to_writer() {
        let mut buf = Vec::new();
        write_to(&[frame(0, 500, &["x"])], &mut buf).unwrap();
        assert_eq!(buf, write(&[frame(0, 500, &["x"])]).as_bytes());
    }
}
