//! # Telesub Subtitle
//!
//! Caption frame records and subtitle serialization for the Telesub library.
//!
//! The teletext decoding pipeline produces [`CaptionFrame`] values: a show
//! timestamp, a hide timestamp and the formatted text rows of one subtitle.
//! This crate defines that record plus the writers that turn an ordered
//! sequence of frames into a document:
//!
//! - [`srt`]: SubRip output (`index`, `HH:MM:SS,mmm --> HH:MM:SS,mmm`, text,
//!   blank line; CRLF line endings).
//! - [`search`]: search-engine output (one `seconds|text` line per frame).
//!
//! ## Example
//!
//! ```
//! use telesub_subtitle::{CaptionFrame, Timestamp, srt};
//!
//! let frames = vec![CaptionFrame::new(
//!     Timestamp::from_millis(40),
//!     Timestamp::from_millis(4760),
//!     vec!["-Chci tu pracovat.".into(), "-Pro vás je lepší volná noha.".into()],
//! )];
//!
//! let document = srt::write(&frames);
//! assert!(document.starts_with("1\r\n00:00:00,040 --> 00:00:04,760\r\n"));
//! ```

pub mod search;
pub mod srt;
pub mod types;

pub use types::{CaptionFrame, SubtitleError, SubtitleResult, Timestamp};
