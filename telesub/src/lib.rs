//! # Telesub
//!
//! DVB teletext closed-caption extraction, written in Rust.
//!
//! Telesub demultiplexes an MPEG-2 Transport Stream (or BDAV M2TS) file,
//! reassembles the PES packets of its EBU teletext stream, decodes the
//! bit-error-protected teletext packets into 25x40 pages and emits caption
//! frames suitable for SubRip output.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use telesub::{ExtractOptions, TeletextExtractor};
//! use telesub_subtitle::srt;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! fn main() -> telesub::Result<()> {
//!     let options = ExtractOptions::new().page(888);
//!     let file = File::open("input.ts")?;
//!
//!     let mut extractor = TeletextExtractor::new(BufReader::new(file), options)?;
//!     let frames = extractor.run()?;
//!
//!     print!("{}", srt::write(&frames));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several crates:
//! - `telesub-ts`: transport stream framing, PSI analysis, PES reassembly
//! - `telesub-teletext`: bit-error codecs, character sets, page decoding
//! - `telesub-subtitle`: caption frame records and output writers
//!
//! This crate owns the pipeline: a [`TeletextExtractor`] pulls TS packets,
//! routes teletext PES payloads through the decoder and collects caption
//! frames in presentation order. There is no shared or global state; one
//! extractor value holds everything.

mod error;
mod extractor;
mod options;

// Re-export the pipeline building blocks for direct use.
pub use telesub_subtitle::{CaptionFrame, Timestamp};
pub use telesub_teletext::{
    ClockSource, ClockTracker, DecoderStats, FrameFormatter, TeletextDecoder, TeletextPacket,
};
pub use telesub_ts::{TsDemuxer, TsError, TsPacket};

// High-level API.
pub use error::{ExtractError, Result};
pub use extractor::{extract, ExtractStats, TeletextExtractor};
pub use options::{encode_page, ExtractOptions};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string.
pub fn version() -> &'static str {
    VERSION
}
