//! # Telesub Teletext
//!
//! EBU teletext decoding for the Telesub library (ETS 300 706 Level 1, plus
//! the X/26, X/28/0 Format 1, X/28/4 and M/29 extensions caption streams
//! use in practice).
//!
//! The crate covers the whole path from bit-protected data units to caption
//! frames:
//!
//! - [`coding`]: Hamming 8/4, Hamming 24/18 and odd-parity protection
//! - [`charset`]: G0 Latin with national option sub-sets, G2, diacritics
//! - [`packet`]: 44-byte data unit framing and address decoding
//! - [`clock`]: PTS/PCR selection and monotonic caption timing
//! - [`decoder`]: packet dispatch and page assembly
//! - [`frame`]: page trimming, colour markup and frame emission
//!
//! ## Example
//!
//! ```
//! use telesub_teletext::{DataUnitId, FrameFormatter, TeletextDecoder, TeletextPacket};
//!
//! let mut decoder = TeletextDecoder::new(0x888);
//! let formatter = FrameFormatter::new(false);
//!
//! // Data units come from the PES layer, bit-reversed, 44 bytes each.
//! let raw = [0u8; 44];
//! let packet = TeletextPacket::new(&raw);
//! if let Some(page) = decoder.feed(DataUnitId::Subtitle, &packet, 0) {
//!     if let Some(frame) = formatter.format(&page) {
//!         println!("{} rows", frame.rows.len());
//!     }
//! }
//! ```

pub mod charset;
pub mod clock;
pub mod coding;
pub mod decoder;
pub mod frame;
pub mod packet;
pub mod page;

pub use charset::CharsetState;
pub use clock::{ClockSource, ClockTracker};
pub use decoder::{DecoderStats, TeletextDecoder};
pub use frame::{FrameFormatter, TELETEXT_COLOURS};
pub use packet::{DataUnitId, TeletextPacket, DATA_UNIT_SIZE};
pub use page::{PageBuffer, TransmissionMode, PAGE_COLS, PAGE_ROWS};
