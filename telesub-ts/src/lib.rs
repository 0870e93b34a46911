//! # Telesub TS
//!
//! MPEG Transport Stream demultiplexing support for the Telesub library,
//! covering exactly what a teletext extraction pipeline needs:
//!
//! - **188/192-byte packets**: TS packet framing with sync validation and
//!   buffered realignment; BDAV M2TS prefix handling
//! - **Header parsing**: PID, payload-unit-start, continuity counter,
//!   scrambling and adaptation flags via explicit masking
//! - **PCR**: Program Clock Reference extraction from adaptation fields
//! - **PAT/PMT analysis**: program map discovery and teletext elementary
//!   stream detection (stream_type 0x06 + VBI/teletext descriptors)
//! - **PES reassembly**: continuity-checked payload accumulation and
//!   Private Stream 1 header parsing with PTS extraction
//!
//! ## Example
//!
//! ```no_run
//! use telesub_ts::TsDemuxer;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn run() -> telesub_ts::Result<()> {
//! let file = File::open("input.ts")?;
//! let mut demuxer = TsDemuxer::new(BufReader::new(file));
//!
//! while let Some(packet) = demuxer.read_packet()? {
//!     println!("PID 0x{:04X}", packet.pid());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## MPEG-TS structure
//!
//! ```text
//! +------+----------------+----------------------------+
//! | Sync | TEI PUSI TP    | Adaptation | Payload       |
//! | 0x47 | PID  SC AFC CC | Field      |               |
//! +------+----------------+----------------------------+
//!    1        3 bytes        0-183        0-184 bytes
//! ```

pub mod demuxer;
pub mod error;
pub mod packet;
pub mod pes;
pub mod psi;

pub use demuxer::TsDemuxer;
pub use error::{Result, TsError};
pub use packet::{
    AdaptationField, Pcr, ScramblingControl, TsHeader, TsPacket, M2TS_PACKET_SIZE, PID_FIRST_PRIVATE,
    PID_MAX, PID_NULL, PID_PAT, SYNC_BYTE, TS_PACKET_SIZE, TS_PAYLOAD_SIZE,
};
pub use pes::{
    PesAssembler, PesHeader, PesPush, PesTimestamp, PAYLOAD_BUFFER_SIZE, PES_START_CODE_PREFIX,
    STREAM_ID_PRIVATE_1,
};
pub use psi::{parse_pat, parse_pmt, MAX_TRACKED_PIDS, STREAM_TYPE_PRIVATE_PES};
