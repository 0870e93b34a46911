//! PES (Packetized Elementary Stream) packet handling.
//!
//! This module parses PES headers and reassembles the PES packets of a
//! single PID from TS packet payloads. Only the demuxing direction exists;
//! the pipeline never emits PES.

use crate::error::{Result, TsError};

/// PES start code prefix.
pub const PES_START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

/// Stream ID for Private Stream 1, the carrier of EBU teletext.
pub const STREAM_ID_PRIVATE_1: u8 = 0xBD;

/// Capacity of the reassembly buffer. A teletext PES packet never comes
/// close to this; blowing past it means the PID is not a teletext stream.
pub const PAYLOAD_BUFFER_SIZE: usize = 4096;

/// Parsed PTS or DTS timestamp.
///
/// PTS/DTS are 33-bit values encoded in 5 bytes with marker bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PesTimestamp {
    /// 33-bit timestamp value (90 kHz clock).
    pub value: u64,
}

impl PesTimestamp {
    /// Maximum value for 33-bit timestamp.
    pub const MAX_VALUE: u64 = (1u64 << 33) - 1;

    /// Clock rate (90 kHz).
    pub const CLOCK_RATE: u64 = 90_000;

    /// Create a new PES timestamp.
    pub fn new(value: u64) -> Self {
        Self {
            value: value & Self::MAX_VALUE,
        }
    }

    /// Parse PTS/DTS from 5 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 5 {
            return Err(TsError::invalid_pes("Timestamp requires 5 bytes"));
        }

        // Byte 0: pppp_ttt1 where pppp is prefix, ttt is ts[32:30]
        // Byte 1: tttt_tttt where t is ts[29:22]
        // Byte 2: tttt_ttt1 where t is ts[21:15]
        // Byte 3: tttt_tttt where t is ts[14:7]
        // Byte 4: tttt_ttt1 where t is ts[6:0]
        let value = ((data[0] as u64 & 0x0E) << 29)
            | ((data[1] as u64) << 22)
            | ((data[2] as u64 & 0xFE) << 14)
            | ((data[3] as u64) << 7)
            | ((data[4] as u64) >> 1);

        Ok(Self::new(value))
    }

    /// Convert to milliseconds (90 kHz -> ms).
    pub fn to_millis(&self) -> u64 {
        self.value / 90
    }
}

/// Parsed PES packet header.
#[derive(Debug, Clone)]
pub struct PesHeader {
    /// Stream ID.
    pub stream_id: u8,
    /// PES packet length field (0 means unbounded, video only).
    pub packet_length: u16,
    /// Whether the optional header (`10xx xxxx` marker) was present.
    pub has_optional_header: bool,
    /// Presentation timestamp, when signalled.
    pub pts: Option<PesTimestamp>,
    /// Offset of the first payload byte within the PES packet.
    pub payload_offset: usize,
}

impl PesHeader {
    /// Minimum PES header size (start code + stream_id + length).
    pub const MIN_SIZE: usize = 6;

    /// Parse a PES header from reassembled packet data.
    ///
    /// Unlike strict parsers this tolerates a missing optional header: some
    /// multiplexers emit Private Stream 1 packets without one.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE {
            return Err(TsError::invalid_pes("Data too short for PES header"));
        }

        if data[0..3] != PES_START_CODE_PREFIX {
            return Err(TsError::invalid_pes("Invalid PES start code prefix"));
        }

        let stream_id = data[3];
        let packet_length = ((data[4] as u16) << 8) | (data[5] as u16);

        let mut has_optional_header = false;
        let mut pts = None;
        let mut payload_offset = Self::MIN_SIZE;

        if data.len() >= 9 && (data[6] & 0xC0) == 0x80 {
            has_optional_header = true;
            let pts_flag = (data[7] & 0x80) != 0;
            let header_data_length = data[8] as usize;
            payload_offset = 9 + header_data_length;

            if pts_flag && data.len() >= 14 {
                pts = Some(PesTimestamp::parse(&data[9..14])?);
            }
        }

        Ok(Self {
            stream_id,
            packet_length,
            has_optional_header,
            pts,
            payload_offset,
        })
    }

    /// Total packet length in bytes as announced by the length field.
    pub fn total_length(&self) -> usize {
        Self::MIN_SIZE + self.packet_length as usize
    }
}

/// Outcome of feeding one TS packet payload into the assembler.
#[derive(Debug)]
pub enum PesPush {
    /// Payload accepted (or skipped while waiting for the first PUSI).
    Buffering,
    /// A payload-unit start completed the previous PES packet.
    Complete(Vec<u8>),
    /// Continuity counter mismatch; the buffer was discarded.
    Discontinuity {
        /// The counter value that was expected.
        expected: u8,
        /// The counter value that arrived.
        actual: u8,
    },
}

/// PES packet assembler for a single PID.
///
/// Collects TS packet payloads between payload-unit-start indicators and
/// enforces continuity counter sequencing. A PES packet is only known to be
/// complete when the next unit starts, so the final partial buffer of a
/// stream is never surfaced.
#[derive(Debug)]
pub struct PesAssembler {
    buffer: Vec<u8>,
    started: bool,
    continuity: Option<u8>,
    overflowed: bool,
}

impl Default for PesAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PesAssembler {
    /// Create a new PES assembler.
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(PAYLOAD_BUFFER_SIZE),
            started: false,
            continuity: None,
            overflowed: false,
        }
    }

    /// Feed one TS packet worth of payload.
    ///
    /// `discontinuity` is the adaptation-field discontinuity indicator, which
    /// exempts the packet from the continuity check.
    pub fn push(
        &mut self,
        payload_unit_start: bool,
        continuity_counter: u8,
        discontinuity: bool,
        payload: &[u8],
    ) -> PesPush {
        if let Some(previous) = self.continuity {
            if !discontinuity {
                let expected = (previous + 1) & 0x0F;
                if continuity_counter != expected {
                    self.buffer.clear();
                    self.started = false;
                    self.continuity = None;
                    return PesPush::Discontinuity {
                        expected,
                        actual: continuity_counter,
                    };
                }
            }
        }
        self.continuity = Some(continuity_counter);

        // Nothing to collect until the first unit starts.
        if !payload_unit_start && !self.started {
            return PesPush::Buffering;
        }

        let completed = if payload_unit_start && self.started && !self.buffer.is_empty() {
            Some(std::mem::take(&mut self.buffer))
        } else {
            None
        };

        if payload_unit_start {
            self.started = true;
            self.buffer.clear();
            self.overflowed = false;
        }

        if self.buffer.len() + payload.len() <= PAYLOAD_BUFFER_SIZE {
            self.buffer.extend_from_slice(payload);
        } else if !self.overflowed {
            self.overflowed = true;
            tracing::warn!(
                buffered = self.buffer.len(),
                "PES payload exceeds buffer size, probably not a teletext stream"
            );
        }

        match completed {
            Some(data) => PesPush::Complete(data),
            None => PesPush::Buffering,
        }
    }

    /// Number of buffered bytes.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
