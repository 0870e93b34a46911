//! MPEG Transport Stream packet parsing.
//!
//! This module provides types for working with 188-byte MPEG-TS packets
//! (and their 192-byte BDAV M2TS framing), including parsing of packet
//! headers, adaptation fields and PCR values. Every field is extracted by
//! explicit masking and shifting; packets are never reinterpreted through
//! packed structs.

use crate::error::{Result, TsError};

/// MPEG-TS packet size in bytes.
pub const TS_PACKET_SIZE: usize = 188;

/// BDAV M2TS packet size in bytes (4-byte copy-permission prefix + TS packet).
pub const M2TS_PACKET_SIZE: usize = 192;

/// Payload bytes following the 4-byte TS packet header.
pub const TS_PAYLOAD_SIZE: usize = 184;

/// MPEG-TS sync byte value.
pub const SYNC_BYTE: u8 = 0x47;

/// PAT (Program Association Table) PID.
pub const PID_PAT: u16 = 0x0000;

/// Null packet PID.
pub const PID_NULL: u16 = 0x1FFF;

/// Maximum valid PID value.
pub const PID_MAX: u16 = 0x1FFF;

/// Sentinel PID meaning "adopt the first Private Stream 1 PID seen".
pub const PID_FIRST_PRIVATE: u16 = 0x2000;

/// Scrambling control values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScramblingControl {
    /// Not scrambled.
    #[default]
    NotScrambled,
    /// Reserved.
    Reserved,
    /// User defined (even key).
    UserDefinedEven,
    /// User defined (odd key).
    UserDefinedOdd,
}

impl ScramblingControl {
    /// Parse from 2-bit value.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => ScramblingControl::NotScrambled,
            1 => ScramblingControl::Reserved,
            2 => ScramblingControl::UserDefinedEven,
            _ => ScramblingControl::UserDefinedOdd,
        }
    }
}

/// Program Clock Reference (PCR).
///
/// PCR is a 42-bit value (33-bit base + 9-bit extension) encoded in 6 bytes.
/// It represents a 27 MHz clock value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pcr {
    /// 33-bit base value (90 kHz clock).
    pub base: u64,
    /// 9-bit extension (27 MHz subdivisions).
    pub extension: u16,
}

impl Pcr {
    /// PCR clock frequency (27 MHz).
    pub const CLOCK_RATE: u64 = 27_000_000;

    /// PCR base clock frequency (90 kHz).
    pub const BASE_CLOCK_RATE: u64 = 90_000;

    /// Create a new PCR from base and extension.
    pub fn new(base: u64, extension: u16) -> Self {
        Self {
            base: base & 0x1_FFFF_FFFF,
            extension: extension & 0x1FF,
        }
    }

    /// Parse PCR from 6 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 6 {
            return Err(TsError::InvalidAdaptationField(
                "PCR requires 6 bytes".to_string(),
            ));
        }

        // PCR format:
        // - bytes 0-3: base[32:1]
        // - byte 4: base[0], reserved(6), extension[8]
        // - byte 5: extension[7:0]
        let base = ((data[0] as u64) << 25)
            | ((data[1] as u64) << 17)
            | ((data[2] as u64) << 9)
            | ((data[3] as u64) << 1)
            | ((data[4] as u64) >> 7);

        let extension = (((data[4] & 0x01) as u16) << 8) | (data[5] as u16);

        Ok(Self::new(base, extension))
    }

    /// Convert to milliseconds: `base/90 + extension/27000`.
    pub fn to_millis(&self) -> u64 {
        self.base / 90 + self.extension as u64 / 27_000
    }
}

/// Adaptation field parsed from a TS packet.
#[derive(Debug, Clone, Default)]
pub struct AdaptationField {
    /// Adaptation field length (excluding length byte).
    pub length: u8,
    /// Discontinuity indicator.
    pub discontinuity: bool,
    /// Random access indicator.
    pub random_access: bool,
    /// Program Clock Reference (if present).
    pub pcr: Option<Pcr>,
}

impl AdaptationField {
    /// Parse adaptation field from packet data.
    ///
    /// The `data` slice should start at the adaptation field length byte.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(TsError::InvalidAdaptationField(
                "Empty adaptation field".to_string(),
            ));
        }

        let length = data[0];

        if length == 0 {
            return Ok(Self {
                length: 0,
                ..Default::default()
            });
        }

        if data.len() < length as usize + 1 {
            return Err(TsError::InvalidAdaptationField(format!(
                "Adaptation field length {} exceeds available data {}",
                length,
                data.len() - 1
            )));
        }

        let flags = data[1];
        let discontinuity = (flags & 0x80) != 0;
        let random_access = (flags & 0x40) != 0;
        let pcr_flag = (flags & 0x10) != 0;

        let pcr = if pcr_flag {
            if data.len() < 8 {
                return Err(TsError::InvalidAdaptationField(
                    "Truncated PCR".to_string(),
                ));
            }
            Some(Pcr::parse(&data[2..8])?)
        } else {
            None
        };

        Ok(Self {
            length,
            discontinuity,
            random_access,
            pcr,
        })
    }
}

/// MPEG Transport Stream packet header.
#[derive(Debug, Clone)]
pub struct TsHeader {
    /// Transport error indicator.
    pub transport_error: bool,
    /// Payload unit start indicator.
    pub payload_unit_start: bool,
    /// Transport priority.
    pub transport_priority: bool,
    /// Packet Identifier (13 bits).
    pub pid: u16,
    /// Scrambling control. Parsed but otherwise ignored: encrypted payloads
    /// pass through untouched.
    pub scrambling_control: ScramblingControl,
    /// Adaptation field present flag.
    pub adaptation_field: bool,
    /// Payload present flag.
    pub payload: bool,
    /// Continuity counter (4 bits).
    pub continuity_counter: u8,
}

impl TsHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 4;

    /// Parse header from 4 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(TsError::PacketTooShort(data.len()));
        }

        if data[0] != SYNC_BYTE {
            return Err(TsError::InvalidSyncByte(data[0]));
        }

        Ok(Self {
            transport_error: (data[1] & 0x80) != 0,
            payload_unit_start: (data[1] & 0x40) != 0,
            transport_priority: (data[1] & 0x20) != 0,
            pid: ((data[1] as u16 & 0x1F) << 8) | (data[2] as u16),
            scrambling_control: ScramblingControl::from_bits(data[3] >> 6),
            adaptation_field: (data[3] & 0x20) != 0,
            payload: (data[3] & 0x10) != 0,
            continuity_counter: data[3] & 0x0F,
        })
    }
}

/// A complete 188-byte MPEG Transport Stream packet.
#[derive(Debug, Clone)]
pub struct TsPacket {
    data: [u8; TS_PACKET_SIZE],
}

impl TsPacket {
    /// Create a packet from a slice, validating the sync byte.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        if data.len() < TS_PACKET_SIZE {
            return Err(TsError::PacketTooShort(data.len()));
        }
        if data[0] != SYNC_BYTE {
            return Err(TsError::InvalidSyncByte(data[0]));
        }

        let mut packet_data = [0u8; TS_PACKET_SIZE];
        packet_data.copy_from_slice(&data[..TS_PACKET_SIZE]);
        Ok(Self { data: packet_data })
    }

    /// Get the raw packet data.
    pub fn data(&self) -> &[u8; TS_PACKET_SIZE] {
        &self.data
    }

    /// Parse the header.
    pub fn header(&self) -> Result<TsHeader> {
        TsHeader::parse(&self.data)
    }

    /// Get the PID.
    pub fn pid(&self) -> u16 {
        ((self.data[1] as u16 & 0x1F) << 8) | (self.data[2] as u16)
    }

    /// Check if payload unit start is set.
    pub fn payload_unit_start(&self) -> bool {
        (self.data[1] & 0x40) != 0
    }

    /// Parse the adaptation field if present.
    pub fn adaptation_field(&self) -> Result<Option<AdaptationField>> {
        if (self.data[3] & 0x20) == 0 {
            return Ok(None);
        }
        Ok(Some(AdaptationField::parse(&self.data[4..])?))
    }

    /// Get the payload data, skipping the adaptation field when present.
    pub fn payload(&self) -> Option<&[u8]> {
        if (self.data[3] & 0x10) == 0 {
            return None;
        }

        let payload_start = if (self.data[3] & 0x20) != 0 {
            let af_length = self.data[4] as usize;
            5 + af_length
        } else {
            4
        };

        if payload_start >= TS_PACKET_SIZE {
            None
        } else {
            Some(&self.data[payload_start..])
        }
    }

    /// The 184 bytes following the 4-byte header, regardless of any
    /// adaptation field. Teletext PES reassembly appends exactly this slice
    /// per packet.
    pub fn raw_payload(&self) -> &[u8] {
        &self.data[TsHeader::SIZE..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_header_parse() {
        // Example TS header: sync, PID=256, payload only, CC=5
        let data = [0x47, 0x01, 0x00, 0x15];
        let header = TsHeader::parse(&data).unwrap();

        assert!(!header.transport_error);
        assert!(!header.payload_unit_start);
        assert!(!header.transport_priority);
        assert_eq!(header.pid, 256);
        assert!(!header.adaptation_field);
        assert!(header.payload);
        assert_eq!(header.continuity_counter, 5);
    }

    #[test]
    fn test_ts_header_flags() {
        // Transport error + PUSI set, adaptation + payload
        let data = [0x47, 0xC1, 0x00, 0x37];
        let header = TsHeader::parse(&data).unwrap();
        assert!(header.transport_error);
        assert!(header.payload_unit_start);
        assert!(header.adaptation_field);
        assert!(header.payload);
        assert_eq!(header.continuity_counter, 7);
    }

    #[test]
    fn test_invalid_sync_byte() {
        let data = [0x00u8; TS_PACKET_SIZE];
        let result = TsPacket::from_slice(&data);
        assert!(matches!(result, Err(TsError::InvalidSyncByte(0x00))));
    }

    #[test]
    fn test_pcr_parse_and_millis() {
        // base = 90_000 (one second), extension = 0
        let mut data = [0u8; 6];
        let base: u64 = 90_000;
        data[0] = (base >> 25) as u8;
        data[1] = (base >> 17) as u8;
        data[2] = (base >> 9) as u8;
        data[3] = (base >> 1) as u8;
        data[4] = ((base & 0x01) << 7) as u8 | 0x7E;
        data[5] = 0;

        let pcr = Pcr::parse(&data).unwrap();
        assert_eq!(pcr.base, 90_000);
        assert_eq!(pcr.extension, 0);
        assert_eq!(pcr.to_millis(), 1000);
    }

    #[test]
    fn test_adaptation_field_with_pcr() {
        let mut data = [0u8; TS_PAYLOAD_SIZE];
        data[0] = 7; // length
        data[1] = 0x50; // random_access + PCR flag

        let base: u64 = 180_000;
        data[2] = (base >> 25) as u8;
        data[3] = (base >> 17) as u8;
        data[4] = (base >> 9) as u8;
        data[5] = (base >> 1) as u8;
        data[6] = ((base & 0x01) << 7) as u8 | 0x7E;
        data[7] = 0;

        let af = AdaptationField::parse(&data).unwrap();
        assert_eq!(af.length, 7);
        assert!(af.random_access);
        assert!(!af.discontinuity);
        assert_eq!(af.pcr.unwrap().to_millis(), 2000);
    }

    #[test]
    fn test_payload_skips_adaptation_field() {
        let mut data = [0u8; TS_PACKET_SIZE];
        data[0] = SYNC_BYTE;
        data[1] = 0x01;
        data[2] = 0x00;
        data[3] = 0x30; // adaptation + payload
        data[4] = 3; // AF length
        data[5] = 0x00;
        data[8] = 0xAB; // first payload byte

        let packet = TsPacket::from_slice(&data).unwrap();
        let payload = packet.payload().unwrap();
        assert_eq!(payload.len(), TS_PACKET_SIZE - 8);
        assert_eq!(payload[0], 0xAB);
    }

    #[test]
    fn test_raw_payload_is_fixed_window() {
        let mut data = [0u8; TS_PACKET_SIZE];
        data[0] = SYNC_BYTE;
        data[3] = 0x30;
        data[4] = 0xAA;

        let packet = TsPacket::from_slice(&data).unwrap();
        assert_eq!(packet.raw_payload().len(), TS_PAYLOAD_SIZE);
        assert_eq!(packet.raw_payload()[0], 0xAA);
    }
}
