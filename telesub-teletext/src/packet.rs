//! Teletext data unit framing (ETS 300 706, chapter 7.1).
//!
//! Within a Private Stream 1 PES payload, teletext travels as data units of
//! `(id, length, payload)` where a payload of 44 bytes holds one VBI line:
//! two framing bytes, two Hamming 8/4 address bytes and 40 data bytes. The
//! whole unit is bit-reversed byte-by-byte before parsing.

/// Size of one teletext data unit payload.
pub const DATA_UNIT_SIZE: usize = 44;

/// Data unit identifiers relevant to caption extraction
/// (ETSI EN 301 775, table 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataUnitId {
    /// EBU teletext non-subtitle data.
    NonSubtitle,
    /// EBU teletext subtitle data.
    Subtitle,
}

impl DataUnitId {
    /// Parse a data unit id byte; ids other than 0x02/0x03 are not teletext.
    pub fn from_u8(id: u8) -> Option<Self> {
        match id {
            0x02 => Some(DataUnitId::NonSubtitle),
            0x03 => Some(DataUnitId::Subtitle),
            _ => None,
        }
    }
}

/// Borrowed view of one bit-reversed 44-byte teletext data unit.
#[derive(Debug, Clone, Copy)]
pub struct TeletextPacket<'a> {
    raw: &'a [u8; DATA_UNIT_SIZE],
}

impl<'a> TeletextPacket<'a> {
    /// Wraps a bit-reversed data unit.
    pub fn new(raw: &'a [u8; DATA_UNIT_SIZE]) -> Self {
        Self { raw }
    }

    /// The two Hamming 8/4 protected address bytes.
    ///
    /// Decoded, they carry the magazine number in bits 0..2 and the packet
    /// row number in bits 3..7.
    pub fn address_bytes(&self) -> (u8, u8) {
        (self.raw[2], self.raw[3])
    }

    /// The 40 data bytes whose interpretation depends on the row.
    pub fn data(&self) -> &'a [u8] {
        &self.raw[4..]
    }
}

/// Splits a decoded address into magazine (0 mapped to 8) and row.
pub fn split_address(address: u8) -> (u8, u8) {
    let mut magazine = address & 0x07;
    if magazine == 0 {
        magazine = 8;
    }
    let row = (address >> 3) & 0x1F;
    (magazine, row)
}
