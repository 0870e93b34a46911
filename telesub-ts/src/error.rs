//! MPEG Transport Stream error types.

use thiserror::Error;

/// MPEG-TS specific errors.
#[derive(Error, Debug)]
pub enum TsError {
    /// Invalid sync byte (expected 0x47).
    #[error("Invalid sync byte: expected 0x47, got 0x{0:02X}")]
    InvalidSyncByte(u8),

    /// Packet too short.
    #[error("Packet too short: expected 188 bytes, got {0}")]
    PacketTooShort(usize),

    /// Invalid adaptation field.
    #[error("Invalid adaptation field: {0}")]
    InvalidAdaptationField(String),

    /// Invalid PSI table.
    #[error("Invalid PSI table: {0}")]
    InvalidPsi(String),

    /// Invalid PES packet.
    #[error("Invalid PES packet: {0}")]
    InvalidPes(String),

    /// Underlying reader failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TsError {
    /// Create an invalid PSI error.
    pub fn invalid_psi(msg: impl Into<String>) -> Self {
        TsError::InvalidPsi(msg.into())
    }

    /// Create an invalid PES error.
    pub fn invalid_pes(msg: impl Into<String>) -> Self {
        TsError::InvalidPes(msg.into())
    }
}

/// Result type for MPEG-TS operations.
pub type Result<T> = std::result::Result<T, TsError>;
