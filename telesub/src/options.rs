//! Extraction options and configuration.

use crate::error::ExtractError;
use telesub_ts::{PID_FIRST_PRIVATE, PID_MAX};

/// High-level extraction options using builder pattern.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Target teletext page as entered by the user (decimal 100..899);
    /// 0 adopts the first subtitle page seen.
    pub page: u16,
    /// Teletext elementary PID; 0 discovers it via PAT/PMT, 0x2000 adopts
    /// the first Private Stream 1 PID.
    pub pid: u16,
    /// Subtitle time offset in seconds.
    pub offset_secs: f64,
    /// Emit `<font>` colour tags.
    pub colours: bool,
    /// Search-engine output mode.
    pub search_mode: bool,
    /// UTC reference in seconds (search-engine mode).
    pub utc_reference: u64,
    /// Input uses 192-byte BDAV M2TS records.
    pub m2ts: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create new extraction options with automatic page and PID discovery.
    #[must_use]
    pub fn new() -> Self {
        Self {
            page: 0,
            pid: 0,
            offset_secs: 0.0,
            colours: false,
            search_mode: false,
            utc_reference: 0,
            m2ts: false,
        }
    }

    /// Set the target teletext page (decimal 100..899; 0 = automatic).
    #[must_use]
    pub fn page(mut self, page: u16) -> Self {
        self.page = page;
        self
    }

    /// Set the teletext PID (0 = automatic, 0x2000 = first Private
    /// Stream 1).
    #[must_use]
    pub fn pid(mut self, pid: u16) -> Self {
        self.pid = pid;
        self
    }

    /// Set the subtitle time offset in seconds.
    #[must_use]
    pub fn offset_secs(mut self, offset_secs: f64) -> Self {
        self.offset_secs = offset_secs;
        self
    }

    /// Enable colour markup in the produced frames.
    #[must_use]
    pub fn colours(mut self, enable: bool) -> Self {
        self.colours = enable;
        self
    }

    /// Enable search-engine mode with the given UTC reference (seconds).
    #[must_use]
    pub fn search_mode(mut self, enable: bool, utc_reference: u64) -> Self {
        self.search_mode = enable;
        self.utc_reference = utc_reference;
        self
    }

    /// Treat the input as BDAV M2TS.
    #[must_use]
    pub fn m2ts(mut self, enable: bool) -> Self {
        self.m2ts = enable;
        self
    }

    /// Validates ranges and returns the target page in its internal 12-bit
    /// form.
    pub fn validate(&self) -> Result<u16, ExtractError> {
        if self.page != 0 && !(100..=899).contains(&self.page) {
            return Err(ExtractError::InvalidOptions(format!(
                "teletext page {} out of range (100..899)",
                self.page
            )));
        }
        if self.pid > PID_FIRST_PRIVATE {
            return Err(ExtractError::InvalidOptions(format!(
                "teletext PID {} out of range (0..{})",
                self.pid, PID_FIRST_PRIVATE
            )));
        }
        Ok(encode_page(self.page))
    }
}

/// Encodes a decimal page number `abc` into its 12-bit teletext form
/// `(a << 8) | (b << 4) | c`. Zero stays zero (automatic).
pub fn encode_page(page: u16) -> u16 {
    let hundreds = page / 100;
    let tens = (page / 10) % 10;
    let units = page % 10;
    (hundreds << 8) | (tens << 4) | units
}

/// True when `pid` addresses a concrete elementary stream (not a discovery
/// sentinel).
pub fn is_concrete_pid(pid: u16) -> bool {
    pid != 0 && pid <= PID_MAX
}
