//! Teletext packet decoder and page assembler.
//!
//! [`TeletextDecoder`] consumes bit-reversed 44-byte data units and keeps
//! the state of the one page being extracted: the 25x40 page buffer, the
//! primary charset selection, the serial/parallel reception filter and the
//! CC-map of subtitle pages seen in the stream.
//!
//! A page leaves the decoder when a later header of the target page
//! supersedes it (its hide time set one 25 fps frame before the new show
//! time) or when the caller flushes at end of stream.

use crate::charset::{self, CharsetState, G2_LATIN};
use crate::coding::{odd_parity_ok, unham_24_18, unham_8_4};
use crate::packet::{split_address, DataUnitId, TeletextPacket};
use crate::page::{PageBuffer, TransmissionMode, PAGE_COLS};

use tracing::{debug, info};

/// Recoverable-error counters, exposed for end-of-run diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderStats {
    /// Hamming 8/4 or 24/18 words that could not be corrected.
    pub hamming_errors: u64,
    /// Character bytes that failed the odd-parity check.
    pub parity_errors: u64,
    /// Data units fed into the decoder.
    pub packets: u64,
}

/// Stateful decoder for one target teletext page.
#[derive(Debug)]
pub struct TeletextDecoder {
    /// 12-bit target page identifier; 0 until a subtitle page is adopted.
    target_page: u16,
    receiving: bool,
    transmission_mode: TransmissionMode,
    charset: CharsetState,
    buffer: PageBuffer,
    /// Bit `m-1` of entry `lsb` set when page `m:lsb` carried the subtitle
    /// flag.
    cc_map: [u8; 256],
    programme_info_processed: bool,
    pending_utc: Option<u64>,
    stats: DecoderStats,
}

impl TeletextDecoder {
    /// Creates a decoder for `target_page` (12-bit form; 0 = adopt the
    /// first subtitle page seen).
    pub fn new(target_page: u16) -> Self {
        Self {
            target_page,
            receiving: false,
            transmission_mode: TransmissionMode::default(),
            charset: CharsetState::new(),
            buffer: PageBuffer::new(),
            cc_map: [0; 256],
            programme_info_processed: false,
            pending_utc: None,
            stats: DecoderStats::default(),
        }
    }

    /// The current target page (reflects auto-adoption).
    pub fn target_page(&self) -> u16 {
        self.target_page
    }

    /// Error counters.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Takes the UTC reference decoded from a Broadcast Service Data
    /// packet, if one arrived since the last call.
    pub fn take_utc_reference(&mut self) -> Option<u64> {
        self.pending_utc.take()
    }

    /// Pages observed with the subtitle flag set, in 12-bit form.
    pub fn seen_subtitle_pages(&self) -> Vec<u16> {
        let mut pages = Vec::new();
        for (lsb, &bits) in self.cc_map.iter().enumerate() {
            for magazine in 0..8u16 {
                if bits & (1 << magazine) != 0 {
                    pages.push(((magazine + 1) << 8) | lsb as u16);
                }
            }
        }
        pages
    }

    /// Feeds one bit-reversed data unit stamped with the current caption
    /// timestamp. Returns a finished page when this unit superseded one.
    pub fn feed(
        &mut self,
        unit_id: DataUnitId,
        packet: &TeletextPacket<'_>,
        timestamp: u64,
    ) -> Option<PageBuffer> {
        self.stats.packets += 1;

        let (a0, a1) = packet.address_bytes();
        let address = (self.unham8(a1) << 4) | self.unham8(a0);
        let (magazine, row) = split_address(address);
        let data = packet.data();
        let designation = if row > 25 { self.unham8(data[0]) } else { 0 };

        match (magazine, row) {
            (_, 0) => self.handle_header(unit_id, magazine, data, timestamp),
            (m, 1..=23) if m == self.target_magazine() && self.receiving => {
                self.handle_row(row as usize, data);
                None
            }
            (m, 26) if m == self.target_magazine() && self.receiving => {
                self.handle_x26(data);
                None
            }
            (m, 28) if m == self.target_magazine() && self.receiving => {
                self.handle_x28(designation, data);
                None
            }
            (m, 29) if m == self.target_magazine() => {
                self.handle_m29(designation, data);
                None
            }
            (8, 30) => {
                self.handle_broadcast_service_data(data);
                None
            }
            _ => None,
        }
    }

    /// Surrenders the in-progress page at end of stream.
    pub fn flush(&mut self, last_timestamp: u64) -> Option<PageBuffer> {
        if self.buffer.tainted {
            self.buffer.hide_ms = last_timestamp;
            self.buffer.tainted = false;
            Some(self.buffer.clone())
        } else {
            None
        }
    }

    fn target_magazine(&self) -> u8 {
        ((self.target_page >> 8) & 0x0F) as u8
    }

    fn unham8(&mut self, byte: u8) -> u8 {
        match unham_8_4(byte) {
            Some(nibble) => nibble,
            None => {
                self.stats.hamming_errors += 1;
                0
            }
        }
    }

    fn unham24(&mut self, data: &[u8], offset: usize) -> Option<u32> {
        let word = (data[offset + 2] as u32) << 16
            | (data[offset + 1] as u32) << 8
            | data[offset] as u32;
        let decoded = unham_24_18(word);
        if decoded.is_none() {
            self.stats.hamming_errors += 1;
            debug!("unrecoverable Hamming 24/18 triplet, skipping");
        }
        decoded
    }

    /// Parity-checked translation of a character byte through the active G0
    /// table. Values below 0x20 pass through as control codes.
    fn to_ucs2(&mut self, raw: u8) -> u16 {
        if !odd_parity_ok(raw) {
            self.stats.parity_errors += 1;
            return 0x20;
        }
        let value = raw & 0x7F;
        if value >= 0x20 {
            self.charset.g0(value)
        } else {
            value as u16
        }
    }

    /// Y = 0: page header.
    fn handle_header(
        &mut self,
        unit_id: DataUnitId,
        magazine: u8,
        data: &[u8],
        timestamp: u64,
    ) -> Option<PageBuffer> {
        let page_lsb = (self.unham8(data[1]) << 4) | self.unham8(data[0]);
        let flag_subtitle = self.unham8(data[5]) & 0x08 != 0;
        let page_number = ((magazine as u16) << 8) | page_lsb as u16;

        if flag_subtitle {
            self.cc_map[page_lsb as usize] |= 1 << (magazine - 1);

            if self.target_page == 0 && page_lsb < 0xFF {
                self.target_page = page_number;
                info!(
                    page = format_args!("{page_number:03x}"),
                    "no teletext page specified, using first subtitle page (not guaranteed)"
                );
            }
        }

        let control = self.unham8(data[7]);
        let header_charset = (control & 0x0E) >> 1;
        self.transmission_mode = TransmissionMode::from_bit(control);

        // In parallel mode only subtitle data units may drive state.
        if self.transmission_mode == TransmissionMode::Parallel
            && unit_id != DataUnitId::Subtitle
        {
            return None;
        }

        if self.receiving {
            // Serial mode multiplexes all magazines into one page sequence,
            // so any other 12-bit page ends reception; in parallel mode
            // only a header of the target magazine does.
            let terminates = match self.transmission_mode {
                TransmissionMode::Serial => page_number != self.target_page,
                TransmissionMode::Parallel => {
                    page_number != self.target_page && magazine == self.target_magazine()
                }
            };
            if terminates {
                self.receiving = false;
                return None;
            }
        }

        // Page transmission terminated; wait for our page to start.
        if page_number != self.target_page {
            return None;
        }

        // A new transmission of the target page begins: emit the pending
        // buffer, hiding it one 25 fps frame before the new show time.
        let emitted = if self.buffer.tainted {
            self.buffer.hide_ms = timestamp.saturating_sub(40);
            Some(self.buffer.clone())
        } else {
            None
        };

        self.buffer.restart(timestamp);
        self.receiving = true;

        self.charset.g0_x28 = None;
        let effective = self.charset.g0_m29.unwrap_or(header_charset);
        self.charset.remap(effective);

        emitted
    }

    /// Y = 1..23: one row of Level 1 text.
    ///
    /// Packets with Y = 26 are transmitted before the text rows
    /// (ETS 300 706, annex B.2.2), so cells an overlay already placed are
    /// skipped here.
    fn handle_row(&mut self, row: usize, data: &[u8]) {
        for col in 0..PAGE_COLS {
            if self.buffer.text[row][col] == 0x00 {
                let value = self.to_ucs2(data[col]);
                self.buffer.text[row][col] = value;
            }
        }
        self.buffer.tainted = true;
    }

    /// Y = 26: character overlay triplets (ETS 300 706, chapter 12.3.2).
    fn handle_x26(&mut self, data: &[u8]) {
        let mut active_row = 0usize;
        let mut active_col = 0usize;

        for group in 0..13 {
            let triplet = match self.unham24(data, 1 + group * 3) {
                Some(t) => t,
                None => continue,
            };

            let address = (triplet & 0x3F) as u8;
            let mode = ((triplet >> 6) & 0x1F) as u8;
            let value = ((triplet >> 11) & 0x7F) as u8;
            let row_address_group = (40..=63).contains(&address);

            // Table 27: set active position.
            if mode == 0x04 && row_address_group {
                active_row = (address - 40) as usize;
                if active_row == 0 {
                    active_row = 24;
                }
                active_col = 0;
            }

            // Table 27: termination marker.
            if (0x11..=0x1F).contains(&mode) && row_address_group {
                break;
            }

            // Table 27: character from the G2 supplementary set.
            if mode == 0x0F && !row_address_group {
                active_col = address as usize;
                if value > 31 {
                    self.buffer
                        .set(active_row, active_col, G2_LATIN[(value - 0x20) as usize] as u16);
                }
            }

            // Table 27: G0 character with diacritical mark.
            if (0x11..=0x1F).contains(&mode) && !row_address_group {
                active_col = address as usize;
                match value {
                    b'A'..=b'Z' | b'a'..=b'z' => {
                        if let Some(composed) =
                            charset::accented((mode - 0x11) as usize, value as char)
                        {
                            self.buffer.set(active_row, active_col, composed as u16);
                        }
                        // No precomposed form: leave the cell for the plain
                        // G0 character of the text row.
                    }
                    _ => {
                        let cell = self.to_ucs2(value);
                        self.buffer.set(active_row, active_col, cell);
                    }
                }
            }
        }
    }

    /// Y = 28, designation 0 or 4: X/28/0 Format 1 and X/28/4 page-local
    /// G0 selection.
    fn handle_x28(&mut self, designation: u8, data: &[u8]) {
        if designation != 0 && designation != 4 {
            return;
        }
        if let Some(triplet) = self.unham24(data, 1) {
            // X/28/0 Format 1 only.
            if triplet & 0x0F == 0x00 {
                let id = ((triplet & 0x3F80) >> 7) as u8;
                self.charset.g0_x28 = Some(id);
                self.charset.remap(id);
            }
        }
    }

    /// Y = 29, designation 0 or 4: M/29/0 and M/29/4 magazine-wide G0
    /// selection. X/28 takes precedence.
    fn handle_m29(&mut self, designation: u8, data: &[u8]) {
        if designation != 0 && designation != 4 {
            return;
        }
        if let Some(triplet) = self.unham24(data, 1) {
            if triplet & 0xFF == 0x00 {
                let id = ((triplet & 0x3F80) >> 7) as u8;
                self.charset.g0_m29 = Some(id);
                if self.charset.g0_x28.is_none() {
                    self.charset.remap(id);
                }
            }
        }
    }

    /// 8/30 Format 1: Broadcast Service Data, processed once per stream.
    fn handle_broadcast_service_data(&mut self, data: &[u8]) {
        if self.programme_info_processed || self.unham8(data[0]) >= 2 {
            return;
        }

        let mut label = String::new();
        for &byte in &data[20..40] {
            let code = self.to_ucs2(byte);
            // Strip any control codes from the programme label.
            if code < 0x20 {
                continue;
            }
            if let Some(c) = char::from_u32(code as u32) {
                label.push(c);
            }
        }
        info!(programme = %label.trim(), "programme identification data");

        // Timestamp arrives as a BCD Modified Julian Day plus BCD HH:MM:SS,
        // with every decimal digit incremented by one before transmission.
        let mut mjd: i64 = 0;
        mjd += ((data[10] & 0x0F) as i64) * 10_000;
        mjd += (((data[11] & 0xF0) >> 4) as i64) * 1000;
        mjd += ((data[11] & 0x0F) as i64) * 100;
        mjd += (((data[12] & 0xF0) >> 4) as i64) * 10;
        mjd += (data[12] & 0x0F) as i64;
        mjd -= 11_111;

        let mut utc: i64 = (mjd - 40_587) * 86_400;
        utc += 3600 * ((((data[13] & 0xF0) >> 4) as i64) * 10 + (data[13] & 0x0F) as i64);
        utc += 60 * ((((data[14] & 0xF0) >> 4) as i64) * 10 + (data[14] & 0x0F) as i64);
        utc += (((data[15] & 0xF0) >> 4) as i64) * 10 + (data[15] & 0x0F) as i64;
        utc -= 40_271; // digit-increment correction for HH:MM:SS

        let utc = utc.max(0) as u64;
        info!(utc, "programme timestamp (UTC seconds)");
        debug!(mode = ?self.transmission_mode, "transmission mode");

        self.pending_utc = Some(utc);
        self.programme_info_processed = true;
    }
}
