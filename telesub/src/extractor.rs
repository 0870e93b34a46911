//! The teletext extraction pipeline.
//!
//! [`TeletextExtractor`] drives the strictly forward data flow of the
//! decoder: bytes -> TS packets -> PES payloads -> teletext data units ->
//! page buffer -> caption frames. All pipeline state lives in this one
//! value; the loop is single-threaded and pull-based, with a cooperative
//! exit flag checked at the top of each iteration.

use crate::error::Result;
use crate::options::{is_concrete_pid, ExtractOptions};

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use telesub_subtitle::CaptionFrame;
use telesub_teletext::{
    ClockTracker, DataUnitId, FrameFormatter, PageBuffer, TeletextDecoder, TeletextPacket,
    DATA_UNIT_SIZE,
};
use telesub_ts::pes::{PesAssembler, PesHeader, PesPush};
use telesub_ts::psi::{parse_pat, parse_pmt, MAX_TRACKED_PIDS};
use telesub_ts::{
    TsDemuxer, PES_START_CODE_PREFIX, PID_FIRST_PRIVATE, PID_NULL, PID_PAT, STREAM_ID_PRIVATE_1,
};

use tracing::{debug, info, warn};

/// Counters accumulated over one extraction run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractStats {
    /// TS packets framed by the demuxer.
    pub ts_packets: u64,
    /// Teletext data units decoded.
    pub teletext_packets: u64,
    /// Caption frames produced.
    pub frames: u64,
    /// Sync-loss episodes in the demuxer.
    pub sync_losses: u64,
    /// Bytes skipped while realigning.
    pub bytes_discarded: u64,
    /// Packets dropped for the transport-error indicator.
    pub transport_errors: u64,
    /// Continuity counter gaps on the teletext PID.
    pub continuity_errors: u64,
    /// Uncorrectable Hamming words (neutral value substituted).
    pub hamming_errors: u64,
    /// Character parity failures (space substituted).
    pub parity_errors: u64,
}

/// Pull-based extraction pipeline over a byte stream.
pub struct TeletextExtractor<R: Read> {
    demuxer: TsDemuxer<R>,
    decoder: TeletextDecoder,
    formatter: FrameFormatter,
    clock: ClockTracker,
    assembler: PesAssembler,
    /// Teletext PID in effect; may start as 0 (PAT/PMT discovery) or
    /// 0x2000 (first Private Stream 1).
    pid: u16,
    pmt_pids: Vec<u16>,
    teletext_pids: Vec<u16>,
    search_mode: bool,
    stats: ExtractStats,
    exit_requested: Arc<AtomicBool>,
}

impl<R: Read> TeletextExtractor<R> {
    /// Creates an extractor over `reader` with validated options.
    pub fn new(reader: R, options: ExtractOptions) -> Result<Self> {
        let target_page = options.validate()?;

        let demuxer = if options.m2ts {
            TsDemuxer::new_m2ts(reader)
        } else {
            TsDemuxer::new(reader)
        };

        Ok(Self {
            demuxer,
            decoder: TeletextDecoder::new(target_page),
            formatter: FrameFormatter::new(options.colours),
            clock: ClockTracker::new(options.offset_secs, options.utc_reference),
            assembler: PesAssembler::new(),
            pid: options.pid,
            pmt_pids: Vec::new(),
            teletext_pids: Vec::new(),
            search_mode: options.search_mode,
            stats: ExtractStats::default(),
            exit_requested: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A handle that makes [`run`](Self::run) return early when set.
    pub fn exit_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.exit_requested)
    }

    /// Counters for the finished (or interrupted) run.
    pub fn stats(&self) -> ExtractStats {
        self.stats
    }

    /// The teletext PID in effect (reflects auto-discovery).
    pub fn teletext_pid(&self) -> u16 {
        self.pid
    }

    /// The target page in 12-bit form (reflects auto-adoption).
    pub fn target_page(&self) -> u16 {
        self.decoder.target_page()
    }

    /// Pages observed with the subtitle flag, in 12-bit form.
    pub fn subtitle_pages(&self) -> Vec<u16> {
        self.decoder.seen_subtitle_pages()
    }

    /// Runs the pipeline to end of input and returns the caption frames in
    /// show order.
    pub fn run(&mut self) -> Result<Vec<CaptionFrame>> {
        let mut frames = Vec::new();

        while !self.exit_requested.load(Ordering::Relaxed) {
            let packet = match self.demuxer.read_packet()? {
                Some(packet) => packet,
                None => break,
            };
            self.stats.ts_packets += 1;

            let header = packet.header()?;
            if header.transport_error {
                self.stats.transport_errors += 1;
                continue;
            }

            let mut af_discontinuity = false;
            if header.adaptation_field {
                match packet.adaptation_field() {
                    Ok(Some(af)) => {
                        af_discontinuity = af.discontinuity;
                        if let Some(pcr) = af.pcr {
                            self.clock.observe_pcr(pcr.to_millis());
                        }
                    }
                    Ok(None) => {}
                    Err(e) => debug!(error = %e, "ignoring malformed adaptation field"),
                }
            }

            if header.pid == PID_NULL {
                continue;
            }

            // PID discovery via PAT/PMT, only while no PID is configured.
            if self.pid == 0 {
                if header.pid == PID_PAT && header.payload_unit_start {
                    if let Some(payload) = packet.payload() {
                        self.analyze_pat(payload);
                    }
                    continue;
                }
                if header.payload_unit_start && self.pmt_pids.contains(&header.pid) {
                    if let Some(payload) = packet.payload() {
                        self.analyze_pmt(payload);
                    }
                    continue;
                }
            }

            // Discovery of the first Private Stream 1 PID.
            if self.pid == PID_FIRST_PRIVATE && header.payload_unit_start {
                let raw = packet.raw_payload();
                if raw[0..3] == PES_START_CODE_PREFIX && raw[3] == STREAM_ID_PRIVATE_1 {
                    self.pid = header.pid;
                    info!(pid = self.pid, "using first Private Stream 1 PID");
                }
            }

            if is_concrete_pid(self.pid) && header.pid == self.pid {
                match self.assembler.push(
                    header.payload_unit_start,
                    header.continuity_counter,
                    af_discontinuity,
                    packet.raw_payload(),
                ) {
                    PesPush::Complete(pes) => self.process_pes(&pes, &mut frames),
                    PesPush::Discontinuity { expected, actual } => {
                        self.stats.continuity_errors += 1;
                        warn!(expected, actual, "missing TS packet, sequence discontinuity");
                    }
                    PesPush::Buffering => {}
                }
            }
        }

        // End of input: the page still being assembled hides at the last
        // known timestamp.
        if let Some(page) = self.decoder.flush(self.clock.last_timestamp()) {
            self.push_frame(&page, &mut frames);
        }

        self.stats.sync_losses = self.demuxer.sync_losses();
        self.stats.bytes_discarded = self.demuxer.bytes_discarded();
        let decoder_stats = self.decoder.stats();
        self.stats.teletext_packets = decoder_stats.packets;
        self.stats.hamming_errors = decoder_stats.hamming_errors;
        self.stats.parity_errors = decoder_stats.parity_errors;

        Ok(frames)
    }

    fn analyze_pat(&mut self, payload: &[u8]) {
        match parse_pat(payload) {
            Ok(pids) => {
                for pid in pids {
                    if !self.pmt_pids.contains(&pid) && self.pmt_pids.len() < MAX_TRACKED_PIDS {
                        self.pmt_pids.push(pid);
                    }
                }
            }
            Err(e) => debug!(error = %e, "skipping malformed PAT section"),
        }
    }

    fn analyze_pmt(&mut self, payload: &[u8]) {
        match parse_pmt(payload) {
            Ok(pids) => {
                for pid in pids {
                    if !self.teletext_pids.contains(&pid)
                        && self.teletext_pids.len() < MAX_TRACKED_PIDS
                    {
                        self.teletext_pids.push(pid);
                    }
                }
                if self.pid == 0 {
                    if let Some(&pid) = self.teletext_pids.first() {
                        self.pid = pid;
                        info!(pid, "no teletext PID specified, using first suitable stream");
                    }
                }
            }
            Err(e) => debug!(error = %e, "skipping malformed PMT section"),
        }
    }

    /// Parses one reassembled PES packet and feeds its teletext data units
    /// to the decoder.
    fn process_pes(&mut self, pes: &[u8], frames: &mut Vec<CaptionFrame>) {
        let header = match PesHeader::parse(pes) {
            Ok(header) => header,
            Err(e) => {
                debug!(error = %e, "discarding invalid PES packet");
                return;
            }
        };
        if header.stream_id != STREAM_ID_PRIVATE_1 {
            return;
        }
        // A zero length marks an unbounded packet, permitted only for
        // video elementary streams.
        if header.packet_length == 0 {
            return;
        }
        let limit = header.total_length().min(pes.len());

        let timestamp = self.clock.on_pes(header.pts.map(|pts| pts.to_millis()));

        // The PES data field opens with a data_identifier byte, then data
        // units of (id, length, payload).
        let mut i = header.payload_offset + 1;
        while i + 2 <= limit {
            let unit_id = pes[i];
            let unit_len = pes[i + 1] as usize;
            i += 2;

            if let Some(id) = DataUnitId::from_u8(unit_id) {
                if unit_len == DATA_UNIT_SIZE && i + DATA_UNIT_SIZE <= limit {
                    // Teletext bytes arrive LSB-first (ETS 300 706,
                    // chapter 7.1); reverse before parsing.
                    let mut unit = [0u8; DATA_UNIT_SIZE];
                    for (reversed, &byte) in unit.iter_mut().zip(&pes[i..i + DATA_UNIT_SIZE]) {
                        *reversed = byte.reverse_bits();
                    }

                    let packet = TeletextPacket::new(&unit);
                    if let Some(page) = self.decoder.feed(id, &packet, timestamp) {
                        self.push_frame(&page, frames);
                    }
                }
            }

            i += unit_len;
        }

        // Broadcast Service Data resets the UTC reference in search-engine
        // mode; outside it the value is informational only.
        if let Some(utc) = self.decoder.take_utc_reference() {
            if self.search_mode {
                info!(utc, "Broadcast Service Data received, resetting UTC reference");
                self.clock.reset_reference(utc);
            }
        }
    }

    fn push_frame(&mut self, page: &PageBuffer, frames: &mut Vec<CaptionFrame>) {
        if let Some(frame) = self.formatter.format(page) {
            self.stats.frames += 1;
            frames.push(frame);
        }
    }
}

/// Convenience wrapper: extract all caption frames from a reader.
pub fn extract<R: Read>(reader: R, options: ExtractOptions) -> Result<Vec<CaptionFrame>> {
    let mut extractor = TeletextExtractor::new(reader, options)?;
    extractor.run()
}
