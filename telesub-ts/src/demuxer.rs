//! Transport stream packet framing.
//!
//! [`TsDemuxer`] turns a byte stream into a sequence of 188-byte TS packets,
//! optionally skipping the 4-byte BDAV prefix of M2TS input. Framing is done
//! through an internal buffer: when sync is lost, the buffer is scanned for
//! the next 0x47 and only the bytes *before* the realignment point are
//! discarded — the reader is never consumed past it.

use crate::error::Result;
use crate::packet::{TsPacket, M2TS_PACKET_SIZE, SYNC_BYTE, TS_PACKET_SIZE};

use std::io::Read;
use tracing::{debug, warn};

/// Number of packets worth of data kept in the internal buffer.
const BUFFER_PACKETS: usize = 64;

/// Buffered TS/M2TS packet reader.
pub struct TsDemuxer<R: Read> {
    reader: R,
    /// Total record size: 188 for TS, 192 for M2TS.
    record_size: usize,
    /// Bytes to skip before the sync byte of each record: 0 or 4.
    prefix: usize,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
    packets_read: u64,
    sync_losses: u64,
    bytes_discarded: u64,
}

impl<R: Read> TsDemuxer<R> {
    /// Create a demuxer for plain 188-byte transport stream input.
    pub fn new(reader: R) -> Self {
        Self::with_record(reader, TS_PACKET_SIZE, 0)
    }

    /// Create a demuxer for BDAV M2TS input (192-byte records).
    pub fn new_m2ts(reader: R) -> Self {
        Self::with_record(reader, M2TS_PACKET_SIZE, M2TS_PACKET_SIZE - TS_PACKET_SIZE)
    }

    fn with_record(reader: R, record_size: usize, prefix: usize) -> Self {
        Self {
            reader,
            record_size,
            prefix,
            buf: vec![0u8; record_size * BUFFER_PACKETS],
            start: 0,
            end: 0,
            eof: false,
            packets_read: 0,
            sync_losses: 0,
            bytes_discarded: 0,
        }
    }

    /// Number of complete packets returned so far.
    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    /// Number of sync-loss episodes encountered.
    pub fn sync_losses(&self) -> u64 {
        self.sync_losses
    }

    /// Number of bytes skipped while realigning.
    pub fn bytes_discarded(&self) -> u64 {
        self.bytes_discarded
    }

    /// Refill the buffer, compacting pending bytes to the front first.
    fn fill(&mut self) -> Result<()> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        while !self.eof && self.end < self.buf.len() {
            let n = self.reader.read(&mut self.buf[self.end..])?;
            if n == 0 {
                self.eof = true;
            } else {
                self.end += n;
            }
        }
        Ok(())
    }

    /// Bytes currently buffered.
    fn available(&self) -> usize {
        self.end - self.start
    }

    /// Read the next TS packet, realigning on sync loss.
    ///
    /// Returns `Ok(None)` at end of input; a trailing short record is
    /// silently dropped.
    pub fn read_packet(&mut self) -> Result<Option<TsPacket>> {
        loop {
            if self.available() < self.record_size {
                self.fill()?;
                if self.available() < self.record_size {
                    if self.available() > 0 {
                        debug!(
                            remainder = self.available(),
                            "dropping short trailing record"
                        );
                    }
                    return Ok(None);
                }
            }

            if self.buf[self.start + self.prefix] == SYNC_BYTE {
                let begin = self.start + self.prefix;
                let packet = TsPacket::from_slice(&self.buf[begin..begin + TS_PACKET_SIZE])?;
                self.start += self.record_size;
                self.packets_read += 1;
                return Ok(Some(packet));
            }

            // Sync loss: scan the buffered bytes for the next candidate sync
            // position and discard everything before it.
            self.sync_losses += 1;
            let mut skipped = 0usize;
            let mut realigned = false;
            for offset in 1..self.available() {
                if self.buf[self.start + offset] == SYNC_BYTE && offset >= self.prefix {
                    skipped = offset - self.prefix;
                    realigned = true;
                    break;
                }
            }
            if !realigned {
                // No sync byte in the whole buffer; drop it and keep looking.
                skipped = self.available();
            }
            self.start += skipped;
            self.bytes_discarded += skipped as u64;
            warn!(skipped, "transport stream sync lost, realigned");
        }
    }
}
