//! Caption timing against the transport stream clocks.
//!
//! Teletext packets carry no time of their own; captions are stamped with
//! the PES Presentation Time Stamp when the stream provides one, falling
//! back to the transport stream's Program Clock Reference otherwise. The
//! choice is latched on the first PES packet and never revisited.
//!
//! Decoded timestamps are reconciled into a monotonic millisecond timeline:
//! a `delta` offset (seeded from the configured subtitle offset and UTC
//! reference) maps stream time to output time, and a PTS wrap-around
//! (33 bits, ~26.5 h) re-anchors `delta` so the timeline keeps ascending.

use tracing::debug;

/// Which stream clock stamps the captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockSource {
    /// No PES packet seen yet.
    #[default]
    Undetermined,
    /// PES packets carry no PTS; the TS PCR drives timing.
    Pcr,
    /// PES PTS drives timing.
    Pts,
}

/// Millisecond timeline reconciliation state.
#[derive(Debug, Clone)]
pub struct ClockTracker {
    source: ClockSource,
    /// Latest PCR value in milliseconds.
    global_pcr_ms: u64,
    /// Output timeline position of the latest PES packet.
    last_timestamp_ms: u64,
    /// Stream time of the previous PES packet (wrap detection anchor).
    t0: u64,
    /// Stream-to-output offset in milliseconds.
    delta: i64,
    /// True once `delta` has been seeded from a valid timestamp.
    initialized: bool,
    /// Configured subtitle offset in seconds.
    offset_secs: f64,
    /// Configured UTC reference in seconds (search-engine mode).
    utc_reference: u64,
}

impl ClockTracker {
    /// Creates a tracker with the given subtitle offset and UTC reference.
    pub fn new(offset_secs: f64, utc_reference: u64) -> Self {
        Self {
            source: ClockSource::Undetermined,
            global_pcr_ms: 0,
            last_timestamp_ms: 0,
            t0: 0,
            delta: 0,
            initialized: false,
            offset_secs,
            utc_reference,
        }
    }

    /// The latched clock source.
    pub fn source(&self) -> ClockSource {
        self.source
    }

    /// The output timeline position of the most recent PES packet.
    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp_ms
    }

    /// Records a PCR observation from a TS adaptation field.
    pub fn observe_pcr(&mut self, pcr_ms: u64) {
        self.global_pcr_ms = pcr_ms;
    }

    /// Replaces the UTC reference and re-seeds `delta` on the next PES
    /// packet (Broadcast Service Data reset in search-engine mode).
    pub fn reset_reference(&mut self, utc_reference: u64) {
        self.utc_reference = utc_reference;
        self.initialized = false;
    }

    /// Advances the timeline for one PES packet and returns the caption
    /// timestamp to use for its data units.
    ///
    /// `pts_ms` is the packet's PTS converted to milliseconds, when present.
    pub fn on_pes(&mut self, pts_ms: Option<u64>) -> u64 {
        if self.source == ClockSource::Undetermined {
            self.source = if pts_ms.is_some() {
                debug!("PTS available on teletext PES, using PTS timing");
                ClockSource::Pts
            } else {
                debug!("no PTS on teletext PES, using TS PCR timing");
                ClockSource::Pcr
            };
        }

        let t = match self.source {
            ClockSource::Pts => pts_ms.unwrap_or(self.t0),
            _ => self.global_pcr_ms,
        };

        if !self.initialized {
            self.delta = (1000.0 * self.offset_secs) as i64 + 1000 * self.utc_reference as i64
                - t as i64;
            self.t0 = t;
            self.initialized = true;
            // Still waiting for the first PCR; seed again once one arrives.
            if self.source == ClockSource::Pcr && self.global_pcr_ms == 0 {
                self.initialized = false;
            }
        }

        if t < self.t0 {
            // 33-bit clock wrapped; keep the output timeline monotonic.
            self.delta = self.last_timestamp_ms as i64;
        }
        self.last_timestamp_ms = (t as i64 + self.delta).max(0) as u64;
        self.t0 = t;

        self.last_timestamp_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latches_pts_source() {
        let mut clock = ClockTracker::new(0.0, 0);
        clock.on_pes(Some(1000));
        assert_eq!(clock.source(), ClockSource::Pts);
        // Missing PTS later does not switch the source.
        clock.on_pes(None);
        assert_eq!(clock.source(), ClockSource::Pts);
    }

    #[test]
    fn test_latches_pcr_source() {
        let mut clock = ClockTracker::new(0.0, 0);
        clock.observe_pcr(500);
        clock.on_pes(None);
        assert_eq!(clock.source(), ClockSource::Pcr);
        assert_eq!(clock.last_timestamp(), 0);

        clock.observe_pcr(700);
        assert_eq!(clock.on_pes(Some(9999)), 200);
    }

    #[test]
    fn test_first_pts_anchors_at_zero() {
        let mut clock = ClockTracker::new(0.0, 0);
        assert_eq!(clock.on_pes(Some(123_456)), 0);
        assert_eq!(clock.on_pes(Some(123_496)), 40);
    }

    #[test]
    fn test_offset_shifts_timeline() {
        let mut clock = ClockTracker::new(2.5, 0);
        assert_eq!(clock.on_pes(Some(1000)), 2500);
        assert_eq!(clock.on_pes(Some(1100)), 2600);
    }

    #[test]
    fn test_utc_reference_shifts_timeline() {
        let mut clock = ClockTracker::new(0.0, 1_400_000_000);
        assert_eq!(clock.on_pes(Some(0)), 1_400_000_000_000);
    }

    #[test]
    fn test_pts_wrap_keeps_monotonic() {
        let mut clock = ClockTracker::new(0.0, 0);
        clock.on_pes(Some(1_000));
        let before_wrap = clock.on_pes(Some(95_443_716)); // near the 33-bit limit
        let at_wrap = clock.on_pes(Some(0));
        let after_wrap = clock.on_pes(Some(40));
        assert!(at_wrap >= before_wrap, "wrap rewound: {at_wrap} < {before_wrap}");
        assert!(after_wrap > before_wrap, "timeline stalled after wrap");
    }

    #[test]
    fn test_pcr_mode_defers_until_first_pcr() {
        let mut clock = ClockTracker::new(0.0, 0);
        clock.on_pes(None); // no PCR yet
        clock.observe_pcr(10_000);
        clock.on_pes(None); // seeds delta now
        clock.observe_pcr(10_040);
        assert_eq!(clock.on_pes(None), 40);
    }
}
