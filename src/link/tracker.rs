//! Outbound sequence numbering and acknowledgment tracking
//!
//! Sequence ids are 1-based: the counter starts at 0 and is incremented
//! before every send, so id 0 is never on the wire. The watermark is the
//! highest id the server has acknowledged; under a correct peer it only
//! moves forward. Loss is detected and reported, never recovered — a
//! stale telemetry frame is superseded by the next one anyway, so
//! retransmission would only add load.

/// Result of validating one inbound acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Watermark advanced normally
    Advanced,
    /// Ack of an already-acknowledged message; no state change
    Stale,
    /// Ack of an id we never sent (protocol violation); no state change
    Unsent,
    /// Ack skipped over unacknowledged ids; watermark still advanced
    Gap {
        /// How many ids went unacknowledged
        lost: u16,
    },
    /// Server flagged the message as misunderstood; watermark advanced
    Misunderstood,
}

/// Diagnostic counters surfaced for tests and status reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    /// Stale acks seen
    pub stale: u64,
    /// Acks of unsent ids seen
    pub unsent: u64,
    /// Gaps detected
    pub gaps: u64,
    /// Frames the server reported misunderstood
    pub misunderstood: u64,
}

/// Sequence counter plus ack watermark
#[derive(Debug, Default)]
pub struct AckTracker {
    /// Last assigned outbound id (0 = nothing sent yet)
    seq: u16,
    /// Highest acknowledged id
    watermark: u16,
    stats: TrackerStats,
}

impl AckTracker {
    /// New tracker, nothing sent or acknowledged
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next outbound sequence id.
    ///
    /// Id 0 is never on the wire: the counter skips it on wraparound.
    #[inline]
    pub fn next_id(&mut self) -> u16 {
        self.seq = self.seq.wrapping_add(1);
        if self.seq == 0 {
            self.seq = 1;
        }
        self.seq
    }

    /// Last assigned outbound id
    #[inline]
    pub fn last_sent(&self) -> u16 {
        self.seq
    }

    /// Highest acknowledged id
    #[inline]
    pub fn watermark(&self) -> u16 {
        self.watermark
    }

    /// Diagnostic counters
    #[inline]
    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    /// Validate one inbound ack and advance the watermark where allowed
    pub fn observe_ack(&mut self, acked: u16, status: u8) -> AckOutcome {
        if acked < self.watermark {
            self.stats.stale += 1;
            return AckOutcome::Stale;
        }
        if acked > self.seq {
            self.stats.unsent += 1;
            return AckOutcome::Unsent;
        }

        let gap = acked as u32 > self.watermark as u32 + 1;
        if gap {
            self.stats.gaps += 1;
        }
        if status != 0 {
            self.stats.misunderstood += 1;
        }
        let outcome = if gap {
            AckOutcome::Gap {
                lost: acked - self.watermark - 1,
            }
        } else if status != 0 {
            AckOutcome::Misunderstood
        } else {
            AckOutcome::Advanced
        };

        self.watermark = acked;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_n(tracker: &mut AckTracker, n: u16) {
        for _ in 0..n {
            tracker.next_id();
        }
    }

    #[test]
    fn test_ids_start_at_one() {
        let mut tracker = AckTracker::new();
        assert_eq!(tracker.last_sent(), 0);
        assert_eq!(tracker.next_id(), 1);
        assert_eq!(tracker.next_id(), 2);
    }

    #[test]
    fn test_wraparound_skips_id_zero() {
        let mut tracker = AckTracker::new();
        let mut last = 0;
        for _ in 0..u16::MAX as u32 {
            last = tracker.next_id();
        }
        assert_eq!(last, u16::MAX);
        assert_eq!(tracker.next_id(), 1);
    }

    #[test]
    fn test_consecutive_acks_advance() {
        let mut tracker = AckTracker::new();
        send_n(&mut tracker, 3);

        assert_eq!(tracker.observe_ack(1, 0), AckOutcome::Advanced);
        assert_eq!(tracker.observe_ack(2, 0), AckOutcome::Advanced);
        assert_eq!(tracker.watermark(), 2);
        assert_eq!(tracker.stats(), TrackerStats::default());
    }

    #[test]
    fn test_gap_detected_and_watermark_advances() {
        let mut tracker = AckTracker::new();
        send_n(&mut tracker, 3);

        assert_eq!(tracker.observe_ack(1, 0), AckOutcome::Advanced);
        assert_eq!(tracker.observe_ack(3, 0), AckOutcome::Gap { lost: 1 });
        assert_eq!(tracker.watermark(), 3);
        assert_eq!(tracker.stats().gaps, 1);
    }

    #[test]
    fn test_watermark_never_regresses() {
        let mut tracker = AckTracker::new();
        send_n(&mut tracker, 5);

        tracker.observe_ack(4, 0);
        for acked in [4, 3, 2, 1] {
            tracker.observe_ack(acked, 0);
            assert_eq!(tracker.watermark(), 4);
        }
        assert_eq!(tracker.stats().stale, 3);
    }

    #[test]
    fn test_ack_of_unsent_ignored() {
        let mut tracker = AckTracker::new();
        send_n(&mut tracker, 2);

        assert_eq!(tracker.observe_ack(9, 0), AckOutcome::Unsent);
        assert_eq!(tracker.watermark(), 0);
        assert_eq!(tracker.stats().unsent, 1);
    }

    #[test]
    fn test_misunderstood_still_advances() {
        let mut tracker = AckTracker::new();
        send_n(&mut tracker, 1);

        assert_eq!(tracker.observe_ack(1, 2), AckOutcome::Misunderstood);
        assert_eq!(tracker.watermark(), 1);
        assert_eq!(tracker.stats().misunderstood, 1);
    }

    #[test]
    fn test_equal_ack_is_noop() {
        let mut tracker = AckTracker::new();
        send_n(&mut tracker, 1);
        tracker.observe_ack(1, 0);

        assert_eq!(tracker.observe_ack(1, 0), AckOutcome::Advanced);
        assert_eq!(tracker.watermark(), 1);
        assert_eq!(tracker.stats().stale, 0);
    }
}
