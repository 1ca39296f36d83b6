//! Interval counters shared between ingest, playback and the stats monitor

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Counters bumped by the ingest and playback contexts
///
/// Interval values are reset to zero on every report; lifetime values only
/// ever grow. All of them sit behind one lock so a report never sees half
/// of an update.
#[derive(Debug, Default)]
pub struct IntervalCounters {
    inner: Mutex<Tally>,
}

#[derive(Debug, Default)]
struct Tally {
    interval: IntervalValues,
    lifetime: LifetimeValues,
}

/// Values taken by one `IntervalCounters::take`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntervalValues {
    pub packets_received: u64,
    pub bytes_received: u64,
    pub bytes_played: u64,
    pub dropped_packets: u64,
    pub dropped_bytes: u64,
    pub underruns: u64,
}

/// Lifetime totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LifetimeValues {
    pub packets_received: u64,
    pub dropped_packets: u64,
    pub underruns: u64,
}

impl IntervalCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted datagram
    pub fn record_packet(&self, bytes: usize) {
        let mut tally = self.inner.lock();
        tally.interval.packets_received += 1;
        tally.interval.bytes_received += bytes as u64;
        tally.lifetime.packets_received += 1;
    }

    /// Datagram rejected for lack of space
    pub fn record_drop(&self, bytes: usize) {
        let mut tally = self.inner.lock();
        tally.interval.dropped_packets += 1;
        tally.interval.dropped_bytes += bytes as u64;
        tally.lifetime.dropped_packets += 1;
    }

    /// Chunk forwarded to the output
    pub fn record_played(&self, bytes: usize) {
        self.inner.lock().interval.bytes_played += bytes as u64;
    }

    pub fn record_underrun(&self) {
        let mut tally = self.inner.lock();
        tally.interval.underruns += 1;
        tally.lifetime.underruns += 1;
    }

    /// Read and zero the interval counters
    pub fn take(&self) -> IntervalValues {
        std::mem::take(&mut self.inner.lock().interval)
    }

    /// Current interval values without resetting them
    pub fn peek(&self) -> IntervalValues {
        self.inner.lock().interval
    }

    pub fn lifetime(&self) -> LifetimeValues {
        self.inner.lock().lifetime
    }
}

pub type SharedCounters = Arc<IntervalCounters>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_resets_interval_only() {
        let counters = IntervalCounters::new();
        counters.record_packet(100);
        counters.record_packet(50);
        counters.record_drop(1500);
        counters.record_played(1024);
        counters.record_underrun();

        let values = counters.take();
        assert_eq!(values.packets_received, 2);
        assert_eq!(values.bytes_received, 150);
        assert_eq!(values.dropped_packets, 1);
        assert_eq!(values.dropped_bytes, 1500);
        assert_eq!(values.bytes_played, 1024);
        assert_eq!(values.underruns, 1);

        assert_eq!(counters.take(), IntervalValues::default());
        assert_eq!(
            counters.lifetime(),
            LifetimeValues { packets_received: 2, dropped_packets: 1, underruns: 1 }
        );
    }

    #[test]
    fn test_peek_does_not_reset() {
        let counters = IntervalCounters::new();
        counters.record_packet(10);
        assert_eq!(counters.peek().packets_received, 1);
        assert_eq!(counters.peek().packets_received, 1);
    }

    #[test]
    fn test_take_never_splits_an_update() {
        let counters = Arc::new(IntervalCounters::new());
        let recorder = {
            let counters = counters.clone();
            std::thread::spawn(move || {
                for _ in 0..50_000 {
                    counters.record_packet(100);
                }
            })
        };

        let mut packets = 0;
        while !recorder.is_finished() {
            let values = counters.take();
            assert_eq!(values.bytes_received, values.packets_received * 100);
            packets += values.packets_received;
        }
        recorder.join().unwrap();
        packets += counters.take().packets_received;

        assert_eq!(packets, 50_000);
        assert_eq!(counters.lifetime().packets_received, 50_000);
    }
}
