//! Periodic buffer report
//!
//! Runs inside the playback loop on a wall-clock interval. It only reads the
//! ring buffer; the interval counters are the one thing it resets.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::buffer::SharedRingBuffer;
use crate::audio::format::PcmFormat;
use crate::monitor::counters::{IntervalValues, LifetimeValues, SharedCounters};
use crate::monitor::status::StatusIndicator;

/// One report's worth of numbers
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub taken_at: DateTime<Utc>,
    pub occupied: usize,
    pub capacity: usize,
    pub fill_percent: f32,
    /// Playback time held in the buffer
    pub buffered_ms: u64,
    pub interval: IntervalValues,
    pub lifetime: LifetimeValues,
    /// Whether the liveness indicator pulsed for this report
    pub pulsed: bool,
}

/// Latest snapshot, readable from other threads
pub type SharedSnapshot = Arc<RwLock<Option<StatsSnapshot>>>;

pub struct StatsMonitor {
    buffer: SharedRingBuffer,
    counters: SharedCounters,
    format: PcmFormat,
    interval: Duration,
    last_report: Instant,
    indicator: Box<dyn StatusIndicator>,
    latest: SharedSnapshot,
}

impl StatsMonitor {
    pub fn new(
        buffer: SharedRingBuffer,
        counters: SharedCounters,
        format: PcmFormat,
        interval: Duration,
        indicator: Box<dyn StatusIndicator>,
    ) -> Self {
        Self {
            buffer,
            counters,
            format,
            interval,
            last_report: Instant::now(),
            indicator,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Handle for readers outside the playback loop
    pub fn latest(&self) -> SharedSnapshot {
        self.latest.clone()
    }

    /// Report if the interval has elapsed since the previous report
    pub fn poll(&mut self, now: Instant) -> Option<StatsSnapshot> {
        if now.duration_since(self.last_report) < self.interval {
            return None;
        }
        self.last_report = now;
        Some(self.report())
    }

    /// Take a snapshot now, reset interval counters and emit the report
    pub fn report(&mut self) -> StatsSnapshot {
        let ring = self.buffer.stats();
        let interval = self.counters.take();
        let lifetime = self.counters.lifetime();

        let pulsed = ring.occupied > 0;
        if pulsed {
            self.indicator.pulse();
        }

        let snapshot = StatsSnapshot {
            taken_at: Utc::now(),
            occupied: ring.occupied,
            capacity: ring.capacity,
            fill_percent: ring.occupied as f32 * 100.0 / ring.capacity as f32,
            buffered_ms: self.format.duration_of(ring.occupied).as_millis() as u64,
            interval,
            lifetime,
            pulsed,
        };

        tracing::info!(
            "Buffer: {}/{} bytes ({:.1}%, {} ms) | packets: {} ({} bytes) | played: {} bytes | dropped: {} ({} bytes) | underruns: {}",
            snapshot.occupied,
            snapshot.capacity,
            snapshot.fill_percent,
            snapshot.buffered_ms,
            interval.packets_received,
            interval.bytes_received,
            interval.bytes_played,
            interval.dropped_packets,
            interval.dropped_bytes,
            interval.underruns
        );

        *self.latest.write() = Some(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::RingBuffer;
    use crate::monitor::counters::IntervalCounters;
    use parking_lot::Mutex;

    /// Indicator whose pulse count stays visible after it is boxed
    struct SharedPulses(Arc<Mutex<usize>>);

    impl StatusIndicator for SharedPulses {
        fn set(&mut self, _on: bool) {}

        fn pulse(&mut self) {
            *self.0.lock() += 1;
        }
    }

    fn monitor(capacity: usize) -> (StatsMonitor, SharedRingBuffer, SharedCounters, Arc<Mutex<usize>>) {
        let buffer = Arc::new(RingBuffer::new(capacity));
        let counters = Arc::new(IntervalCounters::new());
        let pulses = Arc::new(Mutex::new(0));
        let monitor = StatsMonitor::new(
            buffer.clone(),
            counters.clone(),
            PcmFormat::default(),
            Duration::from_secs(5),
            Box::new(SharedPulses(pulses.clone())),
        );
        (monitor, buffer, counters, pulses)
    }

    #[test]
    fn test_idle_interval_reports_zero_without_pulse() {
        let (mut monitor, _buffer, _counters, pulses) = monitor(16384);

        let snapshot = monitor.report();
        assert_eq!(snapshot.occupied, 0);
        assert_eq!(snapshot.fill_percent, 0.0);
        assert_eq!(snapshot.interval.packets_received, 0);
        assert_eq!(snapshot.interval.bytes_played, 0);
        assert!(!snapshot.pulsed);
        assert_eq!(*pulses.lock(), 0);
    }

    #[test]
    fn test_report_snapshots_and_resets() {
        let (mut monitor, buffer, counters, pulses) = monitor(16384);
        buffer.try_write(&vec![0; 4096]);
        counters.record_packet(4096);
        counters.record_played(1024);

        let snapshot = monitor.report();
        assert_eq!(snapshot.occupied, 4096);
        assert_eq!(snapshot.fill_percent, 25.0);
        assert_eq!(snapshot.buffered_ms, 23);
        assert_eq!(snapshot.interval.packets_received, 1);
        assert_eq!(snapshot.interval.bytes_received, 4096);
        assert_eq!(snapshot.interval.bytes_played, 1024);
        assert!(snapshot.pulsed);
        assert_eq!(*pulses.lock(), 1);

        // Counters reset, buffer untouched
        let next = monitor.report();
        assert_eq!(next.interval.packets_received, 0);
        assert_eq!(next.occupied, 4096);
        assert_eq!(next.lifetime.packets_received, 1);
        assert_eq!(buffer.occupied_space(), 4096);
    }

    #[test]
    fn test_poll_respects_interval() {
        let (mut monitor, _buffer, _counters, _pulses) = monitor(1024);
        let start = monitor.last_report;

        assert!(monitor.poll(start + Duration::from_secs(1)).is_none());
        assert!(monitor.poll(start + Duration::from_secs(5)).is_some());
        assert!(monitor.poll(start + Duration::from_secs(9)).is_none());
        assert!(monitor.poll(start + Duration::from_secs(10)).is_some());
    }

    #[test]
    fn test_latest_snapshot_is_shared() {
        let (mut monitor, _buffer, _counters, _pulses) = monitor(1024);
        let latest = monitor.latest();
        assert!(latest.read().is_none());

        monitor.report();
        assert!(latest.read().is_some());
    }
}
