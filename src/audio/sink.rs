//! Output sink interface
//!
//! A sink accepts whole chunks of the fixed PCM format through a synchronous
//! call. Pacing is the sink's business: a device-backed sink blocks until
//! the hardware clock has room, which is what keeps the drain at real time.

use std::thread;
use std::time::{Duration, Instant};

use crate::audio::format::PcmFormat;
use crate::error::AudioError;

/// Synchronous PCM output
pub trait AudioSink {
    /// Hand one chunk of PCM bytes to the output
    fn write(&mut self, pcm: &[u8]) -> Result<(), AudioError>;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn write(&mut self, pcm: &[u8]) -> Result<(), AudioError> {
        (**self).write(pcm)
    }
}

/// Discards audio, optionally sleeping to mimic a device clock
pub struct NullSink {
    format: PcmFormat,
    paced: bool,
    /// Wall-clock deadline of the audio already "played"
    deadline: Option<Instant>,
    bytes_written: u64,
}

impl NullSink {
    /// Sink that returns immediately
    pub fn new(format: PcmFormat) -> Self {
        Self {
            format,
            paced: false,
            deadline: None,
            bytes_written: 0,
        }
    }

    /// Sink that consumes audio at the format's real-time rate
    pub fn paced(format: PcmFormat) -> Self {
        Self {
            paced: true,
            ..Self::new(format)
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl AudioSink for NullSink {
    fn write(&mut self, pcm: &[u8]) -> Result<(), AudioError> {
        self.bytes_written += pcm.len() as u64;
        if !self.paced {
            return Ok(());
        }

        let now = Instant::now();
        let start = match self.deadline {
            Some(deadline) if deadline > now => deadline,
            _ => now,
        };
        let deadline = start + self.format.duration_of(pcm.len());
        self.deadline = Some(deadline);

        // Let at most one chunk run ahead of the clock
        let ahead = deadline.saturating_duration_since(now);
        let allowance = self.format.duration_of(pcm.len());
        if ahead > allowance {
            thread::sleep(ahead - allowance);
        }
        Ok(())
    }
}

/// Collects every chunk it receives
#[derive(Debug, Default)]
pub struct MemorySink {
    pub chunks: Vec<Vec<u8>>,
    /// Fail every write once set
    pub fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.chunks.concat()
    }
}

impl AudioSink for MemorySink {
    fn write(&mut self, pcm: &[u8]) -> Result<(), AudioError> {
        if self.fail {
            return Err(AudioError::SinkClosed);
        }
        self.chunks.push(pcm.to_vec());
        Ok(())
    }
}

/// Pause between playback loop iterations while the buffer refills
pub fn idle(duration: Duration) {
    if duration.is_zero() {
        thread::yield_now();
    } else {
        thread::sleep(duration);
    }
}
