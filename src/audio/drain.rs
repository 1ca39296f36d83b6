//! Chunked drain from the ring buffer into the output sink
//!
//! Playback waits until `start_threshold` bytes are buffered, then forwards
//! fixed-size chunks for as long as a full chunk is available. Once the
//! buffer can no longer supply a chunk the prefill gate closes again, so a
//! brief dip does not turn into a stream of tiny start/stop gaps.
//!
//! One step forwards at most `max_chunks` chunks so the loop hosting the
//! drain gets control back even while the buffer never runs dry.

use crate::audio::buffer::SharedRingBuffer;
use crate::audio::sink::AudioSink;
use crate::constants::MAX_CHUNKS_PER_STEP;
use crate::error::ConfigError;
use crate::monitor::counters::SharedCounters;

/// Outcome of one drain step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStep {
    /// Below the prefill threshold; nothing was read
    Prefilling { occupied: usize },
    /// Chunks were forwarded, up to the per-step limit
    Drained {
        chunks: usize,
        bytes: usize,
        /// The buffer ran out of whole chunks
        starved: bool,
    },
}

impl DrainStep {
    /// Whether the loop should pause before the next step
    pub fn should_idle(&self) -> bool {
        match self {
            DrainStep::Prefilling { .. } => true,
            DrainStep::Drained { starved, .. } => *starved,
        }
    }
}

pub struct PlaybackDrain {
    buffer: SharedRingBuffer,
    counters: SharedCounters,
    chunk: Vec<u8>,
    start_threshold: usize,
    max_chunks: usize,
    playing: bool,
}

impl PlaybackDrain {
    pub fn new(
        buffer: SharedRingBuffer,
        counters: SharedCounters,
        chunk_size: usize,
        start_threshold: usize,
    ) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be > 0".into()));
        }
        if start_threshold <= chunk_size {
            return Err(ConfigError::Invalid(format!(
                "start_threshold ({}) must exceed chunk_size ({})",
                start_threshold, chunk_size
            )));
        }
        if start_threshold > buffer.capacity() {
            return Err(ConfigError::Invalid(format!(
                "start_threshold ({}) exceeds ring capacity ({})",
                start_threshold,
                buffer.capacity()
            )));
        }

        Ok(Self {
            buffer,
            counters,
            chunk: vec![0u8; chunk_size],
            start_threshold,
            max_chunks: MAX_CHUNKS_PER_STEP,
            playing: false,
        })
    }

    /// Limit the chunks forwarded by one `step` (at least one)
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk.len()
    }

    pub fn start_threshold(&self) -> usize {
        self.start_threshold
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Run one iteration of the drain
    pub fn step<S: AudioSink + ?Sized>(&mut self, sink: &mut S) -> DrainStep {
        if !self.playing {
            let occupied = self.buffer.occupied_space();
            if occupied < self.start_threshold {
                return DrainStep::Prefilling { occupied };
            }
            tracing::info!("Prefill reached ({} bytes buffered), starting playback", occupied);
            self.playing = true;
        }

        let mut chunks = 0;
        let mut bytes = 0;
        while chunks < self.max_chunks {
            let read = self.buffer.try_read(&mut self.chunk);
            if read == 0 {
                break;
            }

            if let Err(e) = sink.write(&self.chunk[..read]) {
                tracing::warn!("Output write failed, chunk discarded: {}", e);
                return DrainStep::Drained { chunks, bytes, starved: false };
            }

            self.counters.record_played(read);
            chunks += 1;
            bytes += read;
        }

        if chunks == self.max_chunks {
            return DrainStep::Drained { chunks, bytes, starved: false };
        }

        self.playing = false;
        self.counters.record_underrun();
        tracing::debug!(
            "Buffer starved after {} chunks, waiting for {} bytes",
            chunks,
            self.start_threshold
        );
        DrainStep::Drained { chunks, bytes, starved: true }
    }
}
