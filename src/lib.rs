//! # LAN PCM Bridge
//!
//! Absorbs network jitter between a bursty UDP source of raw PCM and a
//! steadily clocked audio output.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              RECEIVER                                │
//! │                                                                      │
//! │   UDP datagrams (raw PCM, no header)                                 │
//! │          │                                                           │
//! │          ▼                                                           │
//! │  ┌─────────────────────────┐     tokio task (ingest context)         │
//! │  │ NetworkIngest           │     whole datagram or drop              │
//! │  │ (network::receiver)     │                                         │
//! │  └───────────┬─────────────┘                                         │
//! │              ▼                                                       │
//! │  ┌─────────────────────────┐     fixed capacity, one lock,           │
//! │  │ RingBuffer              │     all-or-nothing operations           │
//! │  │ (audio::buffer)         │◄──────────────┐                         │
//! │  └───────────┬─────────────┘               │ read-only               │
//! │              ▼                             │                         │
//! │  ┌─────────────────────────┐   ┌───────────┴─────────────┐           │
//! │  │ PlaybackDrain           │   │ StatsMonitor            │           │
//! │  │ (audio::drain)          │   │ (monitor::stats)        │           │
//! │  └───────────┬─────────────┘   └─────────────────────────┘           │
//! │              │        playback thread (cooperative loop)             │
//! │              ▼                                                       │
//! │  ┌─────────────────────────┐                                         │
//! │  │ AudioSink (cpal device) │     paced by the device clock           │
//! │  └─────────────────────────┘                                         │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod monitor;
pub mod network;
pub mod player;
pub mod ui;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default sample rate for the PCM stream
    pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

    /// Default channel count (stereo)
    pub const DEFAULT_CHANNELS: u16 = 2;

    /// Default sample width
    pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

    /// Default UDP port for audio streaming
    pub const DEFAULT_UDP_PORT: u16 = 5000;

    /// Default HTTP port for the status API
    pub const DEFAULT_HTTP_PORT: u16 = 8080;

    /// Largest UDP payload over IPv4
    pub const MAX_DATAGRAM_SIZE: usize = 65507;

    /// Payload that fits one Ethernet frame (MTU - IP/UDP headers)
    pub const MAX_PACKET_SIZE: usize = 1472;

    /// Sender payload per datagram
    pub const DEFAULT_PAYLOAD_SIZE: usize = 1024;

    /// Kernel socket receive buffer
    pub const DEFAULT_SOCKET_BUFFER_SIZE: usize = 1 << 20;

    /// Ring buffer size tried first (about 1.5s of CD audio)
    pub const PREFERRED_RING_CAPACITY: usize = 256 * 1024;

    /// Ring buffer size used when the preferred allocation fails
    pub const FALLBACK_RING_CAPACITY: usize = 16 * 1024;

    /// Bytes per write to the output sink
    pub const DEFAULT_CHUNK_SIZE: usize = 1024;

    /// Bytes buffered before playback starts
    pub const DEFAULT_START_THRESHOLD: usize = 4096;

    /// Chunks forwarded per drain step before the loop polls stats again
    pub const MAX_CHUNKS_PER_STEP: usize = 8;

    /// Playback loop pause while prefilling
    pub const DEFAULT_IDLE_SLEEP_US: u64 = 500;

    /// Chunks queued between the drain and the device callback
    pub const DEFAULT_SINK_QUEUE_DEPTH: usize = 4;

    /// Seconds between buffer reports
    pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 5;
}
