//! Test-signal source
//!
//! Streams a generated sine tone as raw PCM datagrams at real-time pace, so
//! the receiver can be exercised without a real audio producer.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{Instant, MissedTickBehavior};

use crate::audio::format::PcmFormat;
use crate::error::NetworkError;

/// Sine tone rendered in a fixed PCM format
pub struct ToneGenerator {
    format: PcmFormat,
    frequency: f64,
    amplitude: f64,
    phase: f64,
}

impl ToneGenerator {
    pub fn new(format: PcmFormat, frequency: f64) -> Self {
        Self {
            format,
            frequency,
            amplitude: 0.5,
            phase: 0.0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    /// Append `frames` interleaved frames to `out`
    pub fn fill(&mut self, out: &mut Vec<u8>, frames: usize) {
        let step = self.frequency / self.format.sample_rate as f64;
        for _ in 0..frames {
            let value = (self.phase * std::f64::consts::TAU).sin() * self.amplitude;
            self.phase = (self.phase + step).fract();

            for _ in 0..self.format.channels {
                match self.format.bits_per_sample {
                    16 => out.extend_from_slice(&((value * i16::MAX as f64) as i16).to_le_bytes()),
                    _ => out.extend_from_slice(&((value * i32::MAX as f64) as i32).to_le_bytes()),
                }
            }
        }
    }
}

/// Sender statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct SenderStats {
    pub packets_sent: u64,
    pub bytes_sent: u64,
}

/// Paced PCM datagram sender
pub struct PcmSender {
    socket: UdpSocket,
    target: SocketAddr,
    format: PcmFormat,
    payload_size: usize,
    stats: SenderStats,
}

impl PcmSender {
    /// `payload_size` is rounded down to whole frames
    pub async fn connect(
        target: SocketAddr,
        format: PcmFormat,
        payload_size: usize,
    ) -> Result<Self, NetworkError> {
        let bind = if target.is_ipv4() {
            SocketAddr::from(([0u8; 4], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        let socket = UdpSocket::bind(bind)
            .await
            .map_err(|e| NetworkError::BindFailed(e.to_string()))?;

        let frame = format.bytes_per_frame();
        let payload_size = (payload_size / frame).max(1) * frame;

        Ok(Self {
            socket,
            target,
            format,
            payload_size,
            stats: SenderStats::default(),
        })
    }

    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    /// Playback time carried by one datagram
    pub fn packet_interval(&self) -> Duration {
        self.format.duration_of(self.payload_size)
    }

    pub async fn send(&mut self, payload: &[u8]) -> Result<(), NetworkError> {
        let sent = self
            .socket
            .send_to(payload, self.target)
            .await
            .map_err(|e| NetworkError::SendFailed(e.to_string()))?;
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += sent as u64;
        Ok(())
    }

    /// Send tone datagrams at the format's real-time rate
    ///
    /// Runs until `duration` elapses, or forever when it is `None`.
    pub async fn stream_tone(
        &mut self,
        generator: &mut ToneGenerator,
        duration: Option<Duration>,
    ) -> Result<(), NetworkError> {
        let frames = self.payload_size / self.format.bytes_per_frame();
        let mut ticker = tokio::time::interval(self.packet_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        let start = Instant::now();
        let mut payload = Vec::with_capacity(self.payload_size);
        let mut last_report = start;

        loop {
            ticker.tick().await;
            if let Some(limit) = duration {
                if start.elapsed() >= limit {
                    return Ok(());
                }
            }

            payload.clear();
            generator.fill(&mut payload, frames);
            if let Err(e) = self.send(&payload).await {
                tracing::warn!("Failed to send packet: {}", e);
            }

            if last_report.elapsed() >= Duration::from_secs(5) {
                last_report = Instant::now();
                tracing::info!(
                    "Sent {} packets, {:.1} KB",
                    self.stats.packets_sent,
                    self.stats.bytes_sent as f64 / 1024.0
                );
            }
        }
    }

    pub fn stats(&self) -> SenderStats {
        self.stats
    }
}
