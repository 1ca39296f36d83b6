//! Audio playback to an output device
//!
//! The device callback pulls from a short bounded queue. `write` blocks
//! while that queue is full, so the drain runs at the device clock and never
//! further ahead than `queue_depth` chunks. The wait is bounded by the
//! playback time the queue holds; a stream that stops pulling fails the
//! write instead of hanging the playback thread.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use crate::audio::device::get_output_device;
use crate::audio::format::PcmFormat;
use crate::audio::sink::AudioSink;
use crate::error::AudioError;

/// Producer side of the queue feeding the device callback
pub struct DeviceQueue {
    tx: Sender<Vec<f32>>,
    errors: Receiver<AudioError>,
}

impl DeviceQueue {
    pub fn new(tx: Sender<Vec<f32>>, errors: Receiver<AudioError>) -> Self {
        Self { tx, errors }
    }

    /// Queue samples, waiting at most `timeout` for room
    ///
    /// An error reported by the stream since the last push fails this push.
    pub fn push(&self, samples: Vec<f32>, timeout: Duration) -> Result<(), AudioError> {
        if let Ok(err) = self.errors.try_recv() {
            return Err(err);
        }

        match self.tx.send_timeout(samples, timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(AudioError::StreamError(format!(
                "output stream stalled for {:?}",
                timeout
            ))),
            Err(SendTimeoutError::Disconnected(_)) => Err(AudioError::SinkClosed),
        }
    }
}

/// Sink backed by a cpal output stream
pub struct CpalSink {
    /// Dropping the stream stops playback
    _stream: cpal::Stream,
    queue: DeviceQueue,
    queue_depth: usize,
    format: PcmFormat,
    device_name: String,
}

impl CpalSink {
    /// Open `device_name` (or the default output) in the given format
    pub fn open(
        device_name: Option<&str>,
        format: PcmFormat,
        queue_depth: usize,
    ) -> Result<Self, AudioError> {
        format
            .validate()
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

        let device = get_output_device(device_name)?;
        if !device.supports(&format)? {
            return Err(AudioError::UnsupportedFormat(format!(
                "{} does not support {}",
                device.name, format
            )));
        }

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue_depth = queue_depth.max(1);
        let (tx, rx) = bounded::<Vec<f32>>(queue_depth);
        let (error_tx, error_rx) = bounded::<AudioError>(16);

        let mut pending: Vec<f32> = Vec::new();
        let mut position = 0usize;

        let stream = device
            .inner()
            .build_output_stream(
                &config,
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut filled = 0;
                    while filled < out.len() {
                        if position >= pending.len() {
                            match rx.try_recv() {
                                Ok(next) => {
                                    pending = next;
                                    position = 0;
                                    continue;
                                }
                                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                            }
                        }
                        let n = (pending.len() - position).min(out.len() - filled);
                        out[filled..filled + n].copy_from_slice(&pending[position..position + n]);
                        filled += n;
                        position += n;
                    }
                    // Device ran ahead of the queue
                    out[filled..].fill(0.0);
                },
                move |err| {
                    let _ = error_tx.try_send(AudioError::StreamError(err.to_string()));
                },
                None,
            )
            .map_err(|e| AudioError::CpalError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        tracing::info!("Output stream opened on {} ({})", device.name, format);

        Ok(Self {
            _stream: stream,
            queue: DeviceQueue::new(tx, error_rx),
            queue_depth,
            format,
            device_name: device.name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl AudioSink for CpalSink {
    fn write(&mut self, pcm: &[u8]) -> Result<(), AudioError> {
        let samples = pcm_to_f32(pcm, &self.format)?;
        // Everything queued ahead of this chunk plays out within this
        let timeout = self.format.duration_of(pcm.len()) * (self.queue_depth as u32 + 1);
        self.queue.push(samples, timeout)
    }
}

/// Convert interleaved little-endian PCM into device samples
pub fn pcm_to_f32(pcm: &[u8], format: &PcmFormat) -> Result<Vec<f32>, AudioError> {
    if !format.is_frame_aligned(pcm.len()) {
        return Err(AudioError::MisalignedChunk(pcm.len()));
    }

    let samples = match format.bits_per_sample {
        16 => pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
            .collect(),
        32 => pcm
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32 / 2_147_483_648.0)
            .collect(),
        bits => {
            return Err(AudioError::UnsupportedFormat(format!("{} bits per sample", bits)));
        }
    };
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm16_conversion() {
        let format = PcmFormat::default();
        let mut pcm = Vec::new();
        for sample in [0i16, i16::MAX, i16::MIN, -16384] {
            pcm.extend_from_slice(&sample.to_le_bytes());
        }

        let samples = pcm_to_f32(&pcm, &format).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 1.0).abs() < 1e-4);
        assert_eq!(samples[2], -1.0);
        assert_eq!(samples[3], -0.5);
    }

    #[test]
    fn test_pcm32_conversion() {
        let format = PcmFormat { bits_per_sample: 32, ..Default::default() };
        let mut pcm = Vec::new();
        for sample in [i32::MIN, 1 << 30] {
            pcm.extend_from_slice(&sample.to_le_bytes());
        }

        let samples = pcm_to_f32(&pcm, &format).unwrap();
        assert_eq!(samples, vec![-1.0, 0.5]);
    }

    #[test]
    fn test_rejects_partial_frame() {
        let format = PcmFormat::default();
        assert!(matches!(
            pcm_to_f32(&[0u8; 6], &format),
            Err(AudioError::MisalignedChunk(6))
        ));
    }

    #[test]
    fn test_push_times_out_when_callback_stops_pulling() {
        let (tx, _rx) = bounded::<Vec<f32>>(1);
        let (_error_tx, error_rx) = bounded::<AudioError>(1);
        let queue = DeviceQueue::new(tx, error_rx);

        queue.push(vec![0.0; 512], Duration::from_millis(20)).unwrap();

        let start = std::time::Instant::now();
        let result = queue.push(vec![0.0; 512], Duration::from_millis(20));
        assert!(matches!(result, Err(AudioError::StreamError(_))));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_push_fails_on_reported_stream_error() {
        let (tx, rx) = bounded::<Vec<f32>>(4);
        let (error_tx, error_rx) = bounded::<AudioError>(1);
        let queue = DeviceQueue::new(tx, error_rx);

        error_tx
            .send(AudioError::StreamError("device unplugged".into()))
            .unwrap();
        assert!(matches!(
            queue.push(vec![0.0; 4], Duration::from_millis(20)),
            Err(AudioError::StreamError(msg)) if msg == "device unplugged"
        ));
        assert!(rx.is_empty());

        // Reported once; the next push goes through
        queue.push(vec![0.0; 4], Duration::from_millis(20)).unwrap();
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_push_reports_closed_stream() {
        let (tx, rx) = bounded::<Vec<f32>>(1);
        let (_error_tx, error_rx) = bounded::<AudioError>(1);
        let queue = DeviceQueue::new(tx, error_rx);
        drop(rx);
        assert!(matches!(
            queue.push(vec![0.0; 4], Duration::from_millis(20)),
            Err(AudioError::SinkClosed)
        ));
    }
}
