//! Fixed PCM stream format
//!
//! The format is agreed out of band between sender and receiver and never
//! travels on the wire. Samples are signed little-endian, interleaved.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{DEFAULT_BITS_PER_SAMPLE, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::error::ConfigError;

/// PCM sample layout shared by the whole pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcmFormat {
    /// Frames per second
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// 16 or 32
    pub bits_per_sample: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
        }
    }
}

impl PcmFormat {
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Bytes in one interleaved frame (one sample per channel)
    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }

    pub fn bytes_per_second(&self) -> usize {
        self.bytes_per_frame() * self.sample_rate as usize
    }

    /// Playback time represented by `bytes` of PCM
    pub fn duration_of(&self, bytes: usize) -> Duration {
        let rate = self.bytes_per_second();
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((bytes as u128 * 1_000_000_000 / rate as u128) as u64)
    }

    /// Whether `bytes` holds a whole number of frames
    pub fn is_frame_aligned(&self, bytes: usize) -> bool {
        let frame = self.bytes_per_frame();
        frame != 0 && bytes % frame == 0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.bits_per_sample, 16 | 32) {
            return Err(ConfigError::Invalid(format!(
                "bits_per_sample must be 16 or 32, got {}",
                self.bits_per_sample
            )));
        }
        if self.channels == 0 {
            return Err(ConfigError::Invalid("channels must be > 0".into()));
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be > 0".into()));
        }
        Ok(())
    }
}

impl std::fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}Hz/{}ch/{}bit",
            self.sample_rate, self.channels, self.bits_per_sample
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cd_quality() {
        let format = PcmFormat::default();
        assert_eq!(format.bytes_per_frame(), 4);
        assert_eq!(format.bytes_per_second(), 176_400);
        assert_eq!(format.to_string(), "44100Hz/2ch/16bit");
    }

    #[test]
    fn test_duration_of() {
        let format = PcmFormat::default();
        assert_eq!(format.duration_of(176_400), Duration::from_secs(1));
        assert_eq!(format.duration_of(17_640), Duration::from_millis(100));
        assert_eq!(format.duration_of(0), Duration::ZERO);
    }

    #[test]
    fn test_frame_alignment() {
        let format = PcmFormat::default();
        assert!(format.is_frame_aligned(1024));
        assert!(!format.is_frame_aligned(1022));

        let wide = PcmFormat { bits_per_sample: 32, channels: 2, ..Default::default() };
        assert!(wide.is_frame_aligned(1024));
        assert!(!wide.is_frame_aligned(1028 - 2));
    }

    #[test]
    fn test_validate_rejects_unsupported_depth() {
        let format = PcmFormat { bits_per_sample: 24, ..Default::default() };
        assert!(format.validate().is_err());
        assert!(PcmFormat::default().validate().is_ok());
    }
}
