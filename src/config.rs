//! Application configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an absent
//! file or a partial one is fine.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::format::PcmFormat;
use crate::constants::*;
use crate::error::ConfigError;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub format: PcmFormat,
    pub buffer: BufferConfig,
    pub playback: PlaybackConfig,
    pub stats: StatsConfig,
    pub ui: UiConfig,
}

/// UDP ingest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_address: String,
    pub udp_port: u16,
    /// Kernel receive buffer requested for the socket
    pub recv_buffer_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            udp_port: DEFAULT_UDP_PORT,
            recv_buffer_size: DEFAULT_SOCKET_BUFFER_SIZE,
        }
    }
}

impl NetworkConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.udp_port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bind address: {}", e)))
    }
}

/// Ring buffer sizing and the drain trade-offs
///
/// A larger `chunk_size` means fewer sink calls but a longer critical
/// section per read and a later playback start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub preferred_capacity: usize,
    pub fallback_capacity: usize,
    pub chunk_size: usize,
    pub start_threshold: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            preferred_capacity: PREFERRED_RING_CAPACITY,
            fallback_capacity: FALLBACK_RING_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
            start_threshold: DEFAULT_START_THRESHOLD,
        }
    }
}

/// Output side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Output device name, default device when unset
    pub output_device: Option<String>,
    /// Pause between loop iterations while prefilling
    pub idle_sleep_us: u64,
    /// Chunks queued ahead of the device callback
    pub sink_queue_depth: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            output_device: None,
            idle_sleep_us: DEFAULT_IDLE_SLEEP_US,
            sink_queue_depth: DEFAULT_SINK_QUEUE_DEPTH,
        }
    }
}

impl PlaybackConfig {
    pub fn idle_sleep(&self) -> Duration {
        Duration::from_micros(self.idle_sleep_us)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub report_interval_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
        }
    }
}

impl StatsConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

/// Status API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub http_port: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1".to_string(),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl AppConfig {
    /// Default config file location for this platform
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lan-pcm-bridge").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`, else from the default location, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.format.validate()?;

        let buffer = &self.buffer;
        if buffer.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be > 0".into()));
        }
        if !self.format.is_frame_aligned(buffer.chunk_size) {
            return Err(ConfigError::Invalid(format!(
                "chunk_size ({}) must be a multiple of the {}-byte frame",
                buffer.chunk_size,
                self.format.bytes_per_frame()
            )));
        }
        if buffer.start_threshold <= buffer.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "start_threshold ({}) must exceed chunk_size ({})",
                buffer.start_threshold, buffer.chunk_size
            )));
        }
        if buffer.fallback_capacity < buffer.start_threshold {
            return Err(ConfigError::Invalid(format!(
                "fallback_capacity ({}) is smaller than start_threshold ({})",
                buffer.fallback_capacity, buffer.start_threshold
            )));
        }
        if buffer.preferred_capacity < buffer.fallback_capacity {
            return Err(ConfigError::Invalid(format!(
                "preferred_capacity ({}) is smaller than fallback_capacity ({})",
                buffer.preferred_capacity, buffer.fallback_capacity
            )));
        }
        if self.stats.report_interval_secs == 0 {
            return Err(ConfigError::Invalid("report_interval_secs must be > 0".into()));
        }
        self.network.socket_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer.chunk_size, 1024);
        assert_eq!(config.buffer.start_threshold, 4096);
        assert_eq!(config.buffer.fallback_capacity, 16384);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [network]
            udp_port = 6000

            [buffer]
            chunk_size = 512
            "#,
        )
        .unwrap();

        assert_eq!(config.network.udp_port, 6000);
        assert_eq!(config.network.bind_address, "0.0.0.0");
        assert_eq!(config.buffer.chunk_size, 512);
        assert_eq!(config.buffer.start_threshold, DEFAULT_START_THRESHOLD);
        assert_eq!(config.format, PcmFormat::default());
    }

    #[test]
    fn test_rejects_threshold_at_chunk_size() {
        let err = AppConfig::from_toml(
            r#"
            [buffer]
            chunk_size = 4096
            start_threshold = 4096
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must exceed chunk_size"));
    }

    #[test]
    fn test_rejects_misaligned_chunk() {
        let mut config = AppConfig::default();
        config.buffer.chunk_size = 1022;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_fallback_below_threshold() {
        let mut config = AppConfig::default();
        config.buffer.fallback_capacity = 2048;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let mut config = AppConfig::default();
        config.playback.output_device = Some("Speakers".into());
        config.stats.report_interval_secs = 2;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();

        let loaded = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/lan-pcm-bridge.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
