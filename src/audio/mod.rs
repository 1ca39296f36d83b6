//! Audio subsystem module

pub mod buffer;
pub mod device;
pub mod drain;
pub mod format;
pub mod playback;
pub mod sink;

pub use buffer::{create_shared_buffer, RingBuffer, SharedRingBuffer};
pub use device::{get_output_device, list_devices, AudioDevice, AudioDeviceInfo};
pub use drain::{DrainStep, PlaybackDrain};
pub use format::PcmFormat;
pub use playback::{CpalSink, DeviceQueue};
pub use sink::{AudioSink, MemorySink, NullSink};
