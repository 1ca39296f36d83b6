//! Network subsystem for UDP PCM transport

pub mod receiver;
pub mod sender;
pub mod udp;

pub use receiver::{AudioReceiver, IngestOutcome, NetworkIngest};
pub use sender::{PcmSender, ToneGenerator};
pub use udp::{bind_async, create_socket};
