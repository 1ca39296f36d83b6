//! Datagram ingest into the ring buffer
//!
//! Each datagram is raw PCM with no header. It either fits in the ring
//! buffer as a whole or is dropped as a whole; the sender is never told.

use std::net::SocketAddr;
use tokio::task::JoinHandle;

use crate::audio::buffer::SharedRingBuffer;
use crate::config::NetworkConfig;
use crate::constants::MAX_DATAGRAM_SIZE;
use crate::error::NetworkError;
use crate::monitor::counters::SharedCounters;
use crate::network::udp::bind_async;

/// What happened to one datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted(usize),
    /// Not enough free space
    Dropped(usize),
    /// Zero-length payload, ignored
    Empty,
}

/// Producer side of the ring buffer
#[derive(Clone)]
pub struct NetworkIngest {
    buffer: SharedRingBuffer,
    counters: SharedCounters,
}

impl NetworkIngest {
    pub fn new(buffer: SharedRingBuffer, counters: SharedCounters) -> Self {
        Self { buffer, counters }
    }

    /// Push one datagram payload, never waiting for space
    pub fn on_datagram(&self, payload: &[u8]) -> IngestOutcome {
        let len = payload.len();
        if len == 0 {
            return IngestOutcome::Empty;
        }

        if self.buffer.free_space() < len || !self.buffer.try_write(payload) {
            self.counters.record_drop(len);
            tracing::debug!("Ring buffer full, dropped {} byte datagram", len);
            return IngestOutcome::Dropped(len);
        }

        self.counters.record_packet(len);
        IngestOutcome::Accepted(len)
    }
}

/// Background task receiving datagrams from one UDP port
pub struct AudioReceiver {
    local_addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl AudioReceiver {
    /// Bind the configured port and start the receive task
    pub async fn start(config: &NetworkConfig, ingest: NetworkIngest) -> Result<Self, NetworkError> {
        let addr = config
            .socket_addr()
            .map_err(|e| NetworkError::InvalidAddress(e.to_string()))?;
        let socket = bind_async(addr, config.recv_buffer_size)?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| NetworkError::BindFailed(e.to_string()))?;

        let handle = tokio::spawn(receive_loop(socket, ingest));
        tracing::info!("Listening for PCM datagrams on {}", local_addr);

        Ok(Self { local_addr, handle })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AudioReceiver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn receive_loop(socket: tokio::net::UdpSocket, ingest: NetworkIngest) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut last_peer: Option<SocketAddr> = None;

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, peer)) => {
                if last_peer != Some(peer) {
                    tracing::info!("Receiving audio from {}", peer);
                    last_peer = Some(peer);
                }
                ingest.on_datagram(&buf[..len]);
            }
            Err(e) => {
                // ICMP errors and the like; the next datagram may be fine
                tracing::warn!("{}", NetworkError::ReceiveFailed(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::RingBuffer;
    use crate::monitor::counters::IntervalCounters;
    use std::sync::Arc;
    use std::time::Duration;

    fn ingest(capacity: usize) -> (NetworkIngest, SharedRingBuffer, SharedCounters) {
        let buffer = Arc::new(RingBuffer::new(capacity));
        let counters = Arc::new(IntervalCounters::new());
        (NetworkIngest::new(buffer.clone(), counters.clone()), buffer, counters)
    }

    #[test]
    fn test_overflow_drops_whole_datagram() {
        let (ingest, buffer, counters) = ingest(16384);

        assert_eq!(ingest.on_datagram(&vec![1; 5000]), IngestOutcome::Accepted(5000));
        assert_eq!(ingest.on_datagram(&vec![2; 12000]), IngestOutcome::Dropped(12000));
        assert_eq!(buffer.occupied_space(), 5000);

        let values = counters.take();
        assert_eq!(values.packets_received, 1);
        assert_eq!(values.bytes_received, 5000);
        assert_eq!(values.dropped_packets, 1);
        assert_eq!(values.dropped_bytes, 12000);
    }

    #[test]
    fn test_oversized_datagram_never_fits() {
        let (ingest, buffer, _counters) = ingest(1024);
        assert_eq!(ingest.on_datagram(&vec![0; 1025]), IngestOutcome::Dropped(1025));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_empty_datagram_ignored() {
        let (ingest, _buffer, counters) = ingest(1024);
        assert_eq!(ingest.on_datagram(&[]), IngestOutcome::Empty);
        assert_eq!(counters.take(), Default::default());
    }

    #[tokio::test]
    async fn test_receiver_feeds_ring_buffer() {
        let (ingest, buffer, counters) = ingest(4096);
        let config = NetworkConfig {
            bind_address: "127.0.0.1".into(),
            udp_port: 0,
            recv_buffer_size: 0,
        };
        let receiver = AudioReceiver::start(&config, ingest).await.unwrap();
        assert!(receiver.is_running());

        let sender = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        for i in 0..3u8 {
            sender.send_to(&[i; 1000], receiver.local_addr()).await.unwrap();
        }
        // Only 1096 bytes left
        sender.send_to(&[9; 1500], receiver.local_addr()).await.unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while counters.peek().packets_received + counters.peek().dropped_packets < 4 {
            assert!(tokio::time::Instant::now() < deadline, "datagrams not ingested");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(buffer.occupied_space(), 3000);
        let mut chunk = [0u8; 1000];
        assert_eq!(buffer.try_read(&mut chunk), 1000);
        assert_eq!(chunk, [0; 1000]);
        assert_eq!(counters.peek().dropped_packets, 1);
    }
}
