//! UDP socket setup

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;

use crate::error::NetworkError;

/// Create a non-blocking UDP socket bound to `addr`
///
/// The kernel receive buffer is enlarged so bursts survive while the ingest
/// task is descheduled. A refused size is logged, not fatal.
pub fn create_socket(addr: SocketAddr, recv_buffer_size: usize) -> Result<std::net::UdpSocket, NetworkError> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| NetworkError::BindFailed(e.to_string()))?;

    socket
        .set_reuse_address(true)
        .map_err(|e| NetworkError::BindFailed(e.to_string()))?;

    if recv_buffer_size > 0 {
        if let Err(e) = socket.set_recv_buffer_size(recv_buffer_size) {
            tracing::warn!("Could not set receive buffer to {} bytes: {}", recv_buffer_size, e);
        }
    }

    socket
        .set_nonblocking(true)
        .map_err(|e| NetworkError::BindFailed(e.to_string()))?;
    socket
        .bind(&addr.into())
        .map_err(|e| NetworkError::BindFailed(format!("{}: {}", addr, e)))?;

    Ok(socket.into())
}

/// Bind and register the socket with the tokio reactor
///
/// Must be called from within a tokio runtime.
pub fn bind_async(addr: SocketAddr, recv_buffer_size: usize) -> Result<tokio::net::UdpSocket, NetworkError> {
    let socket = create_socket(addr, recv_buffer_size)?;
    tokio::net::UdpSocket::from_std(socket).map_err(|e| NetworkError::BindFailed(e.to_string()))
}
