use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Well-known UDP port: controllers listen here for discovery requests, and
/// clients bind it to receive broadcast replies. The single constant is
/// consumed by both the listener bind and the broadcast send.
pub const DISCOVERY_PORT: u16 = 10000;

/// Broadcast-capable UDP socket used for controller discovery.
///
/// Created through `socket2` so SO_REUSEADDR (and SO_REUSEPORT where
/// available) can be set before binding: the discovery port is a fixed,
/// shared resource, and a co-resident emulated controller or a second client
/// on the same host must be able to bind it too.
#[derive(Debug)]
pub struct DiscoverySocket {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl DiscoverySocket {
    /// Bind the fixed discovery port on all IPv4 interfaces.
    pub fn bind_default() -> Result<Self> {
        Self::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, DISCOVERY_PORT)))
    }

    /// Bind an explicit local address with broadcast send enabled.
    ///
    /// Tests bind `127.0.0.1:0` and point discovery at a fake controller.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
            .map_err(|source| TransportError::Bind { addr, source })?;

        if let Err(err) = socket.set_reuse_address(true) {
            debug!(%addr, error = %err, "SO_REUSEADDR not applied");
        }
        #[cfg(not(windows))]
        if let Err(err) = socket.set_reuse_port(true) {
            debug!(%addr, error = %err, "SO_REUSEPORT not applied");
        }

        socket
            .bind(&addr.into())
            .map_err(|source| TransportError::Bind { addr, source })?;
        socket
            .set_broadcast(true)
            .map_err(|source| TransportError::Bind { addr, source })?;

        let socket: UdpSocket = socket.into();
        let local_addr = socket.local_addr()?;

        info!(%local_addr, "discovery socket bound");

        Ok(Self { socket, local_addr })
    }

    /// Receive one datagram (blocking, or until the read timeout elapses).
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).map_err(TransportError::Recv)
    }

    /// Send one datagram to `target` (broadcast addresses allowed).
    pub fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<()> {
        self.socket
            .send_to(payload, target)
            .map_err(|source| TransportError::Send {
                peer: target,
                source,
            })?;
        Ok(())
    }

    /// Set the receive timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout).map_err(Into::into)
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
