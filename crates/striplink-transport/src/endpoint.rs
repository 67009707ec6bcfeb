use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use tracing::debug;

use crate::error::{Result, TransportError};

/// Connected point-to-point UDP endpoint for one controller session.
///
/// Bound to an ephemeral local port and connected to the controller address
/// learned from its discovery response. Connecting pins the destination so
/// sends are a plain `send`, and lets the OS report ICMP unreachability back
/// as a send error instead of dropping it silently.
#[derive(Debug)]
pub struct ControllerEndpoint {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl ControllerEndpoint {
    /// Open an endpoint to the controller at `peer`.
    pub fn connect(peer: SocketAddr) -> Result<Self> {
        let bind_addr: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind_addr).map_err(|source| TransportError::Bind {
            addr: bind_addr,
            source,
        })?;
        socket
            .connect(peer)
            .map_err(|source| TransportError::Connect { addr: peer, source })?;

        debug!(%peer, "controller endpoint connected");

        Ok(Self { socket, peer })
    }

    /// Send one datagram to the connected controller.
    ///
    /// Delivery is not guaranteed; the protocol relies on the next frame to
    /// self-correct display state.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        self.socket
            .send(payload)
            .map_err(|source| TransportError::Send {
                peer: self.peer,
                source,
            })?;
        Ok(())
    }

    /// The controller address this endpoint is connected to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn connect_and_send_delivers_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").expect("receiver should bind");
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("timeout should apply");
        let peer = receiver.local_addr().expect("receiver addr");

        let endpoint = ControllerEndpoint::connect(peer).expect("endpoint should connect");
        assert_eq!(endpoint.peer_addr(), peer);

        endpoint.send(b"frame").expect("send should succeed");

        let mut buf = [0u8; 16];
        let (len, _) = receiver.recv_from(&mut buf).expect("recv should succeed");
        assert_eq!(&buf[..len], b"frame");
    }

    #[test]
    fn send_after_peer_gone_reports_send_error() {
        let receiver = UdpSocket::bind("127.0.0.1:0").expect("receiver should bind");
        let peer = receiver.local_addr().expect("receiver addr");
        let endpoint = ControllerEndpoint::connect(peer).expect("endpoint should connect");
        drop(receiver);

        // The first send may still succeed; the ICMP port-unreachable error
        // surfaces on a subsequent one. Either way no panic, and any error is
        // a Send with the peer recorded.
        for _ in 0..3 {
            if let Err(err) = endpoint.send(b"frame") {
                match err {
                    TransportError::Send { peer: reported, .. } => assert_eq!(reported, peer),
                    other => panic!("unexpected error variant: {other:?}"),
                }
                return;
            }
        }
    }
}
