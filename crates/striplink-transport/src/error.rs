use std::io;
use std::net::SocketAddr;

/// Errors that can occur in UDP transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind a local UDP socket.
    #[error("failed to bind udp socket at {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    /// Failed to connect the endpoint to a controller address.
    #[error("failed to connect to controller at {addr}: {source}")]
    Connect { addr: SocketAddr, source: io::Error },

    /// A datagram send failed.
    #[error("send to {peer} failed: {source}")]
    Send { peer: SocketAddr, source: io::Error },

    /// A datagram receive failed.
    #[error("receive failed: {0}")]
    Recv(io::Error),

    /// An I/O error occurred on the transport socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// True when the failure means the controller is currently unreachable
    /// (host unreachable, host down, network unreachable).
    ///
    /// Transient errors are recoverable by re-running discovery; the
    /// reconnection policy lives with the caller. Everything else is fatal.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Connect { source, .. } | TransportError::Send { source, .. } => {
                is_unreachable(source)
            }
            TransportError::Recv(source) | TransportError::Io(source) => is_unreachable(source),
            TransportError::Bind { .. } => false,
        }
    }
}

fn is_unreachable(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable
    ) {
        return true;
    }

    // EHOSTDOWN has no stable ErrorKind mapping.
    #[cfg(unix)]
    if err.raw_os_error() == Some(libc::EHOSTDOWN) {
        return true;
    }

    false
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn send_error(source: io::Error) -> TransportError {
        TransportError::Send {
            peer: "192.0.2.1:10000".parse().expect("addr should parse"),
            source,
        }
    }

    #[test]
    fn host_unreachable_is_transient() {
        let err = send_error(io::Error::from(io::ErrorKind::HostUnreachable));
        assert!(err.is_transient());
    }

    #[test]
    fn network_unreachable_is_transient() {
        let err = send_error(io::Error::from(io::ErrorKind::NetworkUnreachable));
        assert!(err.is_transient());
    }

    #[cfg(unix)]
    #[test]
    fn host_down_errno_is_transient() {
        let err = send_error(io::Error::from_raw_os_error(libc::EHOSTDOWN));
        assert!(err.is_transient());
    }

    #[test]
    fn connection_refused_is_fatal() {
        let err = send_error(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(!err.is_transient());
    }

    #[test]
    fn bind_failure_is_fatal() {
        let err = TransportError::Bind {
            addr: "0.0.0.0:10000".parse().expect("addr should parse"),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert!(!err.is_transient());
    }
}
