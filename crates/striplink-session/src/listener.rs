use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use striplink_frame::encode_discovery_request;
use striplink_transport::{DiscoverySocket, DISCOVERY_PORT};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Largest datagram the receive loop will accept. Discovery responses are 8
/// bytes; the rest of this budget absorbs foreign traffic on the shared port.
const MAX_DATAGRAM: usize = 4096;

/// Callback invoked for every datagram the listener receives.
type PacketHandler = Arc<dyn Fn(&[u8], SocketAddr) + Send + Sync>;

struct HandlerEntry {
    id: u64,
    handler: PacketHandler,
}

type HandlerSet = Arc<Mutex<Vec<HandlerEntry>>>;

/// Addresses the listener binds and broadcasts to.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Local bind address. The default is the fixed discovery port on all
    /// interfaces, so broadcast-only controller replies are receivable.
    pub bind_addr: SocketAddr,
    /// Where discovery requests are sent.
    pub discovery_addr: SocketAddr,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: (Ipv4Addr::UNSPECIFIED, DISCOVERY_PORT).into(),
            discovery_addr: (Ipv4Addr::BROADCAST, DISCOVERY_PORT).into(),
        }
    }
}

/// Process-wide background receiver for discovery traffic.
///
/// Owns the broadcast-enabled socket and a dedicated receive thread that
/// runs for the life of the process: block on receive, snapshot the
/// registered handler set, invoke every handler with the datagram, loop.
/// There is no teardown; one listener per process, constructed explicitly
/// and passed to callers (and replaceable by a fake in tests).
pub struct DiscoveryListener {
    socket: Arc<DiscoverySocket>,
    discovery_addr: SocketAddr,
    handlers: HandlerSet,
    next_id: AtomicU64,
}

impl DiscoveryListener {
    /// Start a listener on the default discovery addresses.
    pub fn spawn() -> Result<Self> {
        Self::spawn_with_config(ListenerConfig::default())
    }

    /// Start a listener with explicit addresses and launch its receive
    /// thread.
    pub fn spawn_with_config(config: ListenerConfig) -> Result<Self> {
        let socket = Arc::new(DiscoverySocket::bind(config.bind_addr)?);
        let handlers: HandlerSet = Arc::new(Mutex::new(Vec::new()));

        {
            let socket = Arc::clone(&socket);
            let handlers = Arc::clone(&handlers);
            thread::Builder::new()
                .name("striplink-discovery".to_string())
                .spawn(move || receive_loop(&socket, &handlers))
                .map_err(striplink_transport::TransportError::Io)?;
        }

        info!(addr = %socket.local_addr(), "discovery listener started");

        Ok(Self {
            socket,
            discovery_addr: config.discovery_addr,
            handlers,
            next_id: AtomicU64::new(1),
        })
    }

    /// Register a handler for every subsequently received datagram.
    ///
    /// Handlers run inline on the sole receive path and MUST NOT block or do
    /// long-running work: push into a queue and return. A handler registered
    /// while a delivery is in flight is not guaranteed to see the datagram
    /// already snapshotted for that delivery.
    ///
    /// Deregistration is the returned guard's `Drop`, which makes it happen
    /// on every exit path of the subscribing scope.
    pub fn subscribe(
        &self,
        handler: impl Fn(&[u8], SocketAddr) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock_handlers(&self.handlers).push(HandlerEntry {
            id,
            handler: Arc::new(handler),
        });
        debug!(id, "discovery handler subscribed");

        Subscription {
            handlers: Arc::clone(&self.handlers),
            id,
        }
    }

    /// Broadcast one discovery request to the configured discovery address.
    pub fn broadcast_request(&self) -> Result<()> {
        let mut request = BytesMut::new();
        encode_discovery_request(&mut request);
        self.socket.send_to(&request, self.discovery_addr)?;
        debug!(target = %self.discovery_addr, "discovery request broadcast");
        Ok(())
    }

    /// The address the listener's socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }
}

fn receive_loop(socket: &DiscoverySocket, handlers: &HandlerSet) {
    let mut buf = [0u8; MAX_DATAGRAM];

    loop {
        match socket.recv_from(&mut buf) {
            Ok((len, source)) => {
                // Snapshot under the lock, invoke outside it: a slow handler
                // must never hold up registration, and registration must
                // never hold up delivery.
                let snapshot: Vec<PacketHandler> = lock_handlers(handlers)
                    .iter()
                    .map(|entry| Arc::clone(&entry.handler))
                    .collect();

                for handler in snapshot {
                    handler(&buf[..len], source);
                }
            }
            Err(err) => {
                warn!(error = %err, "discovery receive failed");
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

fn lock_handlers(handlers: &HandlerSet) -> std::sync::MutexGuard<'_, Vec<HandlerEntry>> {
    handlers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// RAII registration guard returned by [`DiscoveryListener::subscribe`].
pub struct Subscription {
    handlers: HandlerSet,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        lock_handlers(&self.handlers).retain(|entry| entry.id != self.id);
        debug!(id = self.id, "discovery handler unsubscribed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use striplink_frame::MAGIC;

    use super::*;

    fn loopback_listener() -> DiscoveryListener {
        DiscoveryListener::spawn_with_config(ListenerConfig {
            bind_addr: "127.0.0.1:0".parse().expect("addr should parse"),
            discovery_addr: "127.0.0.1:9".parse().expect("addr should parse"),
        })
        .expect("listener should spawn")
    }

    fn loopback_peer() -> DiscoverySocket {
        DiscoverySocket::bind("127.0.0.1:0".parse().expect("addr should parse"))
            .expect("peer socket should bind")
    }

    #[test]
    fn fan_out_delivers_to_each_handler_once() {
        let listener = loopback_listener();
        let peer = loopback_peer();

        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        let _sub_a = listener.subscribe(move |payload, _| {
            let _ = tx_a.send(payload.to_vec());
        });
        let _sub_b = listener.subscribe(move |payload, _| {
            let _ = tx_b.send(payload.to_vec());
        });

        peer.send_to(b"one", listener.local_addr())
            .expect("send should succeed");

        let got_a = rx_a
            .recv_timeout(Duration::from_secs(2))
            .expect("handler a should see the datagram");
        let got_b = rx_b
            .recv_timeout(Duration::from_secs(2))
            .expect("handler b should see the datagram");
        assert_eq!(got_a, b"one");
        assert_eq!(got_b, b"one");

        // Exactly once per handler.
        assert!(rx_a.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(rx_b.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let listener = loopback_listener();
        let peer = loopback_peer();

        let (tx_kept, rx_kept) = mpsc::channel();
        let (tx_dropped, rx_dropped) = mpsc::channel();
        let _kept = listener.subscribe(move |payload, _| {
            let _ = tx_kept.send(payload.to_vec());
        });
        let dropped = listener.subscribe(move |payload, _| {
            let _ = tx_dropped.send(payload.to_vec());
        });

        peer.send_to(b"first", listener.local_addr())
            .expect("send should succeed");
        rx_kept
            .recv_timeout(Duration::from_secs(2))
            .expect("kept handler should see first datagram");
        rx_dropped
            .recv_timeout(Duration::from_secs(2))
            .expect("doomed handler should see first datagram");

        drop(dropped);

        peer.send_to(b"second", listener.local_addr())
            .expect("send should succeed");
        // The kept handler fences delivery of the second datagram.
        rx_kept
            .recv_timeout(Duration::from_secs(2))
            .expect("kept handler should see second datagram");
        assert!(rx_dropped.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn broadcast_request_sends_magic() {
        let receiver = loopback_peer();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("timeout should apply");

        let listener = DiscoveryListener::spawn_with_config(ListenerConfig {
            bind_addr: "127.0.0.1:0".parse().expect("addr should parse"),
            discovery_addr: receiver.local_addr(),
        })
        .expect("listener should spawn");

        listener.broadcast_request().expect("broadcast should send");

        let mut buf = [0u8; 16];
        let (len, _) = receiver.recv_from(&mut buf).expect("request should arrive");
        assert_eq!(&buf[..len], &MAGIC);
    }

    #[test]
    fn handlers_see_source_address() {
        let listener = loopback_listener();
        let peer = loopback_peer();

        let (tx, rx) = mpsc::channel();
        let _sub = listener.subscribe(move |_, source| {
            let _ = tx.send(source);
        });

        peer.send_to(b"hello", listener.local_addr())
            .expect("send should succeed");

        let source = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("handler should run");
        assert_eq!(source.port(), peer.local_addr().port());
    }
}
