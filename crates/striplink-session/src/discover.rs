use std::net::SocketAddr;
use std::sync::mpsc;
use std::time::Duration;

use striplink_frame::DiscoveryResponse;
use striplink_transport::ControllerEndpoint;
use tracing::{debug, info};

use crate::error::Result;
use crate::listener::DiscoveryListener;
use crate::session::StripSession;

/// Cadence of discovery re-broadcasts: at most one request per second.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Locate a controller and return a connected session for it (blocking).
///
/// With `unit` set, responses from any other unit are ignored; with `None`,
/// the first well-formed responder wins.
pub fn discover(listener: &DiscoveryListener, unit: Option<u8>) -> Result<StripSession> {
    discover_with_retry(listener, unit, || {})
}

/// [`discover`], invoking `on_retry` once per elapsed [`RETRY_INTERVAL`]
/// before each re-broadcast. That bounds broadcast frequency and gives long
/// searches something to show (the CLI prints a progress dot per call).
///
/// There is no overall deadline: the loop runs until a matching controller
/// answers. Callers needing a bounded search impose it externally.
pub fn discover_with_retry(
    listener: &DiscoveryListener,
    unit: Option<u8>,
    mut on_retry: impl FnMut(),
) -> Result<StripSession> {
    let (tx, rx) = mpsc::channel::<(Vec<u8>, SocketAddr)>();

    // The guard keeps the handler registered (and `tx` alive) until this
    // function returns, on every exit path.
    let _subscription = listener.subscribe(move |payload, source| {
        let _ = tx.send((payload.to_vec(), source));
    });

    listener.broadcast_request()?;

    loop {
        match rx.recv_timeout(RETRY_INTERVAL) {
            Ok((payload, source)) => {
                let Some(response) = DiscoveryResponse::decode(&payload) else {
                    continue;
                };

                if let Some(want) = unit {
                    if want != response.unit_id {
                        debug!(
                            unit = response.unit_id,
                            want, "ignoring response from other unit"
                        );
                        continue;
                    }
                }

                info!(
                    unit = response.unit_id,
                    pixels = response.pixel_count,
                    channels = response.channels,
                    peer = %source,
                    "controller found"
                );

                let endpoint = ControllerEndpoint::connect(source)?;
                return Ok(StripSession::new(response, endpoint));
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                on_retry();
                listener.broadcast_request()?;
            }
            // Cannot occur while the subscription guard holds the sender;
            // nothing to do but wait again.
            Err(mpsc::RecvTimeoutError::Disconnected) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_cadence_is_one_second() {
        assert_eq!(RETRY_INTERVAL, Duration::from_secs(1));
    }
}
