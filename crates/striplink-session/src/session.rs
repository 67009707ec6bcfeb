use std::fmt;
use std::net::SocketAddr;

use striplink_frame::{DiscoveryResponse, PixelBuffer};
use striplink_transport::ControllerEndpoint;
use tracing::debug;

use crate::error::{Result, SessionError};

/// Connected handle for one discovered strip.
///
/// Owns the mutable pixel buffer and the point-to-point endpoint. Pixel
/// mutation is purely local; [`show`] transmits the whole buffer as one
/// frame. There is no internal synchronization: a session belongs to one
/// caller at a time, with external locking if it must be shared.
///
/// Sessions are created only by a successful discovery exchange. When a
/// controller disappears (a transient transport error from [`show`]), the
/// caller closes the stale session and re-runs discovery with the same unit
/// id; the replacement starts with an all-zero buffer sized from the fresh
/// response, so buffer state is never carried over.
///
/// [`show`]: StripSession::show
pub struct StripSession {
    unit_id: u8,
    channels: u8,
    buffer: PixelBuffer,
    endpoint: Option<ControllerEndpoint>,
}

impl StripSession {
    pub(crate) fn new(response: DiscoveryResponse, endpoint: ControllerEndpoint) -> Self {
        Self {
            unit_id: response.unit_id,
            channels: response.channels,
            buffer: PixelBuffer::new(response.pixel_count),
            endpoint: Some(endpoint),
        }
    }

    /// Set one pixel in the owned buffer. No wire I/O.
    pub fn set_pixel_color(&mut self, index: u16, r: u8, g: u8, b: u8, w: u8) -> Result<()> {
        self.buffer.set_pixel(index, r, g, b, w, self.channels)?;
        Ok(())
    }

    /// [`set_pixel_color`] without a white component.
    ///
    /// [`set_pixel_color`]: StripSession::set_pixel_color
    pub fn set_pixel_rgb(&mut self, index: u16, r: u8, g: u8, b: u8) -> Result<()> {
        self.set_pixel_color(index, r, g, b, 0)
    }

    /// Transmit the entire current buffer as one frame.
    ///
    /// A send failure is surfaced, not retried: check
    /// [`SessionError::is_transient`] to decide between re-running discovery
    /// and giving up.
    pub fn show(&mut self) -> Result<()> {
        let endpoint = self.endpoint.as_ref().ok_or(SessionError::Closed)?;
        endpoint.send(self.buffer.as_bytes())?;
        Ok(())
    }

    /// Zero every pixel without transmitting.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Release the endpoint. Idempotent; a closed session keeps its buffer
    /// readable but can no longer transmit.
    pub fn close(&mut self) {
        if let Some(endpoint) = self.endpoint.take() {
            debug!(unit = self.unit_id, peer = %endpoint.peer_addr(), "session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.endpoint.is_none()
    }

    /// Unit identifier the controller announced itself under.
    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Color channels per pixel (3 = RGB, 4 = RGB + dedicated white).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Number of addressable pixels.
    pub fn len(&self) -> u16 {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Controller address, while the session is open.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.endpoint.as_ref().map(ControllerEndpoint::peer_addr)
    }

    /// The owned frame buffer.
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }
}

impl fmt::Display for StripSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "strip unit {} ({} pixels, {} channels)",
            self.unit_id,
            self.len(),
            self.channels
        )
    }
}
