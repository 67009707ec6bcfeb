//! Wire codec and pixel buffer for the striplink protocol.
//!
//! Every packet of the protocol opens with the same 4-byte magic so foreign
//! broadcast traffic sharing the port can be rejected cheaply:
//! - Discovery request: magic alone (4 bytes)
//! - Discovery response: magic + unit id + pixel count (big-endian) +
//!   channel count (8 bytes)
//! - Pixel frame: magic + N × [R, G, B, W-or-unused]
//!
//! The pixel frame is never built per send: [`PixelBuffer`] keeps the full
//! authoritative display state in wire form, so transmitting a frame is one
//! datagram send of the buffer as-is.

pub mod codec;
pub mod error;
pub mod pixel;

pub use codec::{
    encode_discovery_request, DiscoveryResponse, DISCOVERY_REQUEST_LEN, DISCOVERY_RESPONSE_LEN,
    MAGIC,
};
pub use error::{FrameError, Result};
pub use pixel::{PixelBuffer, BYTES_PER_PIXEL, FRAME_HEADER_LEN};
