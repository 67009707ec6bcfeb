use bytes::{BufMut, BytesMut};

/// Magic bytes prefixing every packet of the protocol.
pub const MAGIC: [u8; 4] = [0x27, 0x1d, 0x0a, 0x3c];

/// A discovery request is the magic alone.
pub const DISCOVERY_REQUEST_LEN: usize = 4;

/// Magic (4) + unit id (1) + pixel count (2) + channel count (1).
pub const DISCOVERY_RESPONSE_LEN: usize = 8;

/// Encode a discovery request into `dst`.
pub fn encode_discovery_request(dst: &mut BytesMut) {
    dst.reserve(DISCOVERY_REQUEST_LEN);
    dst.put_slice(&MAGIC);
}

/// A controller's answer to a discovery request.
///
/// Wire format (multi-byte fields in network byte order):
/// ```text
/// ┌──────────────────────┬────────────┬──────────────────┬──────────────┐
/// │ Magic (4B)           │ UnitId     │ PixelCount       │ Channels     │
/// │ 0x27 0x1d 0x0a 0x3c  │ (1B)       │ (2B BE)          │ (1B)         │
/// └──────────────────────┴────────────┴──────────────────┴──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryResponse {
    /// Identifier the controller announces itself under.
    pub unit_id: u8,
    /// Number of addressable pixels on the strip.
    pub pixel_count: u16,
    /// Color channels per pixel (3 = RGB, 4 = RGB + dedicated white).
    pub channels: u8,
}

impl DiscoveryResponse {
    /// Decode a received datagram as a discovery response.
    ///
    /// Returns `None` unless the datagram is exactly
    /// [`DISCOVERY_RESPONSE_LEN`] bytes and opens with [`MAGIC`]. The port
    /// may carry unrelated or malformed traffic; a mismatch is a discard,
    /// not an error.
    pub fn decode(datagram: &[u8]) -> Option<Self> {
        if datagram.len() != DISCOVERY_RESPONSE_LEN || datagram[..4] != MAGIC {
            return None;
        }

        Some(Self {
            unit_id: datagram[4],
            pixel_count: u16::from_be_bytes([datagram[5], datagram[6]]),
            channels: datagram[7],
        })
    }

    /// Encode this response into `dst`.
    ///
    /// Client code never sends responses; this is the emulator/test half of
    /// the exchange.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(DISCOVERY_RESPONSE_LEN);
        dst.put_slice(&MAGIC);
        dst.put_u8(self.unit_id);
        dst.put_u16(self.pixel_count);
        dst.put_u8(self.channels);
    }
}
