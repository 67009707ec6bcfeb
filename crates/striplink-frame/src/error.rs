/// Errors that can occur at the frame layer.
///
/// Malformed inbound datagrams are not errors: the discovery port is
/// untrusted and partial or foreign traffic is expected, so decoding reports
/// `None` and the packet is dropped.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A pixel index outside the strip was addressed.
    #[error("pixel index {index} out of range (strip has {len} pixels)")]
    PixelOutOfRange { index: u16, len: u16 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
