/// Errors that can occur in discovery and session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] striplink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] striplink_frame::FrameError),

    /// The session was closed and can no longer transmit.
    #[error("session closed")]
    Closed,
}

impl SessionError {
    /// True when the underlying failure is controller unreachability.
    ///
    /// The caller-level reconnection policy consumes this tag: close the
    /// stale session and re-run discovery with the same unit id. Any other
    /// error is fatal.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Transport(err) if err.is_transient())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
