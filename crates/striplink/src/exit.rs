use std::fmt;
use std::io;

use striplink_session::SessionError;
use striplink_transport::TransportError;

// Stable exit codes shared by every subcommand (sysexits-inspired).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Send { source, .. }
        | TransportError::Recv(source)
        | TransportError::Io(source) => io_error(context, source),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => CliError::new(USAGE, format!("{context}: {err}")),
        SessionError::Closed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_kind_maps_to_timeout_code() {
        let err = io_error("recv", io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn addr_in_use_maps_to_failure() {
        let err = transport_error(
            "bind",
            TransportError::Bind {
                addr: "0.0.0.0:10000".parse().expect("addr should parse"),
                source: io::Error::from(io::ErrorKind::AddrInUse),
            },
        );
        assert_eq!(err.code, FAILURE);
        assert!(err.message.starts_with("bind: "));
    }

    #[test]
    fn frame_misuse_maps_to_usage() {
        let err = session_error(
            "set pixel",
            SessionError::Frame(striplink_frame::FrameError::PixelOutOfRange {
                index: 10,
                len: 10,
            }),
        );
        assert_eq!(err.code, USAGE);
    }
}
