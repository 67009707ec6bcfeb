//! Controller discovery and connected strip sessions.
//!
//! This is the "just works" layer of striplink. A process starts one
//! [`DiscoveryListener`] (a dedicated background receive thread on the
//! shared discovery socket), then calls [`discover`] to locate a controller
//! and obtain a connected [`StripSession`] for it.
//!
//! The listener is an explicit value, not a hidden global: construct it once
//! at startup and pass it to every `discover` call. Tests construct their
//! own on an ephemeral loopback port.

pub mod discover;
pub mod error;
pub mod listener;
pub mod session;

pub use discover::{discover, discover_with_retry, RETRY_INTERVAL};
pub use error::{Result, SessionError};
pub use listener::{DiscoveryListener, ListenerConfig, Subscription};
pub use session::StripSession;
