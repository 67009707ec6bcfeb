//! UDP transport layer for striplink.
//!
//! Two socket flavors, matching the two directions of the protocol:
//! - [`DiscoverySocket`]: a broadcast-capable socket bound to the shared
//!   discovery port, owned by the discovery listener.
//! - [`ControllerEndpoint`]: a connected point-to-point socket carrying
//!   pixel frames to one controller.
//!
//! This is the lowest layer of striplink. Everything else builds on top of
//! these two types and the [`TransportError`] taxonomy they report.

pub mod endpoint;
pub mod error;
pub mod socket;

pub use endpoint::ControllerEndpoint;
pub use error::{Result, TransportError};
pub use socket::{DiscoverySocket, DISCOVERY_PORT};
