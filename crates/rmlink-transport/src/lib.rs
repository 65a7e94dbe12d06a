//! Network transport for RoboMaster links.
//!
//! This is the lowest layer of rmlink:
//! - TCP connection to the robot's control port, with one shared deadline for
//!   resolution and connect
//! - UDP discovery of robots announcing themselves on a shared network
//!
//! Everything above (framing, sessions) builds on the [`tokio::net::TcpStream`]
//! returned by [`connect`].

pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod tcp;

pub use discovery::{discover, parse_broadcast, Discovery, DiscoveryConfig};
pub use endpoint::{Endpoint, LinkMode, BROADCAST_PORT, CONTROL_PORT, DIRECT_CONNECT_IP};
pub use error::{Result, TransportError};
pub use tcp::{connect, resolve};
