//! Robot discovery over UDP broadcast.
//!
//! In networked mode the robot periodically broadcasts `robot ip <addr>;` on
//! [`BROADCAST_PORT`]. Listening for one such datagram is enough to build an
//! [`Endpoint`] for the control connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::endpoint::{Endpoint, BROADCAST_PORT};
use crate::error::{Result, TransportError};

const MAX_BROADCAST_LEN: usize = 256;

/// Configuration for discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Local address to listen on. Default: `0.0.0.0:40926`.
    pub bind_addr: SocketAddr,
    /// How long to wait for an announcement. Default: 10s.
    pub timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), BROADCAST_PORT),
            timeout: Duration::from_secs(10),
        }
    }
}

/// A bound discovery listener.
#[derive(Debug)]
pub struct Discovery {
    socket: UdpSocket,
}

impl Discovery {
    /// Bind the listening socket.
    pub async fn bind(config: &DiscoveryConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        debug!(addr = %config.bind_addr, "listening for robot broadcasts");
        Ok(Self { socket })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Wait for the next valid announcement.
    ///
    /// Datagrams that do not parse are logged and skipped.
    pub async fn recv_endpoint(&self, timeout: Duration) -> Result<Endpoint> {
        tokio::time::timeout(timeout, self.recv_loop())
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
    }

    async fn recv_loop(&self) -> Result<Endpoint> {
        let mut buf = [0u8; MAX_BROADCAST_LEN];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            match parse_broadcast(&buf[..len]) {
                Ok(ip) => {
                    debug!(%from, %ip, "robot announced itself");
                    return Ok(Endpoint::for_host(ip.to_string()));
                }
                Err(err) => warn!(%from, error = %err, "ignoring datagram"),
            }
        }
    }
}

/// Listen once with the given configuration.
pub async fn discover(config: &DiscoveryConfig) -> Result<Endpoint> {
    Discovery::bind(config)
        .await?
        .recv_endpoint(config.timeout)
        .await
}

/// Parse a `robot ip <addr>;` announcement.
pub fn parse_broadcast(datagram: &[u8]) -> Result<IpAddr> {
    let text = std::str::from_utf8(datagram)
        .map_err(|_| TransportError::InvalidBroadcast("not utf-8".to_string()))?;
    let text = text.trim().trim_end_matches(';');

    let mut tokens = text.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
        (Some("robot"), Some("ip"), Some(addr), None) => addr
            .parse()
            .map_err(|_| TransportError::InvalidBroadcast(format!("bad address '{addr}'"))),
        _ => Err(TransportError::InvalidBroadcast(format!("unexpected '{text}'"))),
    }
}
