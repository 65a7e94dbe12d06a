//! Connection endpoints and well-known addresses.

use std::fmt;

/// Robot address when the host is joined to the robot's own access point.
pub const DIRECT_CONNECT_IP: &str = "192.168.2.1";

/// TCP port of the robot's command/control service.
pub const CONTROL_PORT: u16 = 40923;

/// UDP port on which the robot announces its address in networked mode.
pub const BROADCAST_PORT: u16 = 40926;

/// How the host reaches the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkMode {
    /// Host is connected straight to the robot's Wi-Fi access point.
    Direct,
    /// Robot and host share another network (router / relay).
    Networked,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkMode::Direct => f.write_str("direct"),
            LinkMode::Networked => f.write_str("networked"),
        }
    }
}

/// Transport address and link mode of one robot.
///
/// Endpoints are plain values; a session copies its endpoint when it opens
/// and never changes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
    mode: LinkMode,
}

impl Endpoint {
    /// Create an endpoint from explicit parts.
    pub fn new(host: impl Into<String>, port: u16, mode: LinkMode) -> Self {
        Self {
            host: host.into(),
            port,
            mode,
        }
    }

    /// The fixed direct-connect endpoint (`192.168.2.1:40923`).
    pub fn direct() -> Self {
        Self::new(DIRECT_CONNECT_IP, CONTROL_PORT, LinkMode::Direct)
    }

    /// A robot reachable on a shared network at `host`.
    pub fn networked(host: impl Into<String>) -> Self {
        Self::new(host, CONTROL_PORT, LinkMode::Networked)
    }

    /// Build an endpoint for `host`, inferring the link mode from the address.
    pub fn for_host(host: impl Into<String>) -> Self {
        let host = host.into();
        if host == DIRECT_CONNECT_IP {
            Self::direct()
        } else {
            Self::networked(host)
        }
    }

    /// Override the control port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::direct()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.host, self.port, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_uses_well_known_address() {
        let endpoint = Endpoint::direct();
        assert_eq!(endpoint.host(), DIRECT_CONNECT_IP);
        assert_eq!(endpoint.port(), CONTROL_PORT);
        assert_eq!(endpoint.mode(), LinkMode::Direct);
        assert_eq!(Endpoint::default(), endpoint);
    }

    #[test]
    fn for_host_infers_link_mode() {
        assert_eq!(Endpoint::for_host("192.168.2.1").mode(), LinkMode::Direct);
        let networked = Endpoint::for_host("10.0.0.7");
        assert_eq!(networked.mode(), LinkMode::Networked);
        assert_eq!(networked.port(), CONTROL_PORT);
    }

    #[test]
    fn with_port_keeps_host_and_mode() {
        let endpoint = Endpoint::networked("127.0.0.1").with_port(5555);
        assert_eq!(endpoint.host(), "127.0.0.1");
        assert_eq!(endpoint.port(), 5555);
        assert_eq!(endpoint.mode(), LinkMode::Networked);
    }

    #[test]
    fn display_includes_mode() {
        assert_eq!(
            Endpoint::direct().to_string(),
            "192.168.2.1:40923 (direct)"
        );
    }
}
