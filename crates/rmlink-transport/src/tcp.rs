use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};

/// Resolve an endpoint to socket addresses.
pub async fn resolve(endpoint: &Endpoint) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((endpoint.host(), endpoint.port()))
        .await
        .map_err(|source| TransportError::Resolve {
            host: endpoint.host().to_string(),
            port: endpoint.port(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(TransportError::NoAddress {
            host: endpoint.host().to_string(),
            port: endpoint.port(),
        });
    }
    Ok(addrs)
}

/// Connect to the robot's control port.
///
/// Resolution and every connection attempt share one deadline. Addresses are
/// tried in resolver order; the last failure is reported.
pub async fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream> {
    let stream = tokio::time::timeout(timeout, connect_any(endpoint))
        .await
        .map_err(|_| TransportError::Timeout(timeout))??;

    if let Err(err) = stream.set_nodelay(true) {
        warn!(error = %err, "set TCP_NODELAY failed");
    }
    Ok(stream)
}

async fn connect_any(endpoint: &Endpoint) -> Result<TcpStream> {
    let addrs = resolve(endpoint).await?;
    let mut last_err = None;

    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!(%addr, mode = %endpoint.mode(), "connected to control port");
                return Ok(stream);
            }
            Err(source) => {
                debug!(%addr, error = %source, "connect attempt failed");
                last_err = Some(TransportError::Connect { addr, source });
            }
        }
    }

    Err(last_err.unwrap_or_else(|| TransportError::NoAddress {
        host: endpoint.host().to_string(),
        port: endpoint.port(),
    }))
}
