//! Client-side connection establishment with fallback across candidates.
//!
//! The candidate sequence is iterated in resolver order; the first endpoint
//! that both yields a socket and accepts the connection wins, and the rest
//! are not tried.  A socket whose connect attempt fails is dropped on the
//! spot, so no descriptor outlives its failed candidate.

use thiserror::Error;
use tokio::net::TcpStream;

use crate::resolver::{self, Endpoint, ResolveError, Role};
use crate::socket;

/// Client setup failure.  Fatal: propagated to the top-level exit point.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("unable to connect to any of {attempts} resolved endpoint(s)")]
    NoConnectableEndpoint { attempts: usize },
}

/// Try each candidate in order and return the first connected stream.
///
/// Per-candidate failures are logged with the endpoint address so partial
/// network failures stay diagnosable.
pub async fn connect(endpoints: &[Endpoint]) -> Result<TcpStream, ConnectError> {
    for endpoint in endpoints {
        let socket = match socket::create(endpoint) {
            Ok(socket) => socket,
            Err(e) => {
                log::warn!("[connector] socket creation for {endpoint} failed: {e}");
                continue;
            }
        };

        // `connect` consumes the socket; on failure it is dropped here and
        // the descriptor is closed before the next candidate is tried.
        match socket.connect(endpoint.addr).await {
            Ok(stream) => {
                log::debug!("[connector] connected to {endpoint}");
                return Ok(stream);
            }
            Err(e) => log::warn!("[connector] connect to {endpoint} failed: {e}"),
        }
    }

    Err(ConnectError::NoConnectableEndpoint {
        attempts: endpoints.len(),
    })
}

/// Resolve `host`/`port` and connect to the first reachable candidate.
pub async fn connect_to(host: &str, port: u16) -> Result<TcpStream, ConnectError> {
    let endpoints = resolver::resolve(Some(host), port, Role::Client).await?;
    connect(&endpoints).await
}
