//! Address resolution: turn a `(hostname, port, role)` triple into an
//! ordered list of candidate endpoints.
//!
//! The returned order is significant — [`crate::connector`] and
//! [`crate::listener`] iterate it first-match-wins, so the resolver must
//! preserve the order the system resolver produced.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use thiserror::Error;
use tokio::net::lookup_host;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Which side of the chat this process plays.
///
/// The send/receive/session logic is identical for both roles; only the
/// setup path (connect vs. listen+accept) and the display prefix differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Resolves a target and connects.
    Client,
    /// Binds a passive address and accepts one connection.
    Server,
}

impl Role {
    /// Name of the remote side, used to prefix incoming lines.
    pub fn peer_label(&self) -> &'static str {
        match self {
            Role::Client => "server",
            Role::Server => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Server => write!(f, "server"),
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// One resolved candidate address.
///
/// Socket type and protocol are fixed (TCP stream); the address family is
/// implied by the address itself.  Endpoints are transient: they are freed
/// as soon as a connect/bind decision has been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: SocketAddr,
}

impl Endpoint {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Resolution failure.  Fatal to the calling role: propagated to the
/// top-level exit point, never retried internally.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot resolve {host}:{port}: {source}")]
    Lookup {
        host: String,
        port: u16,
        source: std::io::Error,
    },
    #[error("no usable addresses for {host}:{port}")]
    NoAddresses { host: String, port: u16 },
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

/// Resolve `host`/`port` into an ordered candidate sequence.
///
/// `host` may be `None` only for [`Role::Server`], meaning "any local
/// address": the candidates are then the unspecified IPv4 address followed
/// by the unspecified IPv6 address.  For a named host the system resolver's
/// ordering is preserved.
pub async fn resolve(
    host: Option<&str>,
    port: u16,
    role: Role,
) -> Result<Vec<Endpoint>, ResolveError> {
    let endpoints = match host {
        None => {
            debug_assert_eq!(role, Role::Server, "only the listening role may omit the host");
            vec![
                Endpoint::new(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)),
                Endpoint::new(SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)),
            ]
        }
        Some(host) => lookup_host((host, port))
            .await
            .map_err(|e| ResolveError::Lookup {
                host: host.to_string(),
                port,
                source: e,
            })?
            .map(Endpoint::new)
            .collect(),
    };

    if endpoints.is_empty() {
        return Err(ResolveError::NoAddresses {
            host: host.unwrap_or("<any>").to_string(),
            port,
        });
    }

    log::debug!(
        "[resolver] {} candidate(s) for {}:{} ({} role)",
        endpoints.len(),
        host.unwrap_or("<any>"),
        port,
        role
    );
    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_label_names_the_remote_side() {
        assert_eq!(Role::Client.peer_label(), "server");
        assert_eq!(Role::Server.peer_label(), "client");
    }

    #[tokio::test]
    async fn passive_candidates_are_v4_then_v6() {
        let eps = resolve(None, 10000, Role::Server).await.unwrap();
        assert_eq!(eps.len(), 2);
        assert!(eps[0].addr.is_ipv4());
        assert!(eps[1].addr.is_ipv6());
        assert_eq!(eps[0].addr.port(), 10000);
    }

    #[tokio::test]
    async fn literal_address_resolves_to_itself() {
        let eps = resolve(Some("127.0.0.1"), 15000, Role::Client).await.unwrap();
        assert_eq!(eps, vec![Endpoint::new("127.0.0.1:15000".parse().unwrap())]);
    }
}
