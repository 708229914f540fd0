//! Per-candidate socket creation.
//!
//! Creation failures (resource exhaustion, unsupported family) are
//! non-fatal at this layer: the caller logs them and moves on to the next
//! candidate endpoint.

use tokio::net::TcpSocket;

use crate::resolver::Endpoint;

/// Open an unbound, unconnected socket matching the endpoint's family.
pub fn create(endpoint: &Endpoint) -> std::io::Result<TcpSocket> {
    if endpoint.addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_sockets_for_both_families() {
        let v4 = Endpoint::new("127.0.0.1:10000".parse().unwrap());
        let v6 = Endpoint::new("[::1]:10000".parse().unwrap());
        assert!(create(&v4).is_ok());
        assert!(create(&v6).is_ok());
    }
}
