//! Role-parameterized connection setup.
//!
//! The send/receive/session logic is identical for both roles, so one
//! [`PeerConnection`] covers both; only the setup path differs — connect
//! for the client, listen+accept for the server.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpStream;

use crate::connector::{self, ConnectError};
use crate::listener::{self, ListenError};
use crate::resolver::Role;
use crate::session::DuplexSession;

/// Any fatal setup failure, unified for the top-level exit point.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Listen(#[from] ListenError),
}

/// An established connection plus the role that produced it.
pub struct PeerConnection {
    stream: TcpStream,
    role: Role,
}

impl PeerConnection {
    /// Client setup: resolve `host` and connect to the first reachable
    /// candidate.
    pub async fn connect(host: &str, port: u16) -> Result<Self, SetupError> {
        let stream = connector::connect_to(host, port).await?;
        Ok(Self {
            stream,
            role: Role::Client,
        })
    }

    /// Server setup: listen on `port` and accept exactly one connection.
    pub async fn serve(port: u16, backlog: u32) -> Result<Self, SetupError> {
        let stream = listener::listen_and_accept(port, backlog).await?;
        Ok(Self {
            stream,
            role: Role::Server,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Hand the stream to the duplex loop; the session owns it from here.
    pub fn into_session(self) -> DuplexSession {
        DuplexSession::new(self.stream, self.role)
    }
}
