//! Server-side setup: bind a passive address, listen, accept one peer.
//!
//! Each step is its own failure point:
//! 1. resolve passive endpoints,
//! 2. create a socket from the first creatable endpoint (no connect attempt),
//! 3. bind — on `AddrInUse` (typically a recently-closed prior instance in
//!    TIME_WAIT) enable `SO_REUSEADDR` and retry the bind exactly once,
//! 4. mark listening with the configured backlog,
//! 5. block until one inbound connection arrives and accept it.
//!
//! The accepted stream is distinct from the listening socket; the listening
//! socket stays open but is not reused — this design handles one accepted
//! connection per [`listen_and_accept`] invocation.  A second client
//! connecting while a session is active is queued up to the backlog, not
//! accepted.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::resolver::{self, Endpoint, ResolveError, Role};
use crate::socket;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Server setup failure.  All variants are fatal: propagated to the
/// top-level exit point, with no retry beyond the single bind retry below.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("no endpoint yielded a usable socket")]
    NoUsableEndpoint,
    #[error("bind to {addr} failed: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("listen on {addr} failed: {source}")]
    Listen { addr: SocketAddr, source: io::Error },
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// A bound, listening socket waiting for its single peer.
///
/// Split from [`accept_one`](Listener::accept_one) so the bound local
/// address is observable before accepting (port 0 binds resolve to an
/// OS-assigned port).
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Resolve, create, bind (with reuse recovery) and listen on `port`.
    pub async fn bind(port: u16, backlog: u32) -> Result<Self, ListenError> {
        let endpoints = resolver::resolve(None, port, Role::Server).await?;
        let (socket, endpoint) = first_usable(&endpoints)?;

        bind_with_reuse_retry(&socket, endpoint.addr)?;

        let inner = socket.listen(backlog).map_err(|e| ListenError::Listen {
            addr: endpoint.addr,
            source: e,
        })?;
        if let Ok(local) = inner.local_addr() {
            log::info!("[listener] listening on {local}");
        }
        Ok(Self { inner })
    }

    /// Address the listening socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Block until one inbound connection arrives and accept it.
    pub async fn accept_one(&self) -> Result<TcpStream, ListenError> {
        let (stream, peer) = self.inner.accept().await.map_err(ListenError::Accept)?;
        log::info!("[listener] accepted connection from {peer}");
        Ok(stream)
    }
}

/// One-shot composition: bind, listen, accept exactly one connection.
pub async fn listen_and_accept(port: u16, backlog: u32) -> Result<TcpStream, ListenError> {
    let listener = Listener::bind(port, backlog).await?;
    listener.accept_one().await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First endpoint that yields a socket wins; creation failures are logged
/// and the next candidate is tried.
fn first_usable(endpoints: &[Endpoint]) -> Result<(TcpSocket, &Endpoint), ListenError> {
    for endpoint in endpoints {
        match socket::create(endpoint) {
            Ok(socket) => return Ok((socket, endpoint)),
            Err(e) => log::warn!("[listener] socket creation for {endpoint} failed: {e}"),
        }
    }
    Err(ListenError::NoUsableEndpoint)
}

/// Bind, retrying exactly once with `SO_REUSEADDR` when the address is in
/// use.  Any other failure, or a failed retry, is fatal.
fn bind_with_reuse_retry(socket: &TcpSocket, addr: SocketAddr) -> Result<(), ListenError> {
    match socket.bind(addr) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            log::warn!("[listener] {addr} in use; retrying with SO_REUSEADDR");
            socket
                .set_reuseaddr(true)
                .and_then(|()| socket.bind(addr))
                .map_err(|e| ListenError::Bind { addr, source: e })
        }
        Err(e) => Err(ListenError::Bind { addr, source: e }),
    }
}
