//! `tcp-chat` — a minimal bidirectional text chat over TCP.
//!
//! One process listens and accepts a single inbound connection (server
//! role), the other resolves a hostname and connects (client role).  Once
//! connected both ends are symmetric: lines typed locally are sent to the
//! peer, lines received from the peer are printed with a `From server:` /
//! `From client:` prefix, until either side closes the connection.
//!
//! # Architecture
//!
//! ```text
//!                 ┌────────────┐ host, port  ┌────────────┐
//!                 │ Connector  │◀────────────│    CLI     │────────────┐
//!                 └─────┬──────┘             └────────────┘            │
//!                       │ candidates                             port  │
//!                 ┌─────▼──────┐            ┌────────────┐      ┌──────▼─────┐
//!                 │  resolver  │───────────▶│   socket   │◀─────│  Listener  │
//!                 └────────────┘  Endpoint  └────────────┘      └──────┬─────┘
//!                                                                      │
//!   connected TcpStream (from either setup path)                       │
//!       ┌──────────────────────────────────────────────────────────────┘
//!       ▼
//!  ┌──────────────────────────────────────┐
//!  │            DuplexSession             │
//!  │  receiver task ◀── TerminationSignal │
//!  │  sender loop   ◀──────┘              │
//!  └──────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`config`]    — fixed tuning constants (buffer size, default port, backlog)
//! - [`resolver`]  — (hostname, port, role) → ordered candidate [`resolver::Endpoint`]s
//! - [`socket`]    — per-candidate socket creation
//! - [`connector`] — client setup: first-success-wins iteration over candidates
//! - [`listener`]  — server setup: bind (with reuse recovery), listen, accept one
//! - [`session`]   — the concurrent duplex message loop
//! - [`console`]   — incoming-line formatting and local input collaborators
//! - [`peer`]      — role-parameterized glue between setup and session

pub mod config;
pub mod connector;
pub mod console;
pub mod listener;
pub mod peer;
pub mod resolver;
pub mod session;
pub mod socket;
