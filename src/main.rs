//! Entry point for `tcp-chat`.
//!
//! Parses CLI arguments and dispatches into either **server** or **client**
//! mode.  All actual networking lives in library modules; `main.rs` owns
//! only process setup (logging, argument parsing) and the final exit
//! status: 0 on a disconnect-driven end of session, non-zero on usage or
//! setup failure.

use anyhow::Result;
use clap::{Parser, Subcommand};

use tcp_chat::config::{parse_port, BACKLOG, DEFAULT_PORT};
use tcp_chat::console;
use tcp_chat::peer::PeerConnection;

/// Two-party line chat over TCP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Listen for a single inbound connection.
    Server {
        /// Port to listen on.
        #[arg(short, long, value_parser = parse_port)]
        port: u16,
    },
    /// Connect to a listening peer.
    Client {
        /// Hostname or IP address of the peer.
        host: String,
        /// Port the peer is listening on.
        #[arg(short, long, default_value_t = DEFAULT_PORT, value_parser = parse_port)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let peer = match cli.mode {
        Mode::Server { port } => {
            log::info!("starting server on port {port}");
            PeerConnection::serve(port, BACKLOG).await?
        }
        Mode::Client { host, port } => {
            log::info!("connecting to {host}:{port}");
            PeerConnection::connect(&host, port).await?
        }
    };

    console::clear_screen();
    match peer.peer_addr() {
        Ok(addr) => println!("Connected to {addr}"),
        Err(_) => println!("Connected"),
    }

    let outcome = peer
        .into_session()
        .run(console::stdin_lines(), tokio::io::stdout())
        .await;
    println!("Session ended: {outcome}");

    // A blocking stdin read may still be pending after a peer-initiated
    // disconnect; exit here rather than wait for a final local line.
    std::process::exit(0);
}
