//! The concurrent duplex message loop.
//!
//! A [`DuplexSession`] owns the connected stream and runs two execution
//! units until either side disconnects:
//!
//! - the **receiver**, a spawned task that owns the read half: reads up to
//!   [`BUFFER_SIZE`] bytes at a time and forwards each chunk, prefixed, to
//!   the display sink;
//! - the **sender**, the calling task, which owns the write half: reads one
//!   line at a time (capped at [`BUFFER_SIZE`] bytes) from the local input
//!   and transmits the filled portion.
//!
//! Both units multiplex their blocking I/O against a shared
//! [`TerminationSignal`] with `tokio::select!`.  Whichever unit detects
//! termination first — a zero-length read, a transfer error, or local input
//! running out — sets the signal; the other unit observes it and stops
//! within one loop iteration.  The control task joins the receiver before
//! returning, so the stream is dropped (and the socket closed) exactly
//! once, with no orphaned unit left behind.
//!
//! # Buffer contract
//!
//! Transfers are capped at [`BUFFER_SIZE`] bytes.  A line longer than the
//! cap is split across multiple transfers, and a received chunk is printed
//! as-is — near or over the limit, one transfer is not one logical line.
//! There is no framing beyond what fits in one transfer.
//!
//! # Termination ordering
//!
//! The loop condition is an OR across the two units: either unit ending
//! ends the whole session.  Send failures are terminal for the session, not
//! retried, and disconnection is the expected end of a session rather than
//! an error — the outcome is reported as a value, never by aborting the
//! process.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::BUFFER_SIZE;
use crate::console;
use crate::resolver::Role;

// ---------------------------------------------------------------------------
// TerminationSignal
// ---------------------------------------------------------------------------

/// Shared monotonic stop flag: set once, never reset.
///
/// Built on a single-shot `watch` channel so a unit blocked on I/O can
/// select on [`TerminationWatcher::triggered`] instead of polling.
#[derive(Debug, Clone)]
pub struct TerminationSignal {
    tx: watch::Sender<bool>,
}

impl TerminationSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Flip the flag.  Idempotent; false→true is the only transition.
    pub fn set(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// A waitable view for use inside `select!`.
    pub fn watcher(&self) -> TerminationWatcher {
        TerminationWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for TerminationSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side of a [`TerminationSignal`].
#[derive(Debug)]
pub struct TerminationWatcher {
    rx: watch::Receiver<bool>,
}

impl TerminationWatcher {
    /// Resolve once the signal is set (immediately if it already is).
    pub async fn triggered(&mut self) {
        // The sender lives inside TerminationSignal; if every signal handle
        // is gone the session is unwinding anyway, so a closed channel also
        // resolves.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

// ---------------------------------------------------------------------------
// SessionOutcome
// ---------------------------------------------------------------------------

/// How the session ended.  Both outcomes are normal end-of-session
/// conditions, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The peer closed the connection, or a transfer failed mid-stream.
    PeerClosed,
    /// The local input source reached end-of-input.
    LocalInputEnded,
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionOutcome::PeerClosed => write!(f, "peer disconnected"),
            SessionOutcome::LocalInputEnded => write!(f, "local input ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// DuplexSession
// ---------------------------------------------------------------------------

/// Owns the connected stream from session start until both units have
/// exited.
pub struct DuplexSession {
    stream: TcpStream,
    role: Role,
}

impl DuplexSession {
    pub fn new(stream: TcpStream, role: Role) -> Self {
        Self { stream, role }
    }

    /// Run the duplex loop until either side disconnects.
    ///
    /// `input` is the local line source (stdin in the binary), `output` the
    /// display sink for incoming lines (stdout in the binary).  Returns the
    /// terminating condition; transfer errors are folded into it after
    /// being logged, since there is no in-session recovery.
    pub async fn run<I, O>(self, input: I, output: O) -> SessionOutcome
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin + Send + 'static,
    {
        let role = self.role;
        let (read_half, write_half) = self.stream.into_split();
        let signal = TerminationSignal::new();

        let receiver = tokio::spawn(receive_loop(read_half, output, signal.clone(), role));
        let (sent_outcome, bytes_out) = send_loop(write_half, input, signal).await;

        // The write half is gone and the signal is set; wait for the
        // receiver so the socket is fully released before returning.
        let (recv_outcome, bytes_in) = match receiver.await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("[session] receiver task failed: {e}");
                (None, 0)
            }
        };

        let outcome = sent_outcome
            .or(recv_outcome)
            .unwrap_or(SessionOutcome::PeerClosed);
        log::info!("[session] closed: {outcome} ({bytes_out} B out, {bytes_in} B in)");
        outcome
    }
}

// ---------------------------------------------------------------------------
// Receiver unit
// ---------------------------------------------------------------------------

/// Read chunks from the peer and forward them to the display sink.
///
/// Returns `Some(outcome)` when this unit detected termination itself,
/// `None` when it stopped because the signal was already set, plus the
/// number of bytes received.
async fn receive_loop<O>(
    mut reader: OwnedReadHalf,
    mut output: O,
    signal: TerminationSignal,
    role: Role,
) -> (Option<SessionOutcome>, u64)
where
    O: AsyncWrite + Unpin,
{
    let mut watcher = signal.watcher();
    let mut buf = [0u8; BUFFER_SIZE];
    let mut received: u64 = 0;

    loop {
        let n = tokio::select! {
            result = reader.read(&mut buf) => match result {
                Ok(0) => {
                    log::debug!("[session] peer closed the connection");
                    signal.set();
                    return (Some(SessionOutcome::PeerClosed), received);
                }
                Ok(n) => n,
                Err(e) => {
                    log::warn!("[session] receive failed: {e}");
                    signal.set();
                    return (Some(SessionOutcome::PeerClosed), received);
                }
            },
            _ = watcher.triggered() => return (None, received),
        };

        received += n as u64;
        let line = console::format_incoming(role, &buf[..n]);
        if let Err(e) = write_line(&mut output, line.as_bytes()).await {
            log::warn!("[session] display sink failed: {e}");
            signal.set();
            return (Some(SessionOutcome::PeerClosed), received);
        }
    }
}

async fn write_line<O>(output: &mut O, line: &[u8]) -> io::Result<()>
where
    O: AsyncWrite + Unpin,
{
    output.write_all(line).await?;
    output.flush().await
}

// ---------------------------------------------------------------------------
// Sender unit
// ---------------------------------------------------------------------------

/// Read capped lines from the local input and transmit them to the peer.
///
/// Same return convention as [`receive_loop`], with the number of bytes
/// sent.
async fn send_loop<I>(
    mut writer: OwnedWriteHalf,
    mut input: I,
    signal: TerminationSignal,
) -> (Option<SessionOutcome>, u64)
where
    I: AsyncBufRead + Unpin,
{
    let mut watcher = signal.watcher();
    let mut buf = [0u8; BUFFER_SIZE];
    let mut sent: u64 = 0;

    loop {
        let n = tokio::select! {
            result = read_line_capped(&mut input, &mut buf) => match result {
                Ok(0) => {
                    log::debug!("[session] local input ended");
                    signal.set();
                    return (Some(SessionOutcome::LocalInputEnded), sent);
                }
                Ok(n) => n,
                Err(e) => {
                    log::warn!("[session] reading local input failed: {e}");
                    signal.set();
                    return (Some(SessionOutcome::LocalInputEnded), sent);
                }
            },
            _ = watcher.triggered() => return (None, sent),
        };

        if let Err(e) = writer.write_all(&buf[..n]).await {
            log::warn!("[session] send failed: {e}");
            signal.set();
            return (Some(SessionOutcome::PeerClosed), sent);
        }
        sent += n as u64;
    }
}

/// Fill `buf` with one line: stop at a newline (kept in the buffer), at
/// `buf.len()` bytes, or at end-of-input.
///
/// Returns the number of bytes written into `buf`; `Ok(0)` means
/// end-of-input with nothing pending.  A line longer than the buffer comes
/// back in `buf.len()`-sized pieces, the terminator arriving with the last
/// piece — the split half of the buffer contract described at module level.
async fn read_line_capped<I>(input: &mut I, buf: &mut [u8]) -> io::Result<usize>
where
    I: AsyncBufRead + Unpin,
{
    let mut filled = 0;
    loop {
        if filled == buf.len() {
            return Ok(filled);
        }
        let available = input.fill_buf().await?;
        if available.is_empty() {
            // EOF; return what was gathered (0 on a bare EOF).
            return Ok(filled);
        }

        let newline = available.iter().position(|&b| b == b'\n');
        let room = buf.len() - filled;
        let take = match newline {
            Some(idx) => (idx + 1).min(room),
            None => available.len().min(room),
        };
        buf[filled..filled + take].copy_from_slice(&available[..take]);
        input.consume(take);
        filled += take;

        if let Some(idx) = newline {
            if idx + 1 == take {
                return Ok(filled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn capped_reader_stops_at_newline() {
        let mut input: &[u8] = b"hello\nworld\n";
        let mut buf = [0u8; BUFFER_SIZE];

        let n = read_line_capped(&mut input, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello\n");

        let n = read_line_capped(&mut input, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"world\n");

        let n = read_line_capped(&mut input, &mut buf).await.unwrap();
        assert_eq!(n, 0, "bare EOF reads zero bytes");
    }

    #[tokio::test]
    async fn capped_reader_returns_final_line_without_newline() {
        let mut input: &[u8] = b"no terminator";
        let mut buf = [0u8; BUFFER_SIZE];

        let n = read_line_capped(&mut input, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"no terminator");
    }

    #[tokio::test]
    async fn capped_reader_splits_over_long_lines() {
        let long = [b'a'; 250];
        let mut line = long.to_vec();
        line.push(b'\n');
        let mut input: &[u8] = &line;
        let mut buf = [0u8; BUFFER_SIZE];

        // First piece fills the buffer exactly, no terminator.
        let n = read_line_capped(&mut input, &mut buf).await.unwrap();
        assert_eq!(n, BUFFER_SIZE);
        assert!(buf[..n].iter().all(|&b| b == b'a'));

        // Second piece carries the remainder plus the terminator.
        let n = read_line_capped(&mut input, &mut buf).await.unwrap();
        assert_eq!(n, 251 - BUFFER_SIZE);
        assert_eq!(buf[n - 1], b'\n');
    }

    #[tokio::test]
    async fn capped_reader_boundary_line_fits_in_one_read() {
        // BUFFER_SIZE - 1 bytes plus terminator: exactly one full transfer.
        let mut line = vec![b'x'; BUFFER_SIZE - 1];
        line.push(b'\n');
        let mut input: &[u8] = &line;
        let mut buf = [0u8; BUFFER_SIZE];

        let n = read_line_capped(&mut input, &mut buf).await.unwrap();
        assert_eq!(n, BUFFER_SIZE);
        assert_eq!(&buf[..n], line.as_slice());
    }

    #[test]
    fn termination_signal_is_monotonic() {
        let signal = TerminationSignal::new();
        assert!(!signal.is_set());
        signal.set();
        assert!(signal.is_set());
        signal.set();
        assert!(signal.is_set(), "setting twice stays set");
    }

    #[tokio::test]
    async fn watcher_resolves_after_set() {
        let signal = TerminationSignal::new();
        let mut watcher = signal.watcher();
        signal.set();
        // Must resolve immediately; a hang here would time the test out.
        watcher.triggered().await;
    }
}
