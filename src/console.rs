//! Console collaborators: incoming-line formatting and local input.
//!
//! The session core is generic over its input/output; everything
//! terminal-specific lives here so tests can substitute in-memory streams.

use std::io::Write;

use tokio::io::{BufReader, Stdin};

use crate::resolver::Role;

/// Format one received chunk for display.
///
/// A single trailing newline is stripped before prefixing and re-added
/// after, so `hello\n` from the peer of a client prints as
/// `From server: hello`.  Non-UTF-8 bytes are replaced, not rejected.
pub fn format_incoming(role: Role, bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let line = text.strip_suffix('\n').unwrap_or(&text);
    format!("From {}: {line}\n", role.peer_label())
}

/// The local input source used by the binary: buffered stdin.
pub fn stdin_lines() -> BufReader<Stdin> {
    BufReader::new(tokio::io::stdin())
}

/// Clear the terminal before the chat loop starts.
pub fn clear_screen() {
    print!("\x1b[2J\x1b[H");
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_with_the_remote_role() {
        assert_eq!(
            format_incoming(Role::Client, b"hello\n"),
            "From server: hello\n"
        );
        assert_eq!(
            format_incoming(Role::Server, b"hi\n"),
            "From client: hi\n"
        );
    }

    #[test]
    fn tolerates_missing_terminator() {
        assert_eq!(
            format_incoming(Role::Server, b"partial"),
            "From client: partial\n"
        );
    }

    #[test]
    fn replaces_invalid_utf8() {
        let formatted = format_incoming(Role::Client, &[0xff, 0xfe, b'\n']);
        assert!(formatted.starts_with("From server: "));
        assert!(formatted.ends_with('\n'));
    }
}
