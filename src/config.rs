//! Fixed tuning constants, kept in one place so nothing re-derives them at
//! runtime.

use std::ops::RangeInclusive;

/// Capacity of one line buffer, terminator included.
///
/// Every transfer over the connection is capped at this many bytes.  A line
/// longer than the capacity is split across multiple transfers; receivers
/// must not assume one transfer equals one logical line near or over the
/// limit.  This is a documented boundary behavior, not framing.
pub const BUFFER_SIZE: usize = 200;

/// Port used by the client when none is given on the command line.
pub const DEFAULT_PORT: u16 = 10000;

/// Maximum queued pending connections on the listening socket.
pub const BACKLOG: u32 = 20;

/// Ports accepted on the command line (IANA registered range).
pub const PORT_RANGE: RangeInclusive<u16> = 1024..=49151;

/// clap value parser for port arguments.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a valid port number"))?;
    if !PORT_RANGE.contains(&port) {
        return Err(format!(
            "port {port} is outside the accepted range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ));
    }
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_registered_ports() {
        assert_eq!(parse_port("10000"), Ok(10000));
        assert_eq!(parse_port("1024"), Ok(1024));
        assert_eq!(parse_port("49151"), Ok(49151));
    }

    #[test]
    fn rejects_out_of_range_ports() {
        assert!(parse_port("80").is_err());
        assert!(parse_port("49152").is_err());
        assert!(parse_port("0").is_err());
    }

    #[test]
    fn rejects_non_numeric_ports() {
        assert!(parse_port("http").is_err());
        assert!(parse_port("").is_err());
        assert!(parse_port("70000").is_err());
    }
}
