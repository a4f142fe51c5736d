//! Escaped rendering of received bytes.

use std::fmt;

/// Displays a byte slice as a double-quoted string in which printable
/// ASCII is kept and every other byte is escaped (`\n`, `\t`, `\xNN`, ...),
/// so a log line shows exactly what arrived on the wire.
#[derive(Debug, Clone, Copy)]
pub struct Quoted<'a>(pub &'a [u8]);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.escape_ascii())
    }
}
