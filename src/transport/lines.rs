//! Incremental newline framer for text-mode serial links.
//!
//! The device prints each received radio message as one line. Reads from the port
//! arrive in arbitrary pieces, so bytes are buffered until a `\n` is seen; complete
//! lines are decoded lossily as UTF-8 after the whole line is assembled, which keeps
//! multi-byte characters split across reads intact.
//!
//! In `TEXTMSG` mode the firmware prints each message as `<sender>: <text>`,
//! surrounded by blank lines; [strip_sender_prefix] recovers the `<text>` part.

/// Upper bound on a buffered line; longer garbage is dropped to resynchronize.
pub const MAX_LINE_BYTES: usize = 4096;

/// Longest sender label accepted in front of a message: short names are at most
/// four characters, unnamed nodes print as `!` plus eight hex digits.
const MAX_SENDER_CHARS: usize = 16;
const SENDER_SEPARATOR: &str = ": ";

/// Drop the `<sender>: ` label the firmware puts in front of received text.
///
/// The label never contains `:`, so a line whose text before the first `": "` does
/// (such as `SENDEMAIL:a@b.c:Re: hi`) is returned untouched.
pub fn strip_sender_prefix(line: &str) -> &str {
    match line.split_once(SENDER_SEPARATOR) {
        Some((sender, text))
            if !sender.is_empty()
                && !sender.contains(':')
                && sender.chars().count() <= MAX_SENDER_CHARS =>
        {
            text.trim()
        }
        _ => line,
    }
}

#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: Vec<u8>,
    overflowed: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every completed, trimmed, non-empty line.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in data {
            if b == b'\n' {
                if !self.overflowed {
                    let line = String::from_utf8_lossy(&self.buf);
                    let line = line.trim();
                    if !line.is_empty() {
                        lines.push(line.to_string());
                    }
                }
                self.buf.clear();
                self.overflowed = false;
                continue;
            }
            if self.buf.len() >= MAX_LINE_BYTES {
                // Discard until the next newline
                self.buf.clear();
                self.overflowed = true;
            }
            if !self.overflowed {
                self.buf.push(b);
            }
        }
        lines
    }

    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
