//! Log helpers for radio and email text.
//!
//! Radio commands and email bodies routinely contain newlines; these helpers keep
//! every log record on one line and bound how much user content lands in the log.

use std::fmt::Write;

/// Characters kept by [`escape_log`] for radio lines and raw protocol text.
pub const LOG_PREVIEW_CHARS: usize = 300;
/// Characters kept by [`escape_header`] for subjects logged on every send.
pub const HEADER_LOG_CHARS: usize = 80;

/// Escape a string for single-line logging, keeping at most [`LOG_PREVIEW_CHARS`]
/// characters.
///
/// `\n`, `\r`, `\t` and backslash are escaped; other control characters become `\xNN`.
pub fn escape_log(s: &str) -> String {
    escape_log_max(s, LOG_PREVIEW_CHARS)
}

/// Escape an email header value such as a subject, capped at [`HEADER_LOG_CHARS`].
pub fn escape_header(s: &str) -> String {
    escape_log_max(s, HEADER_LOG_CHARS)
}

/// Like [`escape_log`] with an explicit character budget. Truncated output ends in `…`.
pub fn escape_log_max(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 8);
    let mut chars = s.chars();
    for ch in chars.by_ref().take(max_chars) {
        push_escaped(&mut out, ch);
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}

fn push_escaped(out: &mut String, ch: char) {
    let escaped = match ch {
        '\\' => "\\\\",
        '\n' => "\\n",
        '\r' => "\\r",
        '\t' => "\\t",
        c if c.is_control() => {
            let _ = write!(out, "\\x{:02X}", c as u32);
            return;
        }
        c => {
            out.push(c);
            return;
        }
    };
    out.push_str(escaped);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_newlines_and_tabs() {
        let esc = escape_log("From: a@b.c\nSubject: hi\r\tEnd");
        assert_eq!(esc, "From: a@b.c\\nSubject: hi\\r\\tEnd");
    }

    #[test]
    fn truncates_on_char_count() {
        assert_eq!(escape_log_max("ééééé", 3), "ééé…");
        assert_eq!(escape_log_max("ééé", 3), "ééé");
    }

    #[test]
    fn escapes_other_controls_as_hex() {
        assert_eq!(escape_log("a\u{7}b"), "a\\x07b");
    }

    #[test]
    fn header_is_capped_tighter_than_preview() {
        let subject = "s".repeat(HEADER_LOG_CHARS + 20);
        let esc = escape_header(&subject);
        assert_eq!(esc.chars().count(), HEADER_LOG_CHARS + 1);
        assert!(esc.ends_with('…'));
        assert_eq!(escape_log(&subject), subject);
        assert_eq!(escape_header("Re: lunch\nBcc: x"), "Re: lunch\\nBcc: x");
    }
}
