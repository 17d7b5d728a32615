//! Split outbound replies into radio-sized frames.
//!
//! Frames are cut at exactly `max_len` characters with no regard for words or lines;
//! the receiver reads them as an ordered stream of independent radio messages, so the
//! only guarantees are order and that concatenation gives back the reply. Lengths are
//! counted in `char`s, which also keeps every cut on a UTF-8 boundary.
use std::num::NonZeroUsize;

/// Split `text` into consecutive frames of `max_len` characters; the last frame holds
/// the remainder. Empty input yields no frames.
pub fn chunk(text: &str, max_len: NonZeroUsize) -> Vec<String> {
    let max_len = max_len.get();
    let mut frames = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let end = remaining
            .char_indices()
            .nth(max_len)
            .map(|(idx, _)| idx)
            .unwrap_or(remaining.len());
        let (frame, rest) = remaining.split_at(end);
        frames.push(frame.to_string());
        remaining = rest;
    }
    frames
}
