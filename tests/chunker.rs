/// Reply framing: order, completeness and frame size.
use meshmail::gateway::chunk;
use std::num::NonZeroUsize;

fn n(v: usize) -> NonZeroUsize {
    NonZeroUsize::new(v).unwrap()
}

#[test]
fn frames_concatenate_back_to_the_reply() {
    let inputs = [
        "x".to_string(),
        "Available Commands:\n- GETMAILS\n".repeat(20),
        "héllo wörld, ünïcode ✓ ".repeat(30),
        "a".repeat(500),
        "a".repeat(501),
    ];
    for text in &inputs {
        for max in [1, 7, 100, 230, 500, 10_000] {
            let frames = chunk(text, n(max));
            assert_eq!(&frames.concat(), text, "max_len {}", max);
            let total = text.chars().count();
            assert_eq!(frames.len(), total.div_ceil(max), "max_len {}", max);
            let (last, full) = frames.split_last().unwrap();
            for frame in full {
                assert_eq!(frame.chars().count(), max);
            }
            assert!(last.chars().count() >= 1 && last.chars().count() <= max);
        }
    }
}

#[test]
fn empty_reply_produces_no_frames() {
    assert!(chunk("", n(500)).is_empty());
}

#[test]
fn reply_exactly_one_frame_long() {
    let text = "z".repeat(230);
    let frames = chunk(&text, n(230));
    assert_eq!(frames, vec![text]);
}

#[test]
fn cuts_ignore_word_and_line_boundaries() {
    let frames = chunk("abc def\nghi", n(4));
    assert_eq!(frames, vec!["abc ", "def\n", "ghi"]);
}
