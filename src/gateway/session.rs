//! Pagination state and reply rendering for the radio user's mail view.
use crate::email::MessageSummary;

/// Listing entries shown per page.
pub const PAGE_SIZE: usize = 5;
/// Body characters shown by the detail view before truncation.
pub const PREVIEW_LEN: usize = 100;

pub const NO_MORE_EMAILS: &str = "No more emails.";
pub const LISTING_HINT: &str = "[N]ext Page";
pub const DETAIL_HINT: &str = "[C]ontinue [N]ext Email";
const ELLIPSIS: &str = "...";

/// # Gateway Session State
///
/// The radio user's view into the most recent `GETMAILS` fetch: the fetched
/// messages (newest first) and a cursor marking the start of the active page.
///
/// ## Cursor semantics
///
/// - `GETMAILS` replaces the messages and resets the cursor to 0
/// - `NEXT` advances the cursor by a full [PAGE_SIZE], regardless of how many
///   entries the previous page actually showed
/// - `CONTINUE` inspects the message at the cursor without moving it
///
/// The cursor may run past the end of the list; rendering then yields
/// [NO_MORE_EMAILS] instead of an error.
///
/// ```rust
/// use meshmail::email::MessageSummary;
/// use meshmail::gateway::session::SessionState;
///
/// let mut session = SessionState::new();
/// session.replace_messages(vec![MessageSummary::new("1", "a@b.c", "Hi", "body")]);
/// assert_eq!(session.render_listing(), "[1] Hi | a@b.c\n\n[N]ext Page");
/// session.advance_page();
/// assert_eq!(session.render_listing(), "No more emails.");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    messages: Vec<MessageSummary>,
    cursor: usize,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[MessageSummary] {
        &self.messages
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Install a fresh fetch and rewind to the first page.
    pub fn replace_messages(&mut self, messages: Vec<MessageSummary>) {
        self.messages = messages;
        self.cursor = 0;
    }

    pub fn advance_page(&mut self) {
        self.cursor = self.cursor.saturating_add(PAGE_SIZE);
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.messages.len()
    }

    /// Current page as `[n] subject | sender` lines plus the navigation hint.
    pub fn render_listing(&self) -> String {
        if self.is_exhausted() {
            return NO_MORE_EMAILS.to_string();
        }
        let end = (self.cursor + PAGE_SIZE).min(self.messages.len());
        let mut out = String::new();
        for (offset, msg) in self.messages[self.cursor..end].iter().enumerate() {
            out.push_str(&format!(
                "[{}] {} | {}\n",
                self.cursor + offset + 1,
                msg.subject,
                msg.sender
            ));
        }
        out.push('\n');
        out.push_str(LISTING_HINT);
        out
    }

    /// The message at the cursor with a body preview of at most [PREVIEW_LEN] characters.
    pub fn render_detail(&self) -> String {
        let Some(msg) = self.messages.get(self.cursor) else {
            return NO_MORE_EMAILS.to_string();
        };
        let mut out = format!("From: {}\nSubject: {}\n", msg.sender, msg.subject);
        match msg.body.char_indices().nth(PREVIEW_LEN) {
            Some((cut, _)) => {
                out.push_str(&msg.body[..cut]);
                out.push_str(ELLIPSIS);
            }
            None => out.push_str(&msg.body),
        }
        out.push_str("\n\n");
        out.push_str(DETAIL_HINT);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbox(n: usize) -> Vec<MessageSummary> {
        (1..=n)
            .map(|i| MessageSummary::new(i.to_string(), format!("u{i}@x.org"), format!("s{i}"), ""))
            .collect()
    }

    #[test]
    fn empty_session_has_nothing_to_show() {
        let session = SessionState::new();
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.render_listing(), NO_MORE_EMAILS);
        assert_eq!(session.render_detail(), NO_MORE_EMAILS);
    }

    #[test]
    fn replace_rewinds_cursor() {
        let mut session = SessionState::new();
        session.replace_messages(inbox(8));
        session.advance_page();
        assert_eq!(session.cursor(), 5);
        session.replace_messages(inbox(2));
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn detail_follows_cursor_after_paging() {
        let mut session = SessionState::new();
        session.replace_messages(inbox(8));
        session.advance_page();
        assert!(session.render_detail().starts_with("From: u6@x.org\nSubject: s6\n"));
    }

    #[test]
    fn body_of_exactly_preview_len_is_not_truncated() {
        let mut session = SessionState::new();
        let body = "b".repeat(PREVIEW_LEN);
        session.replace_messages(vec![MessageSummary::new("1", "a@b.c", "s", body.clone())]);
        let detail = session.render_detail();
        assert!(detail.contains(&body));
        assert!(!detail.contains(ELLIPSIS));
    }
}
