//! # Email Backend Module
//!
//! The gateway only needs two things from a mail system: submit one plain-text
//! message, and fetch the most recent messages of one mailbox. [`EmailBackend`] is
//! that seam; the dispatcher owns the deadline and the failure policy.
//!
//! ## Backends
//!
//! - [`ImapSmtpBackend`] - SMTP submission (STARTTLS) + IMAP over TLS; `email` feature
//! - [`LoopbackMailbox`] - in-memory mailbox where every sent mail lands in the inbox
//!
//! ```rust,no_run
//! use meshmail::email::{EmailBackend, LoopbackMailbox};
//!
//! # async fn demo() -> Result<(), meshmail::error::EmailError> {
//! let mailbox = LoopbackMailbox::new("gateway@example.com");
//! mailbox.send("gateway@example.com", "Ping", "hello from the mesh").await?;
//! let recent = mailbox.fetch_recent(10).await?;
//! assert_eq!(recent[0].subject, "Ping");
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::Serialize;

use crate::error::EmailError;

#[cfg(feature = "email")]
pub mod imap_smtp;
pub mod loopback;

#[cfg(feature = "email")]
pub use imap_smtp::ImapSmtpBackend;
pub use loopback::LoopbackMailbox;

/// One fetched email, reduced to what fits a radio screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    /// Backend identifier, unique within one fetch.
    pub id: String,
    /// Bare sender address.
    pub sender: String,
    pub subject: String,
    /// Plain-text body; empty when no text part was found.
    pub body: String,
}

impl MessageSummary {
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait EmailBackend: Send + Sync {
    /// Submit one plain-text message to a single recipient.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;

    /// Fetch up to `n` messages, newest first.
    async fn fetch_recent(&self, n: usize) -> Result<Vec<MessageSummary>, EmailError>;
}
