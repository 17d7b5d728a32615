//! In-memory mailbox for bench runs and tests.
use async_trait::async_trait;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::{EmailBackend, MessageSummary};
use crate::error::EmailError;
use crate::logutil::escape_header;

/// Every message sent through the mailbox is delivered to its own inbox, so a
/// radio user can `SENDEMAIL` and then `GETMAILS` it back without a mail server.
#[derive(Debug)]
pub struct LoopbackMailbox {
    address: String,
    inbox: Mutex<Vec<MessageSummary>>, // oldest first, like an IMAP sequence
    next_id: AtomicU64,
}

impl LoopbackMailbox {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            inbox: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Seed the inbox with an incoming message (appended as the newest).
    pub fn deliver(&self, sender: &str, subject: &str, body: &str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let msg = MessageSummary::new(id.clone(), sender, subject, body);
        match self.inbox.lock() {
            Ok(mut inbox) => inbox.push(msg),
            Err(poisoned) => poisoned.into_inner().push(msg),
        }
        id
    }

    pub fn len(&self) -> usize {
        match self.inbox.lock() {
            Ok(inbox) => inbox.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EmailBackend for LoopbackMailbox {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        if !to.contains('@') {
            return Err(EmailError::Send(format!("invalid recipient '{}'", to)));
        }
        debug!(
            "loopback: {} -> {} subject='{}'",
            self.address,
            to,
            escape_header(subject)
        );
        self.deliver(&self.address, subject, body);
        Ok(())
    }

    async fn fetch_recent(&self, n: usize) -> Result<Vec<MessageSummary>, EmailError> {
        let inbox = self
            .inbox
            .lock()
            .map_err(|_| EmailError::Fetch("mailbox lock poisoned".into()))?;
        Ok(inbox.iter().rev().take(n).cloned().collect())
    }
}
