//! Command dispatcher: one state transition per inbound command.
//!
//! The dispatcher holds no session data of its own. Each call takes the parsed
//! [Command] and the caller's [SessionState], talks to the email backend when the
//! command needs it, and returns the reply text. Backend errors and deadline
//! expiry never escape: a failed send becomes [EMAIL_FAILED], a failed fetch becomes
//! an empty list. Nothing is retried here.
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::parser::Command;
use super::session::SessionState;
use crate::config::EmailConfig;
use crate::email::{EmailBackend, MessageSummary};
use crate::error::EmailError;
use crate::logutil::{escape_header, escape_log};
use crate::metrics;

pub const EMAIL_SENT: &str = "Email sent successfully";
pub const EMAIL_FAILED: &str = "Email failed";
pub const UNRECOGNIZED_PREFIX: &str = "Unrecognized command. Type HELP to see available commands:\n";

pub const HELP_TEXT: &str = concat!(
    "Available Commands:\n",
    "- SENDEMAIL:recipient@example.com:Subject:Body\n",
    "  Send an email to a specific address\n",
    "- GETMAILS\n",
    "  Retrieve recent emails\n",
    "- NEXT\n",
    "  Show the next page of emails\n",
    "- CONTINUE\n",
    "  Read the email at the top of the page\n",
    "- EXIT\n",
    "  Leave the mail view\n",
    "- HELP\n",
    "  Display this help message"
);

pub const DEFAULT_FETCH_COUNT: usize = 10;

pub struct Dispatcher {
    backend: Arc<dyn EmailBackend>,
    timeout: Duration,
    fetch_count: usize,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn EmailBackend>, timeout: Duration, fetch_count: usize) -> Self {
        Self {
            backend,
            timeout,
            fetch_count: fetch_count.max(1),
        }
    }

    pub fn from_config(backend: Arc<dyn EmailBackend>, config: &EmailConfig) -> Self {
        Self::new(backend, config.timeout(), config.fetch_count)
    }

    /// Apply `command` to `session` and produce the reply.
    pub async fn dispatch(&self, command: Command, session: &mut SessionState) -> String {
        metrics::inc_commands_handled();
        match command {
            Command::SendEmail { to, subject, body } => self.send_email(&to, &subject, &body).await,
            Command::ListEmails => {
                let messages = self.fetch_recent().await;
                session.replace_messages(messages);
                session.render_listing()
            }
            Command::NextPage => {
                session.advance_page();
                debug!("Advanced cursor to {}", session.cursor());
                session.render_listing()
            }
            Command::ShowDetail => session.render_detail(),
            Command::Exit | Command::Help => HELP_TEXT.to_string(),
            Command::Unrecognized(raw) => {
                metrics::inc_unrecognized();
                debug!("Unrecognized command '{}'", escape_log(&raw));
                format!("{}{}", UNRECOGNIZED_PREFIX, HELP_TEXT)
            }
        }
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> String {
        info!(
            "Sending email to {} subject='{}' ({} chars)",
            to,
            escape_header(subject),
            body.chars().count()
        );
        match self.with_deadline(self.backend.send(to, subject, body)).await {
            Ok(()) => {
                metrics::inc_emails_sent();
                EMAIL_SENT.to_string()
            }
            Err(e) => {
                metrics::inc_emails_failed();
                warn!("Failed to send email to {}: {}", to, e);
                EMAIL_FAILED.to_string()
            }
        }
    }

    async fn fetch_recent(&self) -> Vec<MessageSummary> {
        metrics::inc_fetches();
        match self.with_deadline(self.backend.fetch_recent(self.fetch_count)).await {
            Ok(mut messages) => {
                messages.truncate(self.fetch_count);
                info!("Fetched {} emails", messages.len());
                messages
            }
            Err(e) => {
                metrics::inc_fetches_failed();
                warn!("Failed to fetch emails: {}", e);
                Vec::new()
            }
        }
    }

    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, EmailError>
    where
        F: Future<Output = Result<T, EmailError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                metrics::inc_backend_timeouts();
                Err(EmailError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}
