//! SMTP + IMAP backend.
//!
//! Outbound mail goes through `lettre`'s async SMTP transport (STARTTLS, or implicit
//! TLS on port 465). The mailbox is read with the blocking `imap` client on a
//! `spawn_blocking` thread, and each raw RFC822 message is reduced to a
//! [`MessageSummary`] with `mailparse`.
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, info, trace};
use mailparse::{MailAddr, MailHeaderMap, ParsedMail};

use std::net::{TcpStream, ToSocketAddrs};

use super::{EmailBackend, MessageSummary};
use crate::config::EmailConfig;
use crate::error::EmailError;
use crate::logutil::escape_header;

type ImapSession = imap::Session<native_tls::TlsStream<TcpStream>>;

const IMPLICIT_TLS_PORT: u16 = 465;

pub struct ImapSmtpBackend {
    config: EmailConfig,
}

impl ImapSmtpBackend {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        if config.address.is_empty() {
            return Err(EmailError::Config("email.address is required".into()));
        }
        if config.password.is_empty() {
            return Err(EmailError::Config(format!(
                "email.password is empty (set it in the config or via {})",
                crate::config::PASSWORD_ENV
            )));
        }
        if config.smtp_host.is_empty() || config.imap_host.is_empty() {
            return Err(EmailError::Config(
                "email.smtp_host and email.imap_host are required".into(),
            ));
        }
        Ok(Self { config })
    }

    fn smtp_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(self.config.address.clone(), self.config.password.clone());
        let builder = if self.config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
        }
        .map_err(|e| EmailError::Connect(format!("SMTP relay {}: {}", self.config.smtp_host, e)))?;

        Ok(builder
            .port(self.config.smtp_port)
            .credentials(creds)
            .timeout(Some(self.config.timeout()))
            .build())
    }
}

#[async_trait]
impl EmailBackend for ImapSmtpBackend {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let from: Mailbox = self
            .config
            .address
            .parse()
            .map_err(|e| EmailError::Config(format!("invalid account address: {}", e)))?;
        let rcpt: Mailbox = to
            .trim()
            .parse()
            .map_err(|e| EmailError::Send(format!("invalid recipient '{}': {}", to, e)))?;

        let message = Message::builder()
            .from(from)
            .to(rcpt)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::Send(format!("failed to build email: {}", e)))?;

        debug!(
            "Connecting to SMTP server {}:{}",
            self.config.smtp_host, self.config.smtp_port
        );
        self.smtp_transport()?
            .send(message)
            .await
            .map_err(|e| EmailError::Send(e.to_string()))?;

        info!("Email sent to {} subject='{}'", to, escape_header(subject));
        Ok(())
    }

    async fn fetch_recent(&self, n: usize) -> Result<Vec<MessageSummary>, EmailError> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || fetch_recent_blocking(&config, n))
            .await
            .map_err(|e| EmailError::Task(e.to_string()))?
    }
}

/// TCP connection with the backend deadline applied to connect, read and write, so
/// a stalled server fails the blocking fetch instead of parking its thread.
fn connect_tcp(config: &EmailConfig) -> Result<TcpStream, EmailError> {
    let deadline = config.timeout();
    let addrs = (config.imap_host.as_str(), config.imap_port)
        .to_socket_addrs()
        .map_err(|e| EmailError::Connect(format!("resolve {}: {}", config.imap_host, e)))?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, deadline) {
            Ok(stream) => {
                stream
                    .set_read_timeout(Some(deadline))
                    .and_then(|_| stream.set_write_timeout(Some(deadline)))
                    .map_err(|e| EmailError::Connect(format!("socket timeouts: {}", e)))?;
                return Ok(stream);
            }
            Err(e) => {
                trace!("IMAP connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }
    Err(EmailError::Connect(format!(
        "IMAP {}:{}: {}",
        config.imap_host,
        config.imap_port,
        last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no address resolved".to_string())
    )))
}

fn open_imap_session(config: &EmailConfig) -> Result<ImapSession, EmailError> {
    let tls = native_tls::TlsConnector::builder()
        .build()
        .map_err(|e| EmailError::Connect(format!("TLS setup: {}", e)))?;

    debug!(
        "Connecting to IMAP server {}:{}",
        config.imap_host, config.imap_port
    );
    let stream = connect_tcp(config)?;
    let tls_stream = tls
        .connect(config.imap_host.as_str(), stream)
        .map_err(|e| EmailError::Connect(format!("TLS handshake with {}: {}", config.imap_host, e)))?;

    let mut client = imap::Client::new(tls_stream);
    client
        .read_greeting()
        .map_err(|e| EmailError::Connect(format!("IMAP greeting: {}", e)))?;

    client
        .login(config.address.as_str(), config.password.as_str())
        .map_err(|(e, _client)| EmailError::Auth(e.to_string()))
}

fn fetch_recent_blocking(config: &EmailConfig, n: usize) -> Result<Vec<MessageSummary>, EmailError> {
    let mut session = open_imap_session(config)?;
    let result = fetch_newest(&mut session, config, n);
    if let Err(e) = session.logout() {
        debug!("IMAP logout error (ignored): {}", e);
    }
    let summaries = result?;
    info!("Fetched {} emails", summaries.len());
    Ok(summaries)
}

fn fetch_newest(
    session: &mut ImapSession,
    config: &EmailConfig,
    n: usize,
) -> Result<Vec<MessageSummary>, EmailError> {
    session
        .select(&config.mailbox)
        .map_err(|e| EmailError::Fetch(format!("select {}: {}", config.mailbox, e)))?;

    let mut seqs: Vec<u32> = session
        .search("ALL")
        .map_err(|e| EmailError::Fetch(format!("search: {}", e)))?
        .into_iter()
        .collect();
    seqs.sort_unstable();
    debug!("Found {} messages in {}", seqs.len(), config.mailbox);

    let mut summaries = Vec::with_capacity(n.min(seqs.len()));
    for seq in seqs.iter().rev().take(n) {
        trace!("Fetching message seq={}", seq);
        let fetches = session
            .fetch(seq.to_string(), "RFC822")
            .map_err(|e| EmailError::Fetch(format!("fetch {}: {}", seq, e)))?;
        for fetch in fetches.iter() {
            if let Some(raw) = fetch.body() {
                summaries.push(summarize(&seq.to_string(), raw)?);
            }
        }
    }
    Ok(summaries)
}

/// Reduce one raw RFC822 message to a [`MessageSummary`].
pub(crate) fn summarize(id: &str, raw: &[u8]) -> Result<MessageSummary, EmailError> {
    let parsed = mailparse::parse_mail(raw)
        .map_err(|e| EmailError::Fetch(format!("MIME parse of {}: {}", id, e)))?;

    let subject = parsed.headers.get_first_value("Subject").unwrap_or_default();
    let sender = parsed
        .headers
        .get_first_value("From")
        .map(|from| bare_address(&from))
        .unwrap_or_default();

    Ok(MessageSummary {
        id: id.to_string(),
        sender,
        subject,
        body: text_body(&parsed),
    })
}

/// `"Alice <alice@example.com>"` -> `"alice@example.com"`.
fn bare_address(header: &str) -> String {
    let first = mailparse::addrparse(header)
        .ok()
        .and_then(|list| list.iter().next().cloned());
    match first {
        Some(MailAddr::Single(info)) => info.addr,
        Some(MailAddr::Group(group)) => group
            .addrs
            .first()
            .map(|info| info.addr.clone())
            .unwrap_or_default(),
        None => header.trim().to_string(),
    }
}

/// First `text/plain` part of a multipart message, or the decoded payload of a
/// single-part one.
fn text_body(mail: &ParsedMail) -> String {
    if mail.subparts.is_empty() {
        return mail.get_body().unwrap_or_default();
    }
    first_plain_part(mail).unwrap_or_default()
}

fn first_plain_part(mail: &ParsedMail) -> Option<String> {
    if mail.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
        return mail.get_body().ok();
    }
    mail.subparts.iter().find_map(first_plain_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_single_part_message() {
        let raw = b"From: Alice Example <alice@example.com>\r\n\
Subject: Trail report\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Snow above 2000m.\r\n";
        let summary = summarize("7", raw).unwrap();
        assert_eq!(summary.id, "7");
        assert_eq!(summary.sender, "alice@example.com");
        assert_eq!(summary.subject, "Trail report");
        assert_eq!(summary.body.trim_end(), "Snow above 2000m.");
    }

    #[test]
    fn picks_first_plain_part_of_multipart() {
        let raw = b"From: bob@example.com\r\n\
Subject: Mixed\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>html version</p>\r\n\
--XYZ\r\n\
Content-Type: text/plain\r\n\
\r\n\
plain version\r\n\
--XYZ--\r\n";
        let summary = summarize("3", raw).unwrap();
        assert_eq!(summary.sender, "bob@example.com");
        assert_eq!(summary.body.trim_end(), "plain version");
    }

    #[test]
    fn missing_subject_is_empty() {
        let raw = b"From: carol@example.com\r\n\r\nbody\r\n";
        let summary = summarize("1", raw).unwrap();
        assert_eq!(summary.subject, "");
    }

    #[test]
    fn bare_address_falls_back_to_raw_header() {
        assert_eq!(bare_address("Dave <dave@example.com>"), "dave@example.com");
        assert_eq!(bare_address("not-an-address"), "not-an-address");
    }

    #[test]
    fn silent_imap_server_times_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        // Accept, then never answer the TLS handshake
        let server = std::thread::spawn(move || {
            let (conn, _) = listener.accept().unwrap();
            std::thread::sleep(std::time::Duration::from_secs(3));
            drop(conn);
        });

        let config = EmailConfig {
            address: "gw@example.com".into(),
            password: "secret".into(),
            imap_host: "127.0.0.1".into(),
            imap_port: port,
            timeout_seconds: 1,
            ..EmailConfig::default()
        };
        let started = std::time::Instant::now();
        let result = fetch_recent_blocking(&config, 5);
        assert!(matches!(result, Err(EmailError::Connect(_))));
        assert!(started.elapsed() < std::time::Duration::from_millis(2500));
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_a_connect_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = EmailConfig {
            imap_host: "127.0.0.1".into(),
            imap_port: port,
            timeout_seconds: 1,
            ..EmailConfig::default()
        };
        assert!(matches!(connect_tcp(&config), Err(EmailError::Connect(_))));
    }

    #[test]
    fn backend_requires_password() {
        let config = EmailConfig::default();
        assert!(matches!(
            ImapSmtpBackend::new(config),
            Err(EmailError::Config(_))
        ));
    }
}
