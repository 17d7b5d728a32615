//! Gateway driver: owns the session and carries text between radio and mailbox.
use anyhow::Result;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::time::sleep;

use super::chunker::chunk;
use super::dispatcher::Dispatcher;
use super::parser::{Command, CommandParser};
use super::session::SessionState;
use crate::config::Config;
use crate::email::EmailBackend;
use crate::logutil::escape_log;
use crate::metrics;
use crate::transport::{InboundRx, Transport};

/// Mesh-to-email gateway.
///
/// Inbound text arrives on a single channel and is handled to completion, reply
/// frames included, before the next message is taken. That gives every reply a
/// contiguous, ordered run of frames and lets the session live here without locks.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use meshmail::config::Config;
/// use meshmail::email::LoopbackMailbox;
/// use meshmail::gateway::MailGateway;
/// use meshmail::transport::memory::MemoryTransport;
///
/// # tokio_test::block_on(async {
/// let (transport, link, inbound) = MemoryTransport::pair();
/// let mailbox = Arc::new(LoopbackMailbox::new("gw@example.com"));
/// let mut gateway = MailGateway::new(Config::default(), Box::new(transport), inbound, mailbox);
///
/// gateway.handle_text("HELP").await;
/// assert!(link.sent_frames()[0].starts_with("Available Commands:"));
/// # });
/// ```
pub struct MailGateway {
    config: Config,
    transport: Box<dyn Transport>,
    inbound: InboundRx,
    parser: CommandParser,
    dispatcher: Dispatcher,
    session: SessionState,
}

impl MailGateway {
    pub fn new(
        config: Config,
        transport: Box<dyn Transport>,
        inbound: InboundRx,
        backend: Arc<dyn EmailBackend>,
    ) -> Self {
        let dispatcher = Dispatcher::from_config(backend, &config.email);
        Self {
            config,
            transport,
            inbound,
            parser: CommandParser::new(),
            dispatcher,
            session: SessionState::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Wait for the link to settle, then announce ourselves by answering a HELP
    /// command as if it had come over the radio.
    pub async fn start(&mut self) {
        let delay = self.config.gateway.startup_delay();
        if !delay.is_zero() {
            debug!("Waiting {}ms for the radio link to settle", delay.as_millis());
            sleep(delay).await;
        }
        info!("Sending startup self-check over {}", self.transport.describe());
        let reply = self
            .dispatcher
            .dispatch(Command::Help, &mut self.session)
            .await;
        self.send_reply(&reply).await;
    }

    /// Parse, dispatch and transmit the reply for one inbound text unit.
    pub async fn handle_text(&mut self, raw: &str) {
        debug!("RX: {}", escape_log(raw));
        let command = self.parser.parse(raw);
        let reply = self.dispatcher.dispatch(command, &mut self.session).await;
        self.send_reply(&reply).await;
    }

    /// Chunk `reply` and send the frames in order. A failed frame is logged and
    /// skipped; the rest are still sent.
    async fn send_reply(&mut self, reply: &str) {
        let frames = chunk(reply, self.config.gateway.frame_len());
        if frames.is_empty() {
            debug!("Empty reply; nothing to send");
            return;
        }
        let total = frames.len();
        for (i, frame) in frames.iter().enumerate() {
            match self.transport.send_text(frame).await {
                Ok(()) => {
                    metrics::inc_frames_sent();
                    debug!("TX frame {}/{} ({} chars)", i + 1, total, frame.chars().count());
                }
                Err(e) => {
                    metrics::inc_frames_failed();
                    warn!("Failed to send frame {}/{}: {}", i + 1, total, e);
                }
            }
        }
    }

    /// Run until the inbound stream ends or a shutdown signal arrives.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Gateway '{}' running on {}",
            self.config.gateway.name,
            self.transport.describe()
        );
        self.start().await;

        #[cfg(unix)]
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        loop {
            #[cfg(unix)]
            let terminate = sigterm.recv();
            #[cfg(not(unix))]
            let terminate = std::future::pending::<Option<()>>();

            tokio::select! {
                text = self.inbound.recv() => {
                    match text {
                        Some(text) => self.handle_text(&text).await,
                        None => {
                            info!("Inbound stream closed");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = terminate => {
                    info!("Received SIGTERM");
                    break;
                }
            }
        }

        self.shutdown().await
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down gateway...");
        if let Err(e) = self.transport.close().await {
            warn!("Error closing {}: {}", self.transport.describe(), e);
        }
        let snap = metrics::snapshot();
        info!(
            "Gateway stopped: commands={} unrecognized={} frames_sent={} frames_failed={} emails_sent={} emails_failed={} fetches={} fetches_failed={} backend_timeouts={}",
            snap.commands_handled,
            snap.unrecognized_commands,
            snap.frames_sent,
            snap.frames_failed,
            snap.emails_sent,
            snap.emails_failed,
            snap.fetches,
            snap.fetches_failed,
            snap.backend_timeouts
        );
        Ok(())
    }
}
