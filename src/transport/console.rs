//! stdin/stdout stand-in for a radio.
//!
//! Each stdin line is one inbound radio message; each outbound frame is printed
//! between separator lines so frame boundaries stay visible while bench testing.
use async_trait::async_trait;
use log::{debug, warn};
use std::io::BufRead;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use super::{InboundRx, InboundTx, Transport};
use crate::error::TransportError;

const FRAME_SEPARATOR: &str = "----";

pub struct ConsoleTransport {
    stdout: tokio::io::Stdout,
    frames_written: u64,
    closed: bool,
}

/// Forward non-blank lines from `input` until EOF, a read error, or the
/// receiver going away.
pub(crate) fn read_stdin<R: BufRead>(input: R, tx: InboundTx) {
    for line in input.lines() {
        match line {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("console: stdin read error: {}", e);
                return;
            }
        }
    }
    debug!("console: stdin closed");
}

impl ConsoleTransport {
    /// Start the stdin reader thread. The inbound stream ends at EOF.
    ///
    /// Stdin is read on a plain thread: a blocked terminal read cannot be
    /// cancelled, and runtime shutdown must not wait for the next line.
    pub fn open() -> (Self, InboundRx) {
        let (tx, rx) = mpsc::unbounded_channel();
        let spawned = std::thread::Builder::new()
            .name("meshmail-console-rx".to_string())
            .spawn(move || read_stdin(std::io::stdin().lock(), tx));
        if let Err(e) = spawned {
            // Sender dropped with the closure; the gateway sees end of input
            warn!("console: could not start stdin reader: {}", e);
        }
        (
            Self {
                stdout: tokio::io::stdout(),
                frames_written: 0,
                closed: false,
            },
            rx,
        )
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_text(&mut self, frame: &str) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.frames_written += 1;
        let out = format!(
            "{} frame {} ({} chars)\n{}\n",
            FRAME_SEPARATOR,
            self.frames_written,
            frame.chars().count(),
            frame
        );
        self.stdout.write_all(out.as_bytes()).await?;
        self.stdout.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        self.stdout.flush().await?;
        Ok(())
    }

    fn describe(&self) -> String {
        "console".to_string()
    }
}
