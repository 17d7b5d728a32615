//! # Radio Transport Module
//!
//! The gateway sees the radio as two things: a way to send one text frame, and a
//! stream of inbound text units. [Transport] covers the first; the second is an
//! [InboundRx] channel handed out when a transport is opened. Keeping inbound
//! delivery on a single-consumer channel means the gateway processes one radio
//! message at a time, whatever thread the device reader runs on.
//!
//! ## Transports
//!
//! - [`serial::SerialTextTransport`] - Meshtastic node with the serial module in
//!   `TEXTMSG` mode (`serial` feature)
//! - [`console::ConsoleTransport`] - stdin/stdout stand-in for a radio
//! - [`memory::MemoryTransport`] - in-process transport for tests
//!
//! ## Configuration
//!
//! ```toml
//! [meshtastic]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! min_send_gap_ms = 2000
//! ```
//!
//! The device must have its serial module enabled in text mode, e.g.
//! `meshtastic --set serial.enabled true --set serial.mode TEXTMSG`.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;

pub mod console;
pub mod lines;
pub mod memory;
#[cfg(feature = "serial")]
pub mod serial;

/// Receiving half of a transport: one item per inbound radio text unit.
pub type InboundRx = mpsc::UnboundedReceiver<String>;
pub type InboundTx = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait Transport: Send {
    /// Send one frame as an independent radio message.
    async fn send_text(&mut self, frame: &str) -> Result<(), TransportError>;

    /// Release the underlying link. Further sends fail with [TransportError::Closed].
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Short human-readable name for logs.
    fn describe(&self) -> String;
}
