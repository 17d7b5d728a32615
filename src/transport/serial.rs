//! Meshtastic serial link in `TEXTMSG` mode.
//!
//! In this mode the node's serial module prints every received text message as a
//! line and broadcasts whatever is written to it as a text message. Each frame is
//! written in one call, and consecutive writes are spaced by `min_send_gap` so the
//! module does not merge two frames into a single radio message. A frame must fit
//! one text payload ([TEXTMSG_MAX_BYTES]); larger frames are refused, since the
//! firmware would otherwise cut them up outside the gateway's frame ordering.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, error, info, trace, warn};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::sleep;

use super::lines::{strip_sender_prefix, LineAssembler};
use super::{InboundRx, InboundTx, Transport};
use crate::error::TransportError;
use crate::logutil::escape_log;

/// Largest text payload the serial module sends as a single radio message.
pub const TEXTMSG_MAX_BYTES: usize = 230;
/// Worst-case UTF-8 width of one character.
const MAX_CHAR_BYTES: usize = 4;

const READ_TIMEOUT: Duration = Duration::from_millis(500);
const SETTLE_DELAY: Duration = Duration::from_millis(150);

pub struct SerialTextTransport {
    port_name: String,
    port: Arc<Mutex<Box<dyn SerialPort>>>,
    min_send_gap: Duration,
    last_send: Option<Instant>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl SerialTextTransport {
    /// Longest frame, in characters, guaranteed to fit [TEXTMSG_MAX_BYTES].
    pub const fn max_frame_chars() -> usize {
        TEXTMSG_MAX_BYTES / MAX_CHAR_BYTES
    }

    /// Open the port and start the reader thread.
    pub async fn open(
        port_name: &str,
        baud_rate: u32,
        min_send_gap: Duration,
    ) -> Result<(Self, InboundRx)> {
        info!(
            "Opening Meshtastic serial link on {} at {} baud",
            port_name, baud_rate
        );
        let mut builder = serialport::new(port_name, baud_rate).timeout(READ_TIMEOUT);
        #[cfg(unix)]
        {
            builder = builder
                .data_bits(serialport::DataBits::Eight)
                .stop_bits(serialport::StopBits::One)
                .parity(serialport::Parity::None);
        }
        let mut port = builder
            .open()
            .map_err(|e| anyhow!("Failed to open serial port {}: {}", port_name, e))?;

        // ESP32 boards want DTR/RTS asserted before they talk
        let _ = port.write_data_terminal_ready(true);
        let _ = port.write_request_to_send(true);
        sleep(SETTLE_DELAY).await;
        if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
            debug!("Could not purge serial input buffer: {}", e);
        }

        let reader_port = port
            .try_clone()
            .map_err(|e| anyhow!("Failed to clone serial port {}: {}", port_name, e))?;
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let reader_stop = stop.clone();
        let name = port_name.to_string();
        let reader = std::thread::Builder::new()
            .name("meshmail-serial-rx".to_string())
            .spawn(move || read_loop(name, reader_port, tx, reader_stop))
            .map_err(|e| anyhow!("Failed to start serial reader: {}", e))?;

        Ok((
            Self {
                port_name: port_name.to_string(),
                port: Arc::new(Mutex::new(port)),
                min_send_gap,
                last_send: None,
                stop,
                reader: Some(reader),
            },
            rx,
        ))
    }

    async fn pace(&self) {
        if let Some(last) = self.last_send {
            let elapsed = last.elapsed();
            if elapsed < self.min_send_gap {
                let wait = self.min_send_gap - elapsed;
                trace!("Pacing serial send for {}ms", wait.as_millis());
                sleep(wait).await;
            }
        }
    }
}

fn read_loop(
    port_name: String,
    mut port: Box<dyn SerialPort>,
    tx: InboundTx,
    stop: Arc<AtomicBool>,
) {
    let mut assembler = LineAssembler::new();
    let mut buf = [0u8; 512];
    while !stop.load(Ordering::SeqCst) {
        match port.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                for line in assembler.push(&buf[..n]) {
                    debug!("RX line: {}", escape_log(&line));
                    let text = strip_sender_prefix(&line);
                    if text.is_empty() {
                        continue;
                    }
                    if tx.send(text.to_string()).is_err() {
                        debug!("Inbound channel closed; stopping serial reader");
                        return;
                    }
                }
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::Interrupted =>
            {
                continue
            }
            Err(e) => {
                if !stop.load(Ordering::SeqCst) {
                    error!("Serial link {} lost: {}", port_name, e);
                }
                return;
            }
        }
    }
}

fn check_frame_size(frame: &str) -> Result<(), TransportError> {
    if frame.len() > TEXTMSG_MAX_BYTES {
        return Err(TransportError::FrameTooLarge {
            len: frame.len(),
            max: TEXTMSG_MAX_BYTES,
        });
    }
    Ok(())
}

#[async_trait]
impl Transport for SerialTextTransport {
    async fn send_text(&mut self, frame: &str) -> Result<(), TransportError> {
        if self.stop.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        check_frame_size(frame)?;
        self.pace().await;

        let mut payload = Vec::with_capacity(frame.len() + 1);
        payload.extend_from_slice(frame.as_bytes());
        payload.push(b'\n');
        let port = self.port.clone();
        let written = tokio::task::spawn_blocking(move || -> Result<(), TransportError> {
            let mut guard = port.lock().map_err(|_| TransportError::Closed)?;
            guard.write_all(&payload)?;
            guard.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| TransportError::Io(std::io::Error::other(e.to_string())))?;

        self.last_send = Some(Instant::now());
        match &written {
            Ok(()) => trace!("TX {} bytes on {}", frame.len() + 1, self.port_name),
            Err(e) => warn!("Serial write on {} failed: {}", self.port_name, e),
        }
        written
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            // Reader wakes within READ_TIMEOUT
            let _ = tokio::task::spawn_blocking(move || reader.join()).await;
        }
        info!("Closed serial link {}", self.port_name);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("serial:{}", self.port_name)
    }
}

impl Drop for SerialTextTransport {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_at_byte_limit_is_accepted() {
        assert!(check_frame_size(&"a".repeat(TEXTMSG_MAX_BYTES)).is_ok());
    }

    #[test]
    fn oversize_frame_is_refused() {
        let err = check_frame_size(&"a".repeat(TEXTMSG_MAX_BYTES + 1)).unwrap_err();
        assert!(matches!(
            err,
            TransportError::FrameTooLarge { len, max } if len == TEXTMSG_MAX_BYTES + 1 && max == TEXTMSG_MAX_BYTES
        ));
    }

    #[test]
    fn worst_case_frame_of_max_chars_fits() {
        let frame = "\u{1F4E7}".repeat(SerialTextTransport::max_frame_chars());
        assert!(check_frame_size(&frame).is_ok());
        let frame = "é".repeat(SerialTextTransport::max_frame_chars() * 2);
        assert!(check_frame_size(&frame).is_ok());
    }
}
