//! In-process transport: frames are recorded, inbound text is injected by hand.
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::{InboundRx, InboundTx, Transport};
use crate::error::TransportError;

#[derive(Debug)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

/// Test-side handle for a [MemoryTransport]. The inbound stream ends once every
/// clone is dropped or [MemoryLink::hang_up] is called.
#[derive(Debug, Clone)]
pub struct MemoryLink {
    inbound: Arc<Mutex<Option<InboundTx>>>,
    sent: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl MemoryTransport {
    pub fn pair() -> (MemoryTransport, MemoryLink, InboundRx) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let failing = Arc::new(AtomicBool::new(false));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = MemoryTransport {
            sent: sent.clone(),
            failing: failing.clone(),
            closed: closed.clone(),
        };
        let link = MemoryLink {
            inbound: Arc::new(Mutex::new(Some(tx))),
            sent,
            failing,
            closed,
        };
        (transport, link, rx)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_text(&mut self, frame: &str) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Timeout);
        }
        let mut sent = self.sent.lock().map_err(|_| TransportError::Closed)?;
        sent.push(frame.to_string());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl MemoryLink {
    /// Deliver inbound text as if it had arrived over the radio.
    pub fn inject(&self, text: &str) -> bool {
        match self.inbound.lock() {
            Ok(guard) => guard
                .as_ref()
                .is_some_and(|tx| tx.send(text.to_string()).is_ok()),
            Err(_) => false,
        }
    }

    /// End the inbound stream; queued text is still delivered.
    pub fn hang_up(&self) {
        if let Ok(mut guard) = self.inbound.lock() {
            guard.take();
        }
    }

    pub fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn take_sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }

    /// Make subsequent sends fail with a timeout.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
