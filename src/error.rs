use thiserror::Error;

/// Errors raised by an email backend. The dispatcher never lets these reach the
/// radio user: they collapse into a short failure reply.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Backend is missing settings it needs (host, address, credentials).
    #[error("email backend not configured: {0}")]
    Config(String),

    /// TCP/TLS connection to the mail server could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Server rejected the account credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Message could not be built or submitted.
    #[error("send failed: {0}")]
    Send(String),

    /// Mailbox selection, search or fetch failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Backend call exceeded the configured deadline.
    #[error("backend timed out after {0}s")]
    Timeout(u64),

    /// A blocking worker task panicked or was cancelled.
    #[error("internal error: {0}")]
    Task(String),
}

/// Errors raised while moving frames over the radio link.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serial")]
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// Frame exceeds what the link can carry as one radio message.
    #[error("frame of {len} bytes exceeds the {max}-byte link limit")]
    FrameTooLarge { len: usize, max: usize },

    /// The link has been closed (device gone or shutdown in progress).
    #[error("transport closed")]
    Closed,

    #[error("transport timed out")]
    Timeout,
}
