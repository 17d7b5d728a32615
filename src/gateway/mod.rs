//! # Gateway Core Module
//!
//! Turns inbound radio text into email operations and radio-sized replies.
//!
//! ## Components
//!
//! - [`parser`] - Text to [`Command`] recognition
//! - [`dispatcher`] - Executes a command against the email backend and the session
//! - [`session`] - Fetched messages, page cursor and reply rendering
//! - [`chunker`] - Splits replies into frames no longer than the radio allows
//! - [`server`] - [`MailGateway`], the single-consumer driver tying it together
//!
//! ## Flow
//!
//! ```text
//! radio text ─▶ CommandParser ─▶ Dispatcher ─▶ reply ─▶ chunk ─▶ Transport
//!                                   │    ▲
//!                                   ▼    │
//!                          EmailBackend  SessionState
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshmail::config::Config;
//! use meshmail::email::LoopbackMailbox;
//! use meshmail::gateway::MailGateway;
//! use meshmail::transport::console::ConsoleTransport;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let (transport, inbound) = ConsoleTransport::open();
//!     let backend = Arc::new(LoopbackMailbox::new(config.email.address.clone()));
//!     let mut gateway = MailGateway::new(config, Box::new(transport), inbound, backend);
//!     gateway.run().await
//! }
//! ```

pub mod chunker;
pub mod dispatcher;
pub mod parser;
pub mod server;
pub mod session;

pub use chunker::chunk;
pub use dispatcher::Dispatcher;
pub use parser::{Command, CommandParser};
pub use server::MailGateway;
pub use session::SessionState;
