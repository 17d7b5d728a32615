//! # Meshmail - Email Gateway for Meshtastic Networks
//!
//! Meshmail lets people on a Meshtastic mesh send and read email from a plain text
//! messaging app. A gateway node, attached to a host with internet access, listens
//! for short text commands, performs the email work over SMTP/IMAP, and answers with
//! replies cut to fit the radio's message size.
//!
//! ## Commands
//!
//! - `SENDEMAIL:to@example.com:Subject:Body` - send a plain-text email
//! - `GETMAILS` - fetch the most recent emails and show the first page
//! - `NEXT` - show the next page
//! - `CONTINUE` - read the email at the top of the current page
//! - `EXIT` / `HELP` - show the command list
//!
//! ## Quick Start
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
//!     MailGateway::new(config, Box::new(transport), inbound, backend)
//!         .run()
//!         .await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`gateway`] - Command parsing, dispatch, pagination, chunking and the driver loop
//! - [`email`] - Email backend trait plus SMTP/IMAP and loopback implementations
//! - [`transport`] - Radio transports (Meshtastic serial, console, in-memory)
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Typed errors for backends and transports
//! - [`logutil`] - Log-safe string escaping
//! - [`metrics`] - Process-wide counters

pub mod config;
pub mod email;
pub mod error;
pub mod gateway;
pub mod logutil;
pub mod metrics;
pub mod transport;
