//! # Configuration Management Module
//!
//! Typed, TOML-backed configuration for the gateway.
//!
//! ## Configuration Structure
//!
//! - [`GatewayConfig`] - Frame size and startup behaviour of the command gateway
//! - [`MeshtasticConfig`] - Serial device settings for the radio
//! - [`EmailConfig`] - Mail account, SMTP/IMAP endpoints and backend deadline
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use meshmail::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Serial Port: {}", config.meshtastic.port);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [gateway]
//! name = "meshmail gateway"
//! max_frame_len = 500
//! startup_delay_ms = 2000
//!
//! [meshtastic]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! min_send_gap_ms = 2000
//!
//! [email]
//! backend = "imap_smtp"
//! address = "you@example.com"
//! smtp_host = "smtp.gmail.com"
//! smtp_port = 587
//! imap_host = "imap.gmail.com"
//! imap_port = 993
//!
//! [logging]
//! level = "info"
//! file = "meshmail.log"
//! ```
//!
//! ## Environment Integration
//!
//! The account password may be supplied through `MESHMAIL_EMAIL_PASSWORD` instead of the
//! file. Precedence: CLI args > Environment > Config file > Defaults.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::fs;

/// Environment variable that overrides `email.password`.
pub const PASSWORD_ENV: &str = "MESHMAIL_EMAIL_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub meshtastic: MeshtasticConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_name")]
    pub name: String,
    /// Maximum characters per outbound radio frame.
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
    /// Settle delay before the startup self-check is sent (ms).
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
}

fn default_gateway_name() -> String {
    "meshmail gateway".to_string()
}

fn default_max_frame_len() -> usize {
    500
}

fn default_startup_delay_ms() -> u64 {
    2000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: default_gateway_name(),
            max_frame_len: default_max_frame_len(),
            startup_delay_ms: default_startup_delay_ms(),
        }
    }
}

impl GatewayConfig {
    /// Frame size as the chunker wants it. Falls back to the default when zero;
    /// [`Config::validate`] rejects zero before the gateway ever starts.
    pub fn frame_len(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_frame_len)
            .or_else(|| NonZeroUsize::new(default_max_frame_len()))
            .unwrap_or(NonZeroUsize::MIN)
    }

    /// Lower `max_frame_len` to `max_chars` when a transport cannot carry more.
    /// Returns true when the value was changed.
    pub fn limit_frame_len(&mut self, max_chars: usize) -> bool {
        if self.max_frame_len > max_chars {
            self.max_frame_len = max_chars;
            return true;
        }
        false
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshtasticConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Minimum gap between consecutive text sends on the serial link (ms).
    #[serde(default)]
    pub min_send_gap_ms: Option<u64>,
}

impl Default for MeshtasticConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
            min_send_gap_ms: Some(2000),
        }
    }
}

impl MeshtasticConfig {
    pub fn send_gap(&self) -> Duration {
        Duration::from_millis(self.min_send_gap_ms.unwrap_or(2000))
    }
}

/// Which email backend the gateway talks to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// SMTP submission + IMAP mailbox (requires the `email` feature).
    #[default]
    ImapSmtp,
    /// In-memory mailbox; sent mail shows up in the inbox.
    Loopback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Account address; used as login name and `From` header.
    pub address: String,
    /// Account (app) password. Prefer the environment override.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub imap_host: String,
    pub imap_port: u16,
    #[serde(default = "default_mailbox")]
    pub mailbox: String,
    /// Number of messages fetched by GETMAILS.
    #[serde(default = "default_fetch_count")]
    pub fetch_count: usize,
    /// Deadline for any single backend call (seconds).
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

fn default_fetch_count() -> usize {
    10
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::ImapSmtp,
            address: "your-email@gmail.com".to_string(),
            password: String::new(),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            imap_host: "imap.gmail.com".to_string(),
            imap_port: 993,
            mailbox: default_mailbox(),
            fetch_count: default_fetch_count(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl EmailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("meshmail.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a file, apply environment overrides and validate.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let mut config = Self::from_toml_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(pass) = std::env::var(PASSWORD_ENV) {
            if !pass.is_empty() {
                self.email.password = pass;
            }
        }
    }

    /// Reject values that would leave the gateway unable to reply.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.max_frame_len == 0 {
            bail!("gateway.max_frame_len must be greater than zero");
        }
        if self.email.fetch_count == 0 {
            bail!("email.fetch_count must be greater than zero");
        }
        if self.email.timeout_seconds == 0 {
            bail!("email.timeout_seconds must be greater than zero");
        }
        if self.meshtastic.baud_rate == 0 {
            bail!("meshtastic.baud_rate must be greater than zero");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gateway: GatewayConfig::default(),
            meshtastic: MeshtasticConfig::default(),
            email: EmailConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
