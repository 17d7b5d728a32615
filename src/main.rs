//! Binary entrypoint for the Meshmail CLI.
//!
//! Commands:
//! - `start [--port <path>]` - run the gateway on a Meshtastic serial device
//! - `console [--loopback]` - run the gateway on stdin/stdout instead of a radio
//! - `init` - write a starter `config.toml`
//! - `check` - validate the configuration and print a JSON summary (no secrets)
//!
//! See the library crate docs for module-level details: `meshmail::`.
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::sync::Arc;

use meshmail::config::{BackendKind, Config, PASSWORD_ENV};
use meshmail::email::{EmailBackend, LoopbackMailbox};
use meshmail::gateway::MailGateway;
use meshmail::transport::console::ConsoleTransport;

#[derive(Parser)]
#[command(name = "meshmail")]
#[command(about = "An email gateway for Meshtastic mesh networks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway on a Meshtastic device
    Start {
        /// Meshtastic device port (e.g., /dev/ttyUSB0); overrides the config file
        #[arg(short, long)]
        port: Option<String>,
    },
    /// Run the gateway against stdin/stdout, one line per radio message
    Console {
        /// Use the in-memory loopback mailbox instead of the configured backend
        #[arg(long)]
        loopback: bool,
    },
    /// Write a default configuration file
    Init,
    /// Validate the configuration and print a summary
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start { port } => {
            let mut config = match pre_config {
                Some(cfg) => cfg,
                None => Config::load(&cli.config).await?,
            };
            if let Some(port) = port {
                config.meshtastic.port = port;
            }
            info!("Starting Meshmail v{}", env!("CARGO_PKG_VERSION"));
            run_serial(config).await?;
        }
        Commands::Console { loopback } => {
            let mut config = match pre_config {
                Some(cfg) => cfg,
                None => Config::load(&cli.config).await?,
            };
            if loopback {
                config.email.backend = BackendKind::Loopback;
            }
            let backend = build_backend(&config)?;
            let (transport, inbound) = ConsoleTransport::open();
            info!("Console gateway ready; type commands, one per line");
            MailGateway::new(config, Box::new(transport), inbound, backend)
                .run()
                .await?;
        }
        Commands::Init => {
            info!("Initializing new gateway configuration");
            if std::path::Path::new(&cli.config).exists() {
                bail!("{} already exists; refusing to overwrite", cli.config);
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
            println!("Created {}", cli.config);
            println!(
                "Edit the [email] section, then export {} with your app password.",
                PASSWORD_ENV
            );
        }
        Commands::Check => {
            let config = match pre_config {
                Some(cfg) => cfg,
                None => Config::load(&cli.config).await?,
            };
            let backend_ready = match build_backend(&config) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Email backend not usable: {}", e);
                    false
                }
            };
            let summary = serde_json::json!({
                "config": cli.config,
                "version": env!("CARGO_PKG_VERSION"),
                "gateway": {
                    "name": config.gateway.name,
                    "max_frame_len": config.gateway.max_frame_len,
                    "startup_delay_ms": config.gateway.startup_delay_ms,
                },
                "meshtastic": {
                    "port": config.meshtastic.port,
                    "baud_rate": config.meshtastic.baud_rate,
                    "min_send_gap_ms": config.meshtastic.send_gap().as_millis() as u64,
                    "serial_support": cfg!(feature = "serial"),
                },
                "email": {
                    "backend": config.email.backend,
                    "address": config.email.address,
                    "smtp": format!("{}:{}", config.email.smtp_host, config.email.smtp_port),
                    "imap": format!("{}:{}", config.email.imap_host, config.email.imap_port),
                    "mailbox": config.email.mailbox,
                    "password_set": !config.email.password.is_empty(),
                    "fetch_count": config.email.fetch_count,
                    "timeout_seconds": config.email.timeout_seconds,
                    "backend_ready": backend_ready,
                },
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

#[cfg(feature = "serial")]
async fn run_serial(mut config: Config) -> Result<()> {
    use meshmail::transport::serial::SerialTextTransport;

    let max_chars = SerialTextTransport::max_frame_chars();
    let requested = config.gateway.max_frame_len;
    if config.gateway.limit_frame_len(max_chars) {
        warn!(
            "gateway.max_frame_len {} exceeds what one TEXTMSG payload can carry; using {}",
            requested, max_chars
        );
    }
    let backend = build_backend(&config)?;
    let (transport, inbound) = SerialTextTransport::open(
        &config.meshtastic.port,
        config.meshtastic.baud_rate,
        config.meshtastic.send_gap(),
    )
    .await?;
    info!("Connected to Meshtastic device on {}", config.meshtastic.port);
    MailGateway::new(config, Box::new(transport), inbound, backend)
        .run()
        .await
}

#[cfg(not(feature = "serial"))]
async fn run_serial(_config: Config) -> Result<()> {
    bail!("serial support not compiled in; rebuild with --features serial or use `console`")
}

fn build_backend(config: &Config) -> Result<Arc<dyn EmailBackend>> {
    match config.email.backend {
        BackendKind::Loopback => {
            info!("Using loopback mailbox for {}", config.email.address);
            Ok(Arc::new(LoopbackMailbox::new(config.email.address.clone())))
        }
        #[cfg(feature = "email")]
        BackendKind::ImapSmtp => {
            let backend = meshmail::email::ImapSmtpBackend::new(config.email.clone())?;
            info!(
                "Using IMAP/SMTP backend for {} ({} / {})",
                config.email.address, config.email.smtp_host, config.email.imap_host
            );
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "email"))]
        BackendKind::ImapSmtp => {
            bail!("imap_smtp backend not compiled in; rebuild with --features email")
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.clone())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let file = std::sync::Mutex::new(f);
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
