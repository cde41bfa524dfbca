//! Chatbox Relay - drive an OSC chatbox from stdin
//!
//! Reads one line at a time and hands it to the chatbox transport. Plain lines
//! are agent responses; slash commands control typing, speech boundaries,
//! the two-pane marquee and the idle block (see `/status` for a snapshot).
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 127.0.0.1:9000, config from $XDG_CONFIG_HOME/osc-chatbox/chatbox.toml
//! chatbox-relay
//!
//! # Another target and prefix
//! chatbox-relay --host 192.168.1.20 --port 9000 --prefix "[Hoppou] "
//!
//! # Idle status block on, paginated marquee
//! chatbox-relay --idle-ui --marquee-mode paginate
//!
//! # Pipe an agent into it
//! my-agent | chatbox-relay --config ./chatbox.toml
//!
//! # Verbose logging
//! RUST_LOG=debug chatbox-relay
//! ```
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: graceful shutdown (same as end of input)

mod command;
mod relay;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info, warn};

use chatbox_core::{
    load_config, load_config_from_path, ChatboxConfigFile, ChatboxTransport, ConfigOverrides,
    MarqueeMode,
};

use relay::Relay;

/// Chatbox Relay - line-oriented driver for an OSC chatbox
#[derive(Parser, Debug)]
#[command(name = "chatbox-relay")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "CHATBOX_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// OSC target host
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// OSC target port
    #[arg(short = 'p', long, value_name = "PORT")]
    port: Option<u16>,

    /// Prefix prepended to every message
    #[arg(long, value_name = "TEXT")]
    prefix: Option<String>,

    /// Per-message character limit
    #[arg(long, value_name = "CHARS")]
    max_length: Option<usize>,

    /// Show the idle status block
    #[arg(long)]
    idle_ui: bool,

    /// Marquee mode (scroll or paginate)
    #[arg(long, value_name = "MODE")]
    marquee_mode: Option<String>,

    /// Seconds between idle block checks
    #[arg(long, default_value_t = 5.0, value_name = "SECS")]
    idle_poll: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "CHATBOX_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref host) = self.host {
            overrides = overrides.with_host(host.clone());
        }
        if let Some(port) = self.port {
            overrides = overrides.with_port(port);
        }
        if let Some(ref prefix) = self.prefix {
            overrides = overrides.with_prefix(prefix.clone());
        }
        if let Some(max_length) = self.max_length {
            overrides = overrides.with_max_length(max_length);
        }
        if self.idle_ui {
            overrides = overrides.with_ui_enabled(true);
        }
        if let Some(ref mode) = self.marquee_mode {
            overrides = overrides.with_marquee_mode(MarqueeMode::parse(mode));
        }
        overrides
    }

    fn idle_poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.idle_poll).unwrap_or(Duration::from_secs(5))
    }
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("chatbox_relay={level},chatbox_core={level}"))
    });

    // stdout carries command output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file (explicit path or default location), then apply CLI overrides
fn resolve_config(args: &Args) -> Result<ChatboxConfigFile> {
    let mut config = match args.config {
        Some(ref path) => load_config_from_path(Some(path.clone()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => load_config().context("Failed to load config")?,
    };
    args.overrides().apply(&mut config);
    Ok(config)
}

/// Resolves on SIGTERM or Ctrl-C
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
                    result = tokio::signal::ctrl_c() => match result {
                        Ok(()) => info!("Received SIGINT, initiating shutdown"),
                        Err(e) => warn!(error = %e, "Failed to listen for SIGINT"),
                    },
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, initiating shutdown"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C, relying on end of input");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!("Chatbox relay starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(&args)?;
    info!(
        source = %config.source(),
        path = ?config.config_file_path,
        "Configuration resolved"
    );

    let chatbox = ChatboxTransport::connect(config.into_transport());
    if !chatbox.is_operational() {
        warn!("Chatbox transport is disabled, input will be read and ignored");
    }

    let relay = Relay::new(chatbox, args.idle_poll_interval());
    let input = BufReader::new(tokio::io::stdin());
    let result = relay
        .run(input, tokio::io::stdout(), wait_for_shutdown())
        .await;

    match result {
        Ok(()) => {
            info!("Chatbox relay stopped cleanly");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Relay stopped with error");
            Err(e)
        }
    }
}
