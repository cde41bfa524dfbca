//! TOML Configuration File Support
//!
//! Centralized configuration loading for the chatbox transport, supporting a
//! TOML configuration file at `~/.config/osc-chatbox/chatbox.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`CHATBOX_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/osc-chatbox/chatbox.toml` (typically `~/.config/osc-chatbox/chatbox.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [osc]
//! enabled = true
//! host = "127.0.0.1"
//! port = 9000
//!
//! [chatbox]
//! max_length = 144
//! prefix = "[Gabriel] "
//! auto_clear_delay = 10.0
//! enable_typing_indicator = true
//!
//! [filter]
//! strip_markdown = true
//! split_long_messages = true
//! message_delay = 2.0
//!
//! [chatbox_ui]
//! enabled = true
//! idle_refresh_seconds = 30
//! marquee_mode = "paginate"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |---|---|
//! | `CHATBOX_ENABLED` | `enabled` |
//! | `CHATBOX_HOST` / `CHATBOX_PORT` | OSC target |
//! | `CHATBOX_MAX_LENGTH` | `max_length` |
//! | `CHATBOX_PREFIX` | `prefix` |
//! | `CHATBOX_MESSAGE_DELAY` | `message_delay` (seconds) |
//! | `CHATBOX_AUTO_CLEAR_DELAY` | `auto_clear_delay` (seconds) |
//! | `CHATBOX_TYPING_INDICATOR` | `enable_typing_indicator` |
//! | `CHATBOX_UI_ENABLED` | `ui.enabled` |
//! | `CHATBOX_MARQUEE_MODE` | `ui.marquee_mode` |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::config::{duration_from_secs, MarqueeMode, TransportConfig};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the active configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[osc]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OscToml {
    /// Master switch
    pub enabled: Option<bool>,
    /// Target host
    pub host: Option<String>,
    /// Target port
    pub port: Option<u16>,
}

/// `[chatbox]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatboxToml {
    /// Per-message character limit
    pub max_length: Option<usize>,
    /// Show text immediately instead of opening the keyboard
    pub send_immediately: Option<bool>,
    /// Play the notification sound
    pub notification_sound: Option<bool>,
    /// Auto-clear delay in seconds (0 disables)
    pub auto_clear_delay: Option<f64>,
    /// Message prefix
    pub prefix: Option<String>,
    /// Drive the typing indicator
    pub enable_typing_indicator: Option<bool>,
    /// Typing lead-in before agent responses, in seconds
    pub typing_lead_in: Option<f64>,
}

/// `[filter]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterToml {
    /// Strip markdown markers
    pub strip_markdown: Option<bool>,
    /// Drop non-word characters
    pub remove_special_chars: Option<bool>,
    /// Split long messages into chunks
    pub split_long_messages: Option<bool>,
    /// Pause between chunks in seconds
    pub message_delay: Option<f64>,
}

/// `[chatbox_ui]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatboxUiToml {
    /// Show the idle status block
    pub enabled: Option<bool>,
    /// Seconds between idle blocks
    pub idle_refresh_seconds: Option<f64>,
    /// Append the timezone to the clock line
    pub show_timezone: Option<bool>,
    /// Title line
    pub title: Option<String>,
    /// Divider line
    pub divider: Option<String>,
    /// Prompt line
    pub prompt_line: Option<String>,
    /// Idle block template
    pub message_template: Option<String>,
    /// Route thinking/final text through the marquee
    pub two_part_enabled: Option<bool>,
    /// Marquee tick interval in seconds
    pub marquee_interval_seconds: Option<f64>,
    /// Marquee window in characters
    pub marquee_window_chars: Option<i64>,
    /// Scroll advance per tick
    pub marquee_scroll_step: Option<i64>,
    /// `scroll` or `paginate`
    pub marquee_mode: Option<String>,
    /// Empty ticks before falling back to the idle block
    pub empty_ticks_to_idle: Option<u32>,
    /// Seconds after speech during which the agent is considered busy
    pub idle_cooldown_after_speech: Option<f64>,
}

/// Complete TOML configuration file structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatboxConfigToml {
    /// OSC target
    pub osc: OscToml,
    /// Chatbox behavior
    pub chatbox: ChatboxToml,
    /// Text filtering
    pub filter: FilterToml,
    /// Idle block and marquee
    pub chatbox_ui: ChatboxUiToml,
}

// =============================================================================
// Loaded Configuration
// =============================================================================

/// Configuration resolved from every source
#[derive(Clone, Debug)]
pub struct ChatboxConfigFile {
    /// The resolved transport configuration
    pub transport: TransportConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ChatboxConfigFile {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ChatboxConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Consume into the transport configuration, clamped to usable values
    #[must_use]
    pub fn into_transport(self) -> TransportConfig {
        self.transport.normalized()
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/osc-chatbox/chatbox.toml` or
/// `~/.config/osc-chatbox/chatbox.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("osc-chatbox").join("chatbox.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI overrides are not handled here; apply [`ConfigOverrides`] afterwards.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read, parsed or
/// validated. A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<ChatboxConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read, parsed or
/// validated.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ChatboxConfigFile, ConfigError> {
    let mut config = ChatboxConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config = parse_toml(&toml_content)?;
            apply_toml_config(&mut config.transport, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    if apply_env_config(&mut config.transport) {
        config.source = ConfigSource::Env;
    }

    Ok(config)
}

/// Parse and validate TOML configuration text
///
/// # Errors
///
/// - `ParseError` for malformed TOML or wrongly typed values
/// - `ValidationError` for `max_length = 0` or a negative duration
pub fn parse_toml(content: &str) -> Result<ChatboxConfigToml, ConfigError> {
    let toml_config: ChatboxConfigToml = toml::from_str(content)?;
    validate_toml(&toml_config)?;
    Ok(toml_config)
}

fn validate_toml(toml: &ChatboxConfigToml) -> Result<(), ConfigError> {
    if toml.chatbox.max_length == Some(0) {
        return Err(ConfigError::ValidationError(
            "chatbox.max_length must be greater than 0".to_string(),
        ));
    }
    if toml.osc.port == Some(0) {
        return Err(ConfigError::ValidationError(
            "osc.port must be greater than 0".to_string(),
        ));
    }

    let durations = [
        ("chatbox.auto_clear_delay", toml.chatbox.auto_clear_delay),
        ("chatbox.typing_lead_in", toml.chatbox.typing_lead_in),
        ("filter.message_delay", toml.filter.message_delay),
        ("chatbox_ui.idle_refresh_seconds", toml.chatbox_ui.idle_refresh_seconds),
        (
            "chatbox_ui.marquee_interval_seconds",
            toml.chatbox_ui.marquee_interval_seconds,
        ),
        (
            "chatbox_ui.idle_cooldown_after_speech",
            toml.chatbox_ui.idle_cooldown_after_speech,
        ),
    ];
    for (name, value) in durations {
        if let Some(secs) = value {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a non-negative number of seconds, got {secs}"
                )));
            }
        }
    }
    Ok(())
}

fn clamp_count(value: i64) -> usize {
    usize::try_from(value.max(1)).unwrap_or(1)
}

/// Apply TOML configuration values to the transport config
fn apply_toml_config(config: &mut TransportConfig, toml: &ChatboxConfigToml) {
    // OSC target
    if let Some(enabled) = toml.osc.enabled {
        config.enabled = enabled;
    }
    if let Some(ref host) = toml.osc.host {
        config.host = host.clone();
    }
    if let Some(port) = toml.osc.port {
        config.port = port;
    }

    // Chatbox behavior
    if let Some(max_length) = toml.chatbox.max_length {
        config.max_length = max_length;
    }
    if let Some(flag) = toml.chatbox.send_immediately {
        config.send_immediately = flag;
    }
    if let Some(flag) = toml.chatbox.notification_sound {
        config.notification_sound = flag;
    }
    if let Some(secs) = toml.chatbox.auto_clear_delay {
        config.auto_clear_delay = duration_from_secs(secs);
    }
    if let Some(ref prefix) = toml.chatbox.prefix {
        config.prefix = prefix.clone();
    }
    if let Some(flag) = toml.chatbox.enable_typing_indicator {
        config.enable_typing_indicator = flag;
    }
    if let Some(secs) = toml.chatbox.typing_lead_in {
        config.typing_lead_in = duration_from_secs(secs);
    }

    // Filtering
    if let Some(flag) = toml.filter.strip_markdown {
        config.strip_markdown = flag;
    }
    if let Some(flag) = toml.filter.remove_special_chars {
        config.remove_special_chars = flag;
    }
    if let Some(flag) = toml.filter.split_long_messages {
        config.split_long_messages = flag;
    }
    if let Some(secs) = toml.filter.message_delay {
        config.message_delay = duration_from_secs(secs);
    }

    // Idle block and marquee
    let ui = &toml.chatbox_ui;
    if let Some(flag) = ui.enabled {
        config.ui.enabled = flag;
    }
    if let Some(secs) = ui.idle_refresh_seconds {
        config.ui.idle_refresh = duration_from_secs(secs);
    }
    if let Some(flag) = ui.show_timezone {
        config.ui.show_timezone = flag;
    }
    if let Some(ref title) = ui.title {
        config.ui.title = title.clone();
    }
    if let Some(ref divider) = ui.divider {
        config.ui.divider = divider.clone();
    }
    if let Some(ref prompt) = ui.prompt_line {
        config.ui.prompt_line = prompt.clone();
    }
    if ui.message_template.is_some() {
        config.ui.message_template = ui.message_template.clone();
    }
    if let Some(flag) = ui.two_part_enabled {
        config.ui.two_part_enabled = flag;
    }
    if let Some(secs) = ui.marquee_interval_seconds {
        config.ui.marquee_interval = duration_from_secs(secs);
    }
    if let Some(window) = ui.marquee_window_chars {
        config.ui.marquee_window_chars = clamp_count(window);
    }
    if let Some(step) = ui.marquee_scroll_step {
        config.ui.marquee_scroll_step = clamp_count(step);
    }
    if let Some(ref mode) = ui.marquee_mode {
        config.ui.marquee_mode = MarqueeMode::parse(mode);
    }
    if let Some(ticks) = ui.empty_ticks_to_idle {
        config.ui.empty_ticks_to_idle = ticks;
    }
    if let Some(secs) = ui.idle_cooldown_after_speech {
        config.ui.idle_cooldown_after_speech = duration_from_secs(secs);
    }
}

fn parse_flag(value: &str) -> bool {
    value != "0" && value.to_lowercase() != "false"
}

/// Apply `CHATBOX_*` environment variable overrides
///
/// Returns true if any variable was applied.
pub(crate) fn apply_env_config(config: &mut TransportConfig) -> bool {
    apply_env_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup
fn apply_env_from<F>(config: &mut TransportConfig, lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = false;

    if let Some(enabled) = lookup("CHATBOX_ENABLED") {
        config.enabled = parse_flag(&enabled);
        applied = true;
    }
    if let Some(host) = lookup("CHATBOX_HOST") {
        config.host = host;
        applied = true;
    }
    if let Some(port) = lookup("CHATBOX_PORT") {
        if let Ok(port) = port.parse::<u16>() {
            config.port = port;
            applied = true;
        }
    }
    if let Some(max_length) = lookup("CHATBOX_MAX_LENGTH") {
        if let Ok(n) = max_length.parse::<usize>() {
            if n > 0 {
                config.max_length = n;
                applied = true;
            }
        }
    }
    if let Some(prefix) = lookup("CHATBOX_PREFIX") {
        config.prefix = prefix;
        applied = true;
    }
    if let Some(delay) = lookup("CHATBOX_MESSAGE_DELAY") {
        if let Ok(secs) = delay.parse::<f64>() {
            config.message_delay = duration_from_secs(secs);
            applied = true;
        }
    }
    if let Some(delay) = lookup("CHATBOX_AUTO_CLEAR_DELAY") {
        if let Ok(secs) = delay.parse::<f64>() {
            config.auto_clear_delay = duration_from_secs(secs);
            applied = true;
        }
    }
    if let Some(enabled) = lookup("CHATBOX_TYPING_INDICATOR") {
        config.enable_typing_indicator = parse_flag(&enabled);
        applied = true;
    }
    if let Some(enabled) = lookup("CHATBOX_UI_ENABLED") {
        config.ui.enabled = parse_flag(&enabled);
        applied = true;
    }
    if let Some(mode) = lookup("CHATBOX_MARQUEE_MODE") {
        config.ui.marquee_mode = MarqueeMode::parse(&mode);
        applied = true;
    }

    applied
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// OSC host override
    pub host: Option<String>,

    /// OSC port override
    pub port: Option<u16>,

    /// Prefix override
    pub prefix: Option<String>,

    /// Character limit override
    pub max_length: Option<usize>,

    /// Idle block override
    pub ui_enabled: Option<bool>,

    /// Marquee mode override
    pub marquee_mode: Option<MarqueeMode>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set host override
    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    /// Set port override
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set prefix override
    #[must_use]
    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Set character limit override
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set idle block override
    #[must_use]
    pub fn with_ui_enabled(mut self, enabled: bool) -> Self {
        self.ui_enabled = Some(enabled);
        self
    }

    /// Set marquee mode override
    #[must_use]
    pub fn with_marquee_mode(mut self, mode: MarqueeMode) -> Self {
        self.marquee_mode = Some(mode);
        self
    }

    fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.prefix.is_none()
            && self.max_length.is_none()
            && self.ui_enabled.is_none()
            && self.marquee_mode.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ChatboxConfigFile) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        let transport = &mut config.transport;
        if let Some(ref host) = self.host {
            transport.host = host.clone();
        }
        if let Some(port) = self.port {
            transport.port = port;
        }
        if let Some(ref prefix) = self.prefix {
            transport.prefix = prefix.clone();
        }
        if let Some(max_length) = self.max_length {
            transport.max_length = max_length.max(1);
        }
        if let Some(enabled) = self.ui_enabled {
            transport.ui.enabled = enabled;
        }
        if let Some(mode) = self.marquee_mode {
            transport.ui.marquee_mode = mode;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
