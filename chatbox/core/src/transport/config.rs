//! Transport Configuration
//!
//! Configuration types for the chatbox transport. Values are fixed once a
//! [`ChatboxTransport`](crate::ChatboxTransport) is constructed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::text::{char_len, TextSanitizer};

/// How the marquee renders text that does not fit its pane
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarqueeMode {
    /// Circular sliding window, advancing a few characters per tick
    Scroll,
    /// Whole pages cut at sentence/word boundaries, one page per tick
    #[default]
    Paginate,
}

impl MarqueeMode {
    /// Parse a mode name
    ///
    /// Anything other than `paginate` selects scrolling.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "paginate" | "pages" | "page" => Self::Paginate,
            _ => Self::Scroll,
        }
    }

    /// Mode name as used in configuration files
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Paginate => "paginate",
        }
    }
}

impl std::fmt::Display for MarqueeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Idle status block and marquee settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatboxUiConfig {
    /// Whether the idle status block is shown at all
    pub enabled: bool,

    /// Minimum time between two idle status blocks
    pub idle_refresh: Duration,

    /// Append the timezone to the local time line
    pub show_timezone: bool,

    /// First line of the idle block
    pub title: String,

    /// Divider line (also separates the marquee panes)
    pub divider: String,

    /// Call-to-action line of the idle block
    pub prompt_line: String,

    /// Optional idle block template
    ///
    /// Placeholders: `{title}`, `{time}`, `{divider}`, `{prompt_line}`,
    /// `{active_time}`, `{avatar}`. `{{` and `}}` are literal braces.
    pub message_template: Option<String>,

    /// Whether hosts should route thinking/final text through the marquee
    pub two_part_enabled: bool,

    /// Default marquee tick interval
    pub marquee_interval: Duration,

    /// Default marquee window in characters (scroll mode)
    pub marquee_window_chars: usize,

    /// Characters the scroll window advances per tick
    pub marquee_scroll_step: usize,

    /// Marquee rendering mode
    pub marquee_mode: MarqueeMode,

    /// Consecutive empty ticks before a marquee hands over to the idle block
    pub empty_ticks_to_idle: u32,

    /// How long after speech ends the agent still counts as busy
    pub idle_cooldown_after_speech: Duration,
}

impl Default for ChatboxUiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            idle_refresh: Duration::from_secs(30),
            show_timezone: true,
            title: "Gabriel - Hoppou.ai".to_string(),
            divider: "-".repeat(45),
            prompt_line: "Ask Anything!".to_string(),
            message_template: None,
            two_part_enabled: false,
            marquee_interval: Duration::from_secs(1),
            marquee_window_chars: 40,
            marquee_scroll_step: 3,
            marquee_mode: MarqueeMode::Paginate,
            empty_ticks_to_idle: 2,
            idle_cooldown_after_speech: Duration::from_secs(30),
        }
    }
}

/// Chatbox transport configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Master switch; a disabled transport turns every operation into a no-op
    pub enabled: bool,

    /// OSC target host
    pub host: String,

    /// OSC target port (the client listens on 9000 by default)
    pub port: u16,

    /// Hard per-message character limit of the chatbox
    pub max_length: usize,

    /// Prepended to every conversational message
    pub prefix: String,

    /// Bypass the client's keyboard and show text immediately
    pub send_immediately: bool,

    /// Play the client's notification sound for conversational messages
    pub notification_sound: bool,

    /// Blank the chatbox this long after a message (zero disables)
    pub auto_clear_delay: Duration,

    /// Drive the typing indicator around speech
    pub enable_typing_indicator: bool,

    /// Remove markdown markers before sending
    pub strip_markdown: bool,

    /// Remove everything except word characters, whitespace and `.,!?;:-`
    pub remove_special_chars: bool,

    /// Split long messages into timed chunks (otherwise truncate)
    pub split_long_messages: bool,

    /// Pause between chunks of a split message
    pub message_delay: Duration,

    /// Typing indicator lead time before an agent response is sent
    pub typing_lead_in: Duration,

    /// Idle block and marquee settings
    pub ui: ChatboxUiConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 9000,
            max_length: 144,
            prefix: "[Gabriel] ".to_string(),
            send_immediately: true,
            notification_sound: true,
            auto_clear_delay: Duration::from_secs(10),
            enable_typing_indicator: true,
            strip_markdown: true,
            remove_special_chars: false,
            split_long_messages: true,
            message_delay: Duration::from_secs(2),
            typing_lead_in: Duration::from_millis(500),
            ui: ChatboxUiConfig::default(),
        }
    }
}

impl TransportConfig {
    /// Create configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from defaults plus `CHATBOX_*` environment variables
    ///
    /// See [`crate::config`] for the variable list.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        crate::config::apply_env_config(&mut config);
        config
    }

    /// Set the OSC target
    #[must_use]
    pub fn with_target(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Set the message prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the per-message character limit
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the delay between chunks
    #[must_use]
    pub fn with_message_delay(mut self, delay: Duration) -> Self {
        self.message_delay = delay;
        self
    }

    /// Set the auto-clear delay (zero disables)
    #[must_use]
    pub fn with_auto_clear_delay(mut self, delay: Duration) -> Self {
        self.auto_clear_delay = delay;
        self
    }

    /// Replace the UI settings
    #[must_use]
    pub fn with_ui(mut self, ui: ChatboxUiConfig) -> Self {
        self.ui = ui;
        self
    }

    /// Clamp values that would otherwise break the controller
    ///
    /// - `max_length` is at least 1
    /// - marquee window and scroll step are at least 1
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_length = self.max_length.max(1);
        self.ui.marquee_window_chars = self.ui.marquee_window_chars.max(1);
        self.ui.marquee_scroll_step = self.ui.marquee_scroll_step.max(1);
        self
    }

    /// Prefix length in characters
    #[must_use]
    pub fn prefix_len(&self) -> usize {
        char_len(&self.prefix)
    }

    /// Characters left for message text once the prefix is in place
    ///
    /// Never zero, even with an oversized prefix.
    #[must_use]
    pub fn text_budget(&self) -> usize {
        self.max_length.saturating_sub(self.prefix_len()).max(1)
    }

    /// Sanitizer configured from the filter settings
    #[must_use]
    pub fn sanitizer(&self) -> TextSanitizer {
        TextSanitizer::new(self.strip_markdown, self.remove_special_chars)
    }

    /// `host:port` label for logs and status
    #[must_use]
    pub fn target_label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Convert fractional seconds from configuration into a `Duration`
///
/// Negative, NaN and out-of-range values become zero.
pub(crate) fn duration_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::ZERO)
}
