//! Chatbox Core - Budget-Constrained OSC Chatbox Transport
//!
//! This crate turns an AI companion's free-form, unbounded output into a
//! steady stream of OSC control messages for an in-world chatbox that shows
//! at most a few dozen words at a time. It knows nothing about where the text
//! comes from (LLM pipeline, speech, vision loops); hosts hand it strings and
//! lifecycle signals.
//!
//! # Architecture
//!
//! ```text
//!                               Host
//!    respond / send_message   on_speech_*   start_marquee   maybe_send_idle_ui
//!               │                  │              │                 │
//! ┌─────────────┼──────────────────┼──────────────┼─────────────────┼────┐
//! │             ▼                  ▼              ▼                 ▼    │
//! │       ┌───────────┐      ┌──────────┐   ┌───────────┐    ┌──────────┐ │
//! │       │ Sequencer │      │  Typing  │   │  Marquee  │    │   Idle   │ │
//! │       └─────┬─────┘      └────┬─────┘   └─────┬─────┘    └────┬─────┘ │
//! │             │    TextSanitizer · ChunkPlanner · AutoClear     │       │
//! │             └─────────────────┴──────┬───────┴────────────────┘       │
//! │                          transmit (budget enforced)                   │
//! └──────────────────────────────────────┼────────────────────────────────┘
//!                                        ▼
//!                        SendPrimitive (UDP / in-memory)
//!                       /chatbox/input    /chatbox/typing
//! ```
//!
//! # Key Types
//!
//! - [`ChatboxTransport`]: the controller; every public operation is infallible
//! - [`TransportConfig`] / [`ChatboxUiConfig`]: immutable configuration
//! - [`SendOutcome`], [`IdleDecision`], [`MarqueeOutcome`]: operation results
//! - [`ChatboxStatus`]: point-in-time snapshot
//! - [`SendPrimitive`]: the outbound seam ([`UdpSender`], [`InMemorySender`])
//!
//! # Quick Start
//!
//! ```ignore
//! use chatbox_core::{ChatboxTransport, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let chatbox = ChatboxTransport::connect(TransportConfig::from_env());
//!
//!     chatbox.on_speech_start();
//!     chatbox.respond("Hello! I can see you waving.").await;
//!     chatbox.on_speech_end();
//!
//!     chatbox.shutdown().await;
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`text`]: sanitizing, chunk planning and truncation
//! - [`transport`]: OSC codec, send primitives, transport configuration
//! - [`config`]: TOML/env/CLI configuration loading
//! - [`messages`]: OSC addresses, commands and outcome values
//! - [`template`]: whitelisted placeholder templates for the idle block
//! - [`collaborators`]: avatar name and local clock lookups
//! - [`state`] / [`status`]: shared transport state and its snapshot

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collaborators;
pub mod config;
mod controller;
pub mod messages;
pub mod state;
pub mod status;
pub mod template;
pub mod text;
pub mod transport;

// Re-exports for convenience
pub use collaborators::{AvatarNameSource, FileAvatarSource, LocalClock, SystemClock};
pub use controller::{
    plan_frame, ChatboxTransport, MarqueeCursor, MarqueeLayout, MarqueeOptions, MarqueeSource,
    MarqueeTick, TransportBuilder, MIN_MARQUEE_INTERVAL,
};
pub use messages::{
    ChatboxCommand, IdleDecision, MarqueeOutcome, OutboundFrame, SendOutcome, INPUT_ADDRESS,
    TYPING_ADDRESS,
};
pub use state::TransportState;
pub use status::ChatboxStatus;
pub use template::TemplateError;
pub use text::TextSanitizer;
pub use transport::{
    ChatboxUiConfig, InMemorySender, MarqueeMode, SendPrimitive, TransportConfig,
    TransportError, UdpSender,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ChatboxConfigFile,
    ChatboxConfigToml, ConfigError, ConfigOverrides, ConfigSource,
};
