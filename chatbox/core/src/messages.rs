//! Chatbox Messages and Outcomes
//!
//! The two OSC addresses the chatbox understands, plus the outcome values
//! every public controller operation returns instead of an error.

use std::fmt;

use serde::Serialize;

use crate::transport::{OscArg, OscMessage};

/// Replace the displayed chatbox text: `[text, send_immediately, play_sound]`
pub const INPUT_ADDRESS: &str = "/chatbox/input";

/// Show or hide the typing indicator: `bool`
pub const TYPING_ADDRESS: &str = "/chatbox/typing";

/// A command for the chatbox, before encoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatboxCommand {
    /// Replace the displayed text
    Input {
        /// Full text, prefix included
        text: String,
        /// Skip the client's keyboard
        send_immediately: bool,
        /// Play the notification sound
        play_sound: bool,
    },
    /// Toggle the typing indicator
    Typing(bool),
}

impl ChatboxCommand {
    /// Input command with the given flags
    pub fn input(text: impl Into<String>, send_immediately: bool, play_sound: bool) -> Self {
        Self::Input {
            text: text.into(),
            send_immediately,
            play_sound,
        }
    }

    /// The empty frame that blanks the chatbox
    #[must_use]
    pub fn clear() -> Self {
        Self::input("", true, false)
    }

    /// Encode as an OSC message
    #[must_use]
    pub fn to_osc(&self) -> OscMessage {
        match self {
            Self::Input {
                text,
                send_immediately,
                play_sound,
            } => OscMessage::new(
                INPUT_ADDRESS,
                vec![
                    OscArg::Str(text.clone()),
                    OscArg::Bool(*send_immediately),
                    OscArg::Bool(*play_sound),
                ],
            ),
            Self::Typing(flag) => OscMessage::new(TYPING_ADDRESS, vec![OscArg::Bool(*flag)]),
        }
    }
}

/// A planned outbound message: every chunk is already prefixed and within budget
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundFrame {
    /// Generation this frame belongs to
    pub sequence_id: u64,
    /// Frames in transmit order
    pub chunks: Vec<String>,
}

impl OutboundFrame {
    /// Number of chunks
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether there is nothing to send
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Result of [`send_message`](crate::ChatboxTransport::send_message)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SendOutcome {
    /// A single frame was transmitted immediately
    Sent {
        /// Generation of the message
        sequence_id: u64,
    },
    /// Chunks are being sent in the background
    Scheduled {
        /// Generation of the message
        sequence_id: u64,
        /// Number of chunks planned
        chunks: usize,
    },
    /// The text was empty after sanitizing
    Empty,
    /// The transport is disabled or shut down
    Disabled,
    /// The single frame could not be transmitted
    Failed {
        /// Generation of the message
        sequence_id: u64,
        /// Transport error text
        reason: String,
    },
}

impl SendOutcome {
    /// Whether text reached (or is on its way to) the chatbox
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Sent { .. } | Self::Scheduled { .. })
    }

    /// Generation assigned to the message, if it reached the sequencer
    #[must_use]
    pub fn sequence_id(&self) -> Option<u64> {
        match self {
            Self::Sent { sequence_id }
            | Self::Scheduled { sequence_id, .. }
            | Self::Failed { sequence_id, .. } => Some(*sequence_id),
            Self::Empty | Self::Disabled => None,
        }
    }
}

/// Result of [`maybe_send_idle_ui`](crate::ChatboxTransport::maybe_send_idle_ui)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleDecision {
    /// The idle block was transmitted
    Sent,
    /// The transport is disabled or shut down
    Disabled,
    /// The idle block is turned off in configuration
    UiDisabled,
    /// The typing indicator is on
    Typing,
    /// A chunked send is still running
    SendInFlight,
    /// A message went out too recently
    RecentTraffic,
    /// The previous idle block is still fresh
    Throttled,
    /// The transmit failed
    Failed,
}

impl IdleDecision {
    /// Whether the idle block went out
    #[must_use]
    pub fn was_sent(self) -> bool {
        matches!(self, Self::Sent)
    }
}

impl fmt::Display for IdleDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sent => "sent",
            Self::Disabled => "disabled",
            Self::UiDisabled => "ui disabled",
            Self::Typing => "typing",
            Self::SendInFlight => "send in flight",
            Self::RecentTraffic => "recent traffic",
            Self::Throttled => "throttled",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of starting or stopping a marquee
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MarqueeOutcome {
    /// A new session is ticking
    Started {
        /// Session key
        key: String,
        /// Whether an older session under the same key was cancelled
        replaced: bool,
    },
    /// The session under the key was cancelled
    Stopped {
        /// Session key
        key: String,
    },
    /// No session existed under the key
    NotRunning {
        /// Session key
        key: String,
    },
    /// The transport is disabled or shut down
    Disabled,
    /// The session could not be started
    Failed {
        /// Session key
        key: String,
        /// Why it failed
        reason: String,
    },
}
