//! Status Snapshot
//!
//! A point-in-time read of a transport, for hosts, logs and the idle-gaze
//! style "is the agent busy?" decision.

use std::time::Duration;

use serde::{Serialize, Serializer};
use tokio::time::Instant;

/// Gap after the last message during which the chatbox counts as busy
pub const RECENT_TRAFFIC_WINDOW: Duration = Duration::from_millis(400);

/// Snapshot returned by [`get_status`](crate::ChatboxTransport::get_status)
#[derive(Clone, Debug, Serialize)]
pub struct ChatboxStatus {
    /// Transport accepted its configuration and target
    pub enabled: bool,
    /// A send primitive is attached
    pub connected: bool,
    /// Target host
    pub host: String,
    /// Target port
    pub port: u16,
    /// Last typing indicator value sent
    pub is_typing: bool,
    /// Last conversational or idle transmit (serialized as seconds ago)
    #[serde(serialize_with = "serialize_age")]
    pub last_message_time: Option<Instant>,
    /// Last speech end (serialized as seconds ago)
    #[serde(serialize_with = "serialize_age")]
    pub last_speech_end_time: Option<Instant>,
    /// Per-message character limit
    pub max_length: usize,
    /// Message prefix
    pub prefix: String,
    /// Current message generation
    pub current_sequence_id: u64,
    /// A chunked send is still running
    pub has_active_send_task: bool,
    /// Number of running marquee sessions
    pub active_marquees: usize,
}

fn serialize_age<S: Serializer>(value: &Option<Instant>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(at) => serializer.serialize_some(&at.elapsed().as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

impl ChatboxStatus {
    /// Whether the agent is idle enough for ambient behavior
    ///
    /// - a disabled transport never blocks anything, so it counts as idle
    /// - within `cooldown` of the last speech end the agent is busy
    /// - typing or a running chunked send means busy
    /// - a message within the last 0.4 s means busy
    #[must_use]
    pub fn is_agent_idle(&self, now: Instant, cooldown: Duration) -> bool {
        if !self.enabled {
            return true;
        }
        if let Some(ended) = self.last_speech_end_time {
            if now.saturating_duration_since(ended) < cooldown {
                return false;
            }
        }
        if self.is_typing || self.has_active_send_task {
            return false;
        }
        if let Some(sent) = self.last_message_time {
            if now.saturating_duration_since(sent) < RECENT_TRAFFIC_WINDOW {
                return false;
            }
        }
        true
    }
}
