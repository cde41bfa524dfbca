//! Shared Transport State
//!
//! One record per transport, written by the caller and by background tasks.
//! It sits behind a `parking_lot::Mutex` that is only held for reads and
//! compare-and-update steps, never across a send or a sleep.

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Mutable state of a chatbox transport
#[derive(Debug)]
pub struct TransportState {
    /// Monotonic message generation
    pub sequence_id: u64,

    /// Background chunk sender for the current generation
    pub active_task: Option<JoinHandle<()>>,

    /// Pending auto-clear timers, one per completed message
    pub auto_clear: Vec<JoinHandle<()>>,

    /// Last typing indicator value sent
    pub is_typing: bool,

    /// Last successful conversational or idle transmit
    pub last_message_time: Option<Instant>,

    /// Last time the agent finished speaking
    pub last_speech_end_time: Option<Instant>,

    /// Last idle block transmit
    pub last_idle_ui_sent: Option<Instant>,

    /// When the transport was created
    pub app_start_time: Instant,
}

impl TransportState {
    /// Fresh state starting now
    #[must_use]
    pub fn new() -> Self {
        Self {
            sequence_id: 0,
            active_task: None,
            auto_clear: Vec::new(),
            is_typing: false,
            last_message_time: None,
            last_speech_end_time: None,
            last_idle_ui_sent: None,
            app_start_time: Instant::now(),
        }
    }

    /// Whether a chunked send is still running
    #[must_use]
    pub fn has_active_send_task(&self) -> bool {
        self.active_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Start a new generation, returning its id and the previous send task
    pub fn begin_generation(&mut self) -> (u64, Option<JoinHandle<()>>) {
        self.sequence_id += 1;
        (self.sequence_id, self.active_task.take())
    }

    /// Whether `id` is still the current generation
    #[must_use]
    pub fn is_current(&self, id: u64) -> bool {
        self.sequence_id == id
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new()
    }
}
