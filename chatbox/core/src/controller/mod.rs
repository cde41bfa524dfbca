//! Chatbox Transport Controller
//!
//! [`ChatboxTransport`] is the single entry point hosts talk to. It owns the
//! send primitive, the shared [`TransportState`] and every background task:
//!
//! ```text
//!   send_message ──► sequencer ──► (chunk task) ─┐
//!   set_typing / on_speech_* ──► typing ──────────┤
//!   maybe_send_idle_ui ──► idle ──────────────────┼──► transmit ──► SendPrimitive
//!   start_marquee ──► marquee tasks ──────────────┤
//!   (after a message) ──► auto-clear timer ───────┘
//! ```
//!
//! Every outbound frame passes through one transmit call site, which enforces
//! the character budget and logs failures. No public operation returns an
//! error or blocks on the network.

mod auto_clear;
mod idle;
mod marquee;
mod sequencer;
mod typing;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::collaborators::{AvatarNameSource, FileAvatarSource, LocalClock, SystemClock};
use crate::messages::ChatboxCommand;
use crate::state::TransportState;
use crate::status::ChatboxStatus;
use crate::text::{preview, truncate_with_ellipsis, TextSanitizer};
use crate::transport::{create_sender, SendPrimitive, TransportConfig, TransportError};

pub use marquee::{
    MarqueeCursor, MarqueeLayout, MarqueeOptions, MarqueeSource, MarqueeTick, MIN_MARQUEE_INTERVAL,
};
pub use sequencer::plan_frame;

/// A running marquee session
#[derive(Debug)]
pub(crate) struct MarqueeHandle {
    pub(crate) session_id: u64,
    pub(crate) task: JoinHandle<()>,
}

/// Shared core of a transport; background tasks hold it by `Arc` or `Weak`
pub(crate) struct Inner {
    pub(crate) config: TransportConfig,
    pub(crate) sanitizer: TextSanitizer,
    enabled: bool,
    sender: RwLock<Option<Arc<dyn SendPrimitive>>>,
    pub(crate) state: Mutex<TransportState>,
    pub(crate) marquees: DashMap<String, MarqueeHandle>,
    next_session: AtomicU64,
    shut_down: AtomicBool,
    pub(crate) avatar: Arc<dyn AvatarNameSource>,
    pub(crate) clock: Arc<dyn LocalClock>,
}

impl Inner {
    /// Enabled and still holding a send primitive
    pub(crate) fn is_operational(&self) -> bool {
        self.enabled && !self.shut_down.load(Ordering::SeqCst) && self.sender.read().is_some()
    }

    pub(crate) fn is_current(&self, id: u64) -> bool {
        self.state.lock().is_current(id)
    }

    pub(crate) fn next_session_id(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The single transmit call site
    ///
    /// Input text is cut to `max_length` here, whatever the caller planned.
    /// Failures are logged and returned; the frame is lost.
    pub(crate) fn transmit(&self, command: ChatboxCommand) -> Result<(), TransportError> {
        let command = match command {
            ChatboxCommand::Input {
                text,
                send_immediately,
                play_sound,
            } => ChatboxCommand::Input {
                text: truncate_with_ellipsis(&text, self.config.max_length),
                send_immediately,
                play_sound,
            },
            typing @ ChatboxCommand::Typing(_) => typing,
        };

        // Clone out of the lock so the send never runs under it
        let sender = self.sender.read().clone();
        let Some(sender) = sender else {
            return Err(TransportError::SendFailed("transport is shut down".to_string()));
        };

        let message = command.to_osc();
        match sender.send(&message) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    address = %message.address,
                    text = ?message.text().map(preview),
                    error = %e,
                    "Chatbox transmit failed"
                );
                Err(e)
            }
        }
    }

    /// Transmit conversational text and record the traffic
    pub(crate) fn transmit_text(&self, text: &str) -> Result<(), TransportError> {
        self.transmit(ChatboxCommand::input(
            text,
            self.config.send_immediately,
            self.config.notification_sound,
        ))?;
        self.state.lock().last_message_time = Some(Instant::now());
        Ok(())
    }
}

/// Builder for a [`ChatboxTransport`] with custom collaborators
pub struct TransportBuilder {
    config: TransportConfig,
    sender: Option<Arc<dyn SendPrimitive>>,
    avatar: Arc<dyn AvatarNameSource>,
    clock: Arc<dyn LocalClock>,
}

impl TransportBuilder {
    /// Use this send primitive instead of opening a UDP socket
    #[must_use]
    pub fn sender(mut self, sender: Arc<dyn SendPrimitive>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Use this avatar name source for the idle block
    #[must_use]
    pub fn avatar_source(mut self, avatar: Arc<dyn AvatarNameSource>) -> Self {
        self.avatar = avatar;
        self
    }

    /// Use this clock for the idle block
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn LocalClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the transport
    ///
    /// A disabled configuration or an unusable target yields a disabled
    /// transport on which every operation is a no-op.
    #[must_use]
    pub fn build(self) -> ChatboxTransport {
        let config = self.config.normalized();

        let sender = if !config.enabled {
            tracing::info!("Chatbox transport is disabled by configuration");
            None
        } else if let Some(sender) = self.sender {
            Some(sender)
        } else {
            match create_sender(&config) {
                Ok(sender) => Some(sender),
                Err(e) => {
                    tracing::error!(
                        target_addr = %config.target_label(),
                        error = %e,
                        "Failed to initialize chatbox transport, disabling"
                    );
                    None
                }
            }
        };

        let enabled = sender.is_some();
        if let Some(ref sender) = sender {
            tracing::info!(
                destination = %sender.describe(),
                max_length = config.max_length,
                "Chatbox transport ready"
            );
        }

        ChatboxTransport {
            inner: Arc::new(Inner {
                sanitizer: config.sanitizer(),
                config,
                enabled,
                sender: RwLock::new(sender),
                state: Mutex::new(TransportState::new()),
                marquees: DashMap::new(),
                next_session: AtomicU64::new(0),
                shut_down: AtomicBool::new(false),
                avatar: self.avatar,
                clock: self.clock,
            }),
        }
    }
}

/// Budget-constrained chatbox transport
///
/// Cheap to clone; clones share one state and one set of background tasks.
/// Operations that spawn work (`send_message` for long text, `start_marquee`,
/// auto-clear) must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct ChatboxTransport {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for ChatboxTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatboxTransport")
            .field("target", &self.inner.config.target_label())
            .field("enabled", &self.inner.enabled)
            .field("operational", &self.inner.is_operational())
            .finish()
    }
}

impl ChatboxTransport {
    /// Start building a transport
    #[must_use]
    pub fn builder(config: TransportConfig) -> TransportBuilder {
        TransportBuilder {
            config,
            sender: None,
            avatar: Arc::new(FileAvatarSource::in_working_dir()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Open a UDP transport to the configured target
    ///
    /// Never fails: an invalid target is logged and yields a disabled transport.
    #[must_use]
    pub fn connect(config: TransportConfig) -> Self {
        Self::builder(config).build()
    }

    /// Create a transport over an existing send primitive
    #[must_use]
    pub fn with_sender(config: TransportConfig, sender: Arc<dyn SendPrimitive>) -> Self {
        Self::builder(config).sender(sender).build()
    }

    /// The configuration this transport was built with
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    /// Whether operations currently do anything
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.inner.is_operational()
    }

    /// Blank the chatbox
    ///
    /// Returns true if the empty frame was transmitted.
    pub fn clear_chatbox(&self) -> bool {
        if !self.inner.is_operational() {
            return false;
        }
        let cleared = self.inner.transmit(ChatboxCommand::clear()).is_ok();
        if cleared {
            tracing::debug!("Cleared chatbox");
        }
        cleared
    }

    /// Snapshot of the transport
    #[must_use]
    pub fn get_status(&self) -> ChatboxStatus {
        let inner = &self.inner;
        let config = &inner.config;
        let active_marquees = inner
            .marquees
            .iter()
            .filter(|entry| !entry.value().task.is_finished())
            .count();
        let st = inner.state.lock();
        ChatboxStatus {
            enabled: inner.enabled,
            connected: inner.sender.read().is_some(),
            host: config.host.clone(),
            port: config.port,
            is_typing: st.is_typing,
            last_message_time: st.last_message_time,
            last_speech_end_time: st.last_speech_end_time,
            max_length: config.max_length,
            prefix: config.prefix.clone(),
            current_sequence_id: st.sequence_id,
            has_active_send_task: st.has_active_send_task(),
            active_marquees,
        }
    }

    /// Cancel every background task, wait for them, then release the sender
    ///
    /// Idempotent. The transport is inert afterwards.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        if inner.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut tasks = Vec::new();
        {
            let mut st = inner.state.lock();
            tasks.extend(st.active_task.take());
            tasks.append(&mut st.auto_clear);
        }
        let keys: Vec<String> = inner.marquees.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some((_, handle)) = inner.marquees.remove(&key) {
                tasks.push(handle.task);
            }
        }

        let count = tasks.len();
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Chatbox task ended abnormally");
                }
            }
        }

        *inner.sender.write() = None;
        tracing::info!(tasks = count, "Chatbox transport shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::transport::InMemorySender;

    fn transport(config: TransportConfig) -> (ChatboxTransport, InMemorySender) {
        let sender = InMemorySender::new();
        let chatbox = ChatboxTransport::with_sender(config, Arc::new(sender.clone()));
        (chatbox, sender)
    }

    #[tokio::test]
    async fn test_invalid_target_disables() {
        let chatbox = ChatboxTransport::connect(TransportConfig::default().with_target("", 0));
        let status = chatbox.get_status();
        assert!(!status.enabled);
        assert!(!status.connected);
        assert!(!chatbox.clear_chatbox());
    }

    #[tokio::test]
    async fn test_disabled_by_config() {
        let mut config = TransportConfig::default();
        config.enabled = false;
        let (chatbox, sender) = transport(config);
        assert!(!chatbox.is_operational());
        assert!(!chatbox.clear_chatbox());
        assert!(sender.is_empty());
    }

    #[tokio::test]
    async fn test_clear_sends_empty_frame() {
        let (chatbox, sender) = transport(TransportConfig::default());
        assert!(chatbox.clear_chatbox());
        assert_eq!(sender.inputs(), vec![""]);
        // Clearing is not conversational traffic
        assert!(chatbox.get_status().last_message_time.is_none());
    }

    #[tokio::test]
    async fn test_transmit_enforces_budget() {
        let (chatbox, sender) = transport(TransportConfig::default().with_max_length(10));
        chatbox
            .inner
            .transmit_text("this text is far longer than ten")
            .unwrap();
        assert_eq!(sender.inputs(), vec!["this te..."]);
    }

    #[tokio::test]
    async fn test_transmit_failure_is_reported() {
        let (chatbox, sender) = transport(TransportConfig::default());
        sender.set_failing(true);
        assert!(chatbox.inner.transmit_text("lost").is_err());
        assert!(chatbox.get_status().last_message_time.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_sender() {
        let (chatbox, sender) = transport(TransportConfig::default());
        chatbox.shutdown().await;

        let status = chatbox.get_status();
        assert!(status.enabled);
        assert!(!status.connected);
        assert!(!chatbox.is_operational());
        assert!(!chatbox.clear_chatbox());
        assert!(sender.is_empty());

        // Second shutdown is a no-op
        chatbox.shutdown().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let (chatbox, _sender) = transport(TransportConfig::default());
        let clone = chatbox.clone();
        chatbox.send_message("hello");
        assert_eq!(clone.get_status().current_sequence_id, 1);
    }
}
