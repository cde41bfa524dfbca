//! Typing indicator, speech boundaries and the agent response path.

use tokio::time::Instant;

use super::{ChatboxTransport, Inner};
use crate::messages::{ChatboxCommand, SendOutcome};

impl Inner {
    pub(crate) fn set_typing(&self, typing: bool) -> bool {
        if !self.is_operational() || !self.config.enable_typing_indicator {
            return false;
        }
        if self.transmit(ChatboxCommand::Typing(typing)).is_err() {
            return false;
        }
        self.state.lock().is_typing = typing;
        tracing::debug!(typing, "Typing indicator");
        true
    }
}

impl ChatboxTransport {
    /// Show or hide the typing indicator
    ///
    /// No-op unless the transport is operational and the indicator is enabled.
    /// Returns true if the indicator message was transmitted.
    pub fn set_typing(&self, typing: bool) -> bool {
        self.inner.set_typing(typing)
    }

    /// The agent started speaking
    pub fn on_speech_start(&self) {
        self.inner.set_typing(true);
    }

    /// The agent stopped speaking
    ///
    /// Hides the indicator if it is on and records the end of speech, which
    /// the idle decision uses as a cooldown anchor.
    pub fn on_speech_end(&self) {
        let typing = self.inner.state.lock().is_typing;
        if typing {
            self.inner.set_typing(false);
        }
        self.inner.state.lock().last_speech_end_time = Some(Instant::now());
    }

    /// Send an agent response: typing indicator, short lead-in, then the text
    pub async fn respond(&self, text: &str) -> SendOutcome {
        if !self.inner.is_operational() {
            return SendOutcome::Disabled;
        }
        if text.trim().is_empty() {
            return SendOutcome::Empty;
        }

        if self.inner.set_typing(true) {
            tokio::time::sleep(self.inner.config.typing_lead_in).await;
        }
        self.send_message(text)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::transport::{InMemorySender, TransportConfig};

    fn transport(config: TransportConfig) -> (ChatboxTransport, InMemorySender) {
        let sender = InMemorySender::new();
        let chatbox = ChatboxTransport::with_sender(config, Arc::new(sender.clone()));
        (chatbox, sender)
    }

    #[tokio::test]
    async fn test_set_typing_sends_and_records() {
        let (chatbox, sender) = transport(TransportConfig::default());
        assert!(chatbox.set_typing(true));
        assert!(chatbox.get_status().is_typing);
        assert!(chatbox.set_typing(false));
        assert!(!chatbox.get_status().is_typing);
        assert_eq!(sender.typing_flags(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_typing_disabled_in_config() {
        let mut config = TransportConfig::default();
        config.enable_typing_indicator = false;
        let (chatbox, sender) = transport(config);
        assert!(!chatbox.set_typing(true));
        chatbox.on_speech_start();
        assert!(sender.is_empty());
        assert!(!chatbox.get_status().is_typing);
    }

    #[tokio::test]
    async fn test_failed_typing_keeps_state() {
        let (chatbox, sender) = transport(TransportConfig::default());
        sender.set_failing(true);
        assert!(!chatbox.set_typing(true));
        assert!(!chatbox.get_status().is_typing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speech_end_records_time() {
        let (chatbox, sender) = transport(TransportConfig::default());
        chatbox.on_speech_start();
        assert!(chatbox.get_status().is_typing);

        chatbox.on_speech_end();
        let status = chatbox.get_status();
        assert!(!status.is_typing);
        assert!(status.last_speech_end_time.is_some());
        assert_eq!(sender.typing_flags(), vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speech_end_without_typing_sends_nothing() {
        let (chatbox, sender) = transport(TransportConfig::default());
        chatbox.on_speech_end();
        assert!(sender.is_empty());
        assert!(chatbox.get_status().last_speech_end_time.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_respond_leads_with_typing() {
        let mut config = TransportConfig::default();
        config.auto_clear_delay = Duration::ZERO;
        let (chatbox, sender) = transport(config);

        let start = Instant::now();
        let outcome = chatbox.respond("All done.").await;
        assert_eq!(outcome, SendOutcome::Sent { sequence_id: 1 });
        assert!(start.elapsed() >= Duration::from_millis(500));

        assert_eq!(sender.typing_flags(), vec![true, false]);
        assert_eq!(sender.inputs(), vec!["[Gabriel] All done."]);
        assert!(!chatbox.get_status().is_typing);
    }

    #[tokio::test]
    async fn test_respond_blank_is_empty() {
        let (chatbox, sender) = transport(TransportConfig::default());
        assert_eq!(chatbox.respond("  ").await, SendOutcome::Empty);
        assert!(sender.is_empty());
    }
}
