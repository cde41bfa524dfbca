//! In-Memory Send Primitive
//!
//! Records every message instead of putting it on the wire. Used by tests and
//! by hosts that want to render chatbox frames themselves.
//!
//! # Usage
//!
//! ```ignore
//! let (sender, mut rx) = InMemorySender::with_channel();
//! let chatbox = ChatboxTransport::with_sender(config, Arc::new(sender.clone()));
//!
//! chatbox.send_message("hello");
//! let msg = rx.recv().await.unwrap();
//! assert_eq!(msg.text(), Some("[Gabriel] hello"));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::osc::{OscArg, OscMessage};
use super::traits::{SendPrimitive, TransportError};
use crate::messages::{INPUT_ADDRESS, TYPING_ADDRESS};

/// Send primitive that keeps messages in memory
///
/// Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct InMemorySender {
    log: Arc<Mutex<Vec<OscMessage>>>,
    /// When set, every send fails (simulates a dead socket)
    failing: Arc<AtomicBool>,
    /// Optional live feed of sent messages
    tx: Option<mpsc::UnboundedSender<OscMessage>>,
}

impl InMemorySender {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder that also forwards each sent message to a channel
    #[must_use]
    pub fn with_channel() -> (Self, mpsc::UnboundedReceiver<OscMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = Self {
            tx: Some(tx),
            ..Self::default()
        };
        (sender, rx)
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All messages sent so far
    #[must_use]
    pub fn messages(&self) -> Vec<OscMessage> {
        self.log.lock().clone()
    }

    /// Texts of all `/chatbox/input` messages, in order
    #[must_use]
    pub fn inputs(&self) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter(|m| m.address == INPUT_ADDRESS)
            .filter_map(|m| m.text().map(str::to_string))
            .collect()
    }

    /// Values of all `/chatbox/typing` messages, in order
    #[must_use]
    pub fn typing_flags(&self) -> Vec<bool> {
        self.log
            .lock()
            .iter()
            .filter(|m| m.address == TYPING_ADDRESS)
            .filter_map(|m| match m.args.first() {
                Some(OscArg::Bool(flag)) => Some(*flag),
                _ => None,
            })
            .collect()
    }

    /// Number of messages sent so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    /// Whether nothing has been sent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Forget everything sent so far
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl SendPrimitive for InMemorySender {
    fn send(&self, message: &OscMessage) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed("simulated failure".to_string()));
        }
        // Same validation as the wire, so tests catch unencodable frames
        message.encode()?;
        self.log.lock().push(message.clone());
        if let Some(ref tx) = self.tx {
            let _ = tx.send(message.clone());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
