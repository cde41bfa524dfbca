//! Message sequencing: supersession, chunking and the timed chunk task.

use std::sync::Arc;

use tokio::runtime::Handle;

use super::{ChatboxTransport, Inner};
use crate::messages::{OutboundFrame, SendOutcome};
use crate::text::{char_len, preview, split_message, truncate_with_ellipsis};
use crate::transport::TransportConfig;

/// Text budgets below this are planned without room for ` (i/n)` labels
const MIN_LABELLED_BUDGET: usize = 40;

fn chunk_label(index: usize, total: usize) -> String {
    format!(" ({index}/{total})")
}

/// Plan the frames for an already sanitized message
///
/// Each frame is `prefix + chunk`, with a ` (i/n)` label when there is more
/// than one chunk and the label fits. Every frame is within `max_length`.
#[must_use]
pub fn plan_frame(config: &TransportConfig, sequence_id: u64, text: &str) -> OutboundFrame {
    let max_length = config.max_length;
    let budget = config.text_budget();

    let mut pieces = split_message(text, budget);
    if pieces.len() > 1 {
        // Leave room for the widest label so chunks keep their labels
        let reserve = char_len(&chunk_label(pieces.len(), pieces.len())) + 1;
        if budget >= MIN_LABELLED_BUDGET + reserve {
            pieces = split_message(text, budget - reserve);
        }
    }

    let total = pieces.len();
    let chunks = pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let base = format!("{}{}", config.prefix, piece);
            if total > 1 {
                let labelled = format!("{base}{}", chunk_label(i + 1, total));
                if char_len(&labelled) <= max_length {
                    return labelled;
                }
            }
            truncate_with_ellipsis(&base, max_length)
        })
        .collect();

    OutboundFrame {
        sequence_id,
        chunks,
    }
}

impl Inner {
    pub(crate) fn send_message(self: &Arc<Self>, text: &str) -> SendOutcome {
        if !self.is_operational() {
            return SendOutcome::Disabled;
        }

        let clean = self.sanitizer.clean(text);
        if clean.is_empty() {
            tracing::debug!("Message empty after sanitizing, nothing to send");
            return SendOutcome::Empty;
        }

        let (id, previous) = self.state.lock().begin_generation();
        if let Some(previous) = previous {
            if !previous.is_finished() {
                previous.abort();
                tracing::debug!(sequence_id = id, "Superseded previous message");
            }
        }

        let prefixed = format!("{}{}", self.config.prefix, clean);
        if char_len(&prefixed) <= self.config.max_length || !self.config.split_long_messages {
            return self.send_single(id, &prefixed);
        }

        let frame = plan_frame(&self.config, id, &clean);
        let chunks = frame.len();

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(sequence_id = id, error = %e, "No runtime for chunked send");
                return SendOutcome::Failed {
                    sequence_id: id,
                    reason: e.to_string(),
                };
            }
        };
        let task = runtime.spawn(Arc::clone(self).run_chunks(frame));

        let mut st = self.state.lock();
        if st.is_current(id) {
            st.active_task = Some(task);
        } else {
            task.abort();
        }
        drop(st);

        tracing::debug!(sequence_id = id, chunks, "Scheduled chunked message");
        SendOutcome::Scheduled {
            sequence_id: id,
            chunks,
        }
    }

    fn send_single(self: &Arc<Self>, id: u64, prefixed: &str) -> SendOutcome {
        let frame = truncate_with_ellipsis(prefixed, self.config.max_length);
        if !self.is_current(id) {
            return SendOutcome::Failed {
                sequence_id: id,
                reason: "superseded before transmit".to_string(),
            };
        }
        match self.transmit_text(&frame) {
            Ok(()) => {
                tracing::info!(sequence_id = id, text = %preview(&frame), "Sent chatbox message");
                self.finish_message();
                SendOutcome::Sent { sequence_id: id }
            }
            Err(e) => {
                // The attempt is over either way
                self.finish_typing();
                SendOutcome::Failed {
                    sequence_id: id,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn run_chunks(self: Arc<Self>, frame: OutboundFrame) {
        let id = frame.sequence_id;
        let total = frame.len();
        let mut delivered = 0usize;

        for (i, chunk) in frame.chunks.iter().enumerate() {
            // Typing stays up: the superseding message finishes it
            if !self.is_current(id) {
                tracing::debug!(sequence_id = id, chunk = i + 1, "Chunked message superseded");
                return;
            }

            if self.transmit_text(chunk).is_ok() {
                delivered += 1;
                tracing::info!(
                    sequence_id = id,
                    chunk = i + 1,
                    total,
                    text = %preview(chunk),
                    "Sent chatbox chunk"
                );
            }

            if i + 1 < total {
                tokio::time::sleep(self.config.message_delay).await;
                // Same as above, the newer message owns the typing indicator
                if !self.is_current(id) {
                    tracing::debug!(sequence_id = id, "Chunked message superseded during delay");
                    return;
                }
            }
        }

        if delivered > 0 {
            self.finish_message();
        } else {
            self.finish_typing();
        }
    }

    /// A message is fully out: drop the typing indicator, arm auto-clear
    fn finish_message(self: &Arc<Self>) {
        self.finish_typing();
        self.schedule_auto_clear();
    }

    fn finish_typing(&self) {
        let typing = self.state.lock().is_typing;
        if typing {
            self.set_typing(false);
        }
    }
}

impl ChatboxTransport {
    /// Send conversational text, superseding anything still in flight
    ///
    /// Text that fits goes out immediately as one frame. Longer text is split
    /// into chunks sent `message_delay` apart by a background task, or cut to
    /// the limit when splitting is disabled.
    pub fn send_message(&self, text: &str) -> SendOutcome {
        self.inner.send_message(text)
    }

    /// Send two panes (`thinking`, `final`) as one frame
    ///
    /// Does not start a new generation, so an in-flight chunked message keeps
    /// running. The returned id is the generation current at the time.
    pub fn send_two_part(
        &self,
        thinking: &str,
        final_text: &str,
        divider: Option<&str>,
    ) -> SendOutcome {
        let inner = &self.inner;
        if !inner.is_operational() {
            return SendOutcome::Disabled;
        }

        let thinking = inner.sanitizer.clean(thinking);
        let final_text = inner.sanitizer.clean(final_text);
        if thinking.is_empty() && final_text.is_empty() {
            return SendOutcome::Empty;
        }

        let divider = divider
            .filter(|d| !d.is_empty())
            .unwrap_or(inner.config.ui.divider.as_str());
        let assembled = format!("{}{thinking}\n{divider}\n{final_text}", inner.config.prefix);
        let frame = truncate_with_ellipsis(&assembled, inner.config.max_length);

        let sequence_id = inner.state.lock().sequence_id;
        match inner.transmit_text(&frame) {
            Ok(()) => {
                tracing::debug!(sequence_id, "Sent two-part frame");
                SendOutcome::Sent { sequence_id }
            }
            Err(e) => SendOutcome::Failed {
                sequence_id,
                reason: e.to_string(),
            },
        }
    }
}
