//! Delayed blank-out after a message.
//!
//! Every completed message arms its own timer. Timers are not tied to a
//! message generation and later traffic does not disarm them; only
//! `shutdown` cancels a pending one.

use std::sync::Arc;

use tokio::runtime::Handle;

use super::Inner;
use crate::messages::ChatboxCommand;

impl Inner {
    pub(crate) fn schedule_auto_clear(self: &Arc<Self>) {
        let delay = self.config.auto_clear_delay;
        if delay.is_zero() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            tracing::debug!("No runtime, auto-clear skipped");
            return;
        };

        let weak = Arc::downgrade(self);
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.is_operational() && inner.transmit(ChatboxCommand::clear()).is_ok() {
                tracing::debug!(delay_ms = delay.as_millis() as u64, "Auto-cleared chatbox");
            }
        });

        let mut st = self.state.lock();
        st.auto_clear.retain(|pending| !pending.is_finished());
        st.auto_clear.push(task);
    }
}
