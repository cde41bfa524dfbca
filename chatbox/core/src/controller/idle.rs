//! Idle status block: gating, rendering and throttled transmit.

use tokio::time::Instant;

use super::{ChatboxTransport, Inner};
use crate::collaborators::{format_active_time, format_local_time, UNKNOWN_AVATAR};
use crate::messages::{ChatboxCommand, IdleDecision};
use crate::status::RECENT_TRAFFIC_WINDOW;
use crate::template::{render_or_default, IdleFields};
use crate::text::{char_len, take_chars, truncate_with_ellipsis};

/// Avatar names are only shortened if more than this many characters remain
const MIN_AVATAR_CHARS: usize = 3;

impl Inner {
    fn idle_fields(&self, now: Instant) -> IdleFields {
        let ui = &self.config.ui;
        let started = self.state.lock().app_start_time;
        IdleFields {
            title: ui.title.clone(),
            time: format_local_time(self.clock.as_ref(), ui.show_timezone),
            divider: ui.divider.clone(),
            prompt_line: ui.prompt_line.clone(),
            active_time: format_active_time(now.saturating_duration_since(started)),
            avatar: self
                .avatar
                .avatar_name()
                .unwrap_or_else(|| UNKNOWN_AVATAR.to_string()),
        }
    }

    pub(crate) fn render_idle_block(&self, now: Instant) -> String {
        let max_length = self.config.max_length;
        let template = self.config.ui.message_template.as_deref();
        let mut fields = self.idle_fields(now);
        let mut text = render_or_default(template, &fields);

        let overflow = char_len(&text).saturating_sub(max_length);
        if overflow > 0 {
            let keep = char_len(&fields.avatar).saturating_sub(overflow);
            if keep > MIN_AVATAR_CHARS {
                fields.avatar = take_chars(&fields.avatar, keep);
                text = render_or_default(template, &fields);
            }
        }
        truncate_with_ellipsis(&text, max_length)
    }

    pub(crate) fn maybe_send_idle_ui(&self) -> IdleDecision {
        if !self.is_operational() {
            return IdleDecision::Disabled;
        }
        if !self.config.ui.enabled {
            return IdleDecision::UiDisabled;
        }

        let now = Instant::now();
        {
            let st = self.state.lock();
            if st.is_typing {
                return IdleDecision::Typing;
            }
            if st.has_active_send_task() {
                return IdleDecision::SendInFlight;
            }
            if st
                .last_message_time
                .is_some_and(|t| now.saturating_duration_since(t) < RECENT_TRAFFIC_WINDOW)
            {
                return IdleDecision::RecentTraffic;
            }
            if st
                .last_idle_ui_sent
                .is_some_and(|t| now.saturating_duration_since(t) < self.config.ui.idle_refresh)
            {
                return IdleDecision::Throttled;
            }
        }

        let text = self.render_idle_block(now);
        // Idle blocks never play the notification sound
        if self.transmit(ChatboxCommand::input(text, true, false)).is_err() {
            return IdleDecision::Failed;
        }

        let mut st = self.state.lock();
        st.last_idle_ui_sent = Some(now);
        st.last_message_time = Some(now);
        drop(st);

        tracing::debug!("Sent idle status block");
        IdleDecision::Sent
    }
}

impl ChatboxTransport {
    /// Show the idle status block if nothing else is going on
    ///
    /// Skipped while typing, while a chunked send runs, within 0.4 s of the
    /// last message and within `idle_refresh` of the last idle block.
    pub fn maybe_send_idle_ui(&self) -> IdleDecision {
        self.inner.maybe_send_idle_ui()
    }

    /// Render the idle status block without sending it
    #[must_use]
    pub fn render_idle_block(&self) -> String {
        self.inner.render_idle_block(Instant::now())
    }
}
