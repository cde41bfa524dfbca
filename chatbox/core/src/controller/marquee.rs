//! Dual-Pane Marquee
//!
//! Renders two live text streams ("thinking" on top, "response" below) into
//! one chatbox frame and re-renders it on a fixed tick:
//!
//! ```text
//! [Gabriel] Thinking: (2/5) weighing the options here
//! ---------------------------------------------
//! Response: (1/1) Probably the red one.
//! ```
//!
//! Text too long for its pane is either paginated (whole pages cut at
//! sentence/word boundaries, one page per tick) or scrolled (a circular
//! character window advancing a few characters per tick).
//!
//! [`MarqueeCursor`] holds the per-session rendering state and is pure; the
//! ticking task around it only pulls sources, transmits and sleeps.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;

use super::{ChatboxTransport, Inner, MarqueeHandle};
use crate::messages::MarqueeOutcome;
use crate::text::{char_len, paginate, truncate_with_ellipsis};
use crate::transport::{MarqueeMode, TransportConfig};

/// Shortest allowed tick interval
pub const MIN_MARQUEE_INTERVAL: Duration = Duration::from_millis(10);

const THINKING_LABEL: &str = "Thinking: ";
const RESPONSE_LABEL: &str = "Response: ";

/// Room kept for a `(99/99) ` page label in paginate mode
const PAGE_LABEL_RESERVE: usize = 8;

/// Where a pane's text comes from
#[derive(Clone)]
pub enum MarqueeSource {
    /// Fixed text
    Static(String),
    /// Pulled on every tick
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl MarqueeSource {
    /// A source pulled from a closure on every tick
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Current text
    #[must_use]
    pub fn pull(&self) -> String {
        match self {
            Self::Static(text) => text.clone(),
            Self::Dynamic(f) => f(),
        }
    }
}

impl fmt::Debug for MarqueeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for MarqueeSource {
    fn from(text: &str) -> Self {
        Self::Static(text.to_string())
    }
}

impl From<String> for MarqueeSource {
    fn from(text: String) -> Self {
        Self::Static(text)
    }
}

/// Call-time overrides for a marquee session
///
/// Unset fields fall back to the `[chatbox_ui]` configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarqueeOptions {
    /// Tick interval (at least [`MIN_MARQUEE_INTERVAL`])
    pub interval: Option<Duration>,
    /// Scroll window in characters (at least 1)
    pub window_chars: Option<usize>,
    /// Rendering mode
    pub mode: Option<MarqueeMode>,
}

/// Character budget split between the two panes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarqueeLayout {
    prefix: String,
    divider: String,
    max_length: usize,
    available: usize,
    /// Characters per pane after labels, zero if the budget is too tight
    pub pane_chars: usize,
}

impl MarqueeLayout {
    /// Split the configured budget for `mode`
    #[must_use]
    pub fn compute(config: &TransportConfig, mode: MarqueeMode) -> Self {
        let available = config.max_length.saturating_sub(config.prefix_len());
        let reserved = char_len(&config.ui.divider) + 2;
        let mut pane_chars =
            (available.saturating_sub(reserved) / 2).saturating_sub(char_len(THINKING_LABEL));
        if mode == MarqueeMode::Paginate {
            pane_chars = pane_chars.saturating_sub(PAGE_LABEL_RESERVE);
        }
        Self {
            prefix: config.prefix.clone(),
            divider: config.ui.divider.clone(),
            max_length: config.max_length,
            available,
            pane_chars,
        }
    }

    /// Page size for paginate mode
    #[must_use]
    pub fn page_size(&self, window: usize) -> usize {
        if self.pane_chars > 0 {
            self.pane_chars
        } else {
            window.max(1)
        }
    }

    /// Visible window for scroll mode
    #[must_use]
    pub fn scroll_window(&self, window: usize) -> usize {
        let cap = if self.pane_chars > 0 {
            self.pane_chars
        } else {
            (self.available / 2).max(1)
        };
        window.clamp(1, cap)
    }

    fn assemble(&self, top: &str, bottom: &str) -> String {
        let frame = format!("{}{top}\n{}\n{bottom}", self.prefix, self.divider);
        truncate_with_ellipsis(&frame, self.max_length)
    }
}

/// What a tick produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarqueeTick {
    /// A new frame to transmit
    Render(String),
    /// Same frame as last sent
    Unchanged,
    /// Both panes empty, still waiting for text
    Waiting,
    /// Empty for long enough; hand over to the idle block and stop
    Idle,
}

/// Circular window of `window` characters over `text`, starting at `offset`
fn visible(text: &str, offset: usize, window: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= window {
        return text.to_string();
    }
    let period = chars.len() + window;
    let start = offset % period;
    chars
        .iter()
        .chain(std::iter::repeat(&' ').take(window))
        .chain(chars.iter())
        .skip(start)
        .take(window)
        .collect()
}

#[derive(Clone, Debug, Default)]
struct PaneCursor {
    index: usize,
    offset: usize,
    last_text: String,
}

impl PaneCursor {
    fn page(&mut self, text: &str, size: usize) -> Option<String> {
        if text != self.last_text {
            self.index = 0;
            self.last_text = text.to_string();
        }
        let pages = paginate(text, size);
        if pages.is_empty() {
            self.index = 0;
            return None;
        }
        let count = pages.len();
        let current = self.index % count;
        self.index = (current + 1) % count;
        Some(format!("({}/{count}) {}", current + 1, pages[current]))
    }

    fn scroll(&mut self, text: &str, window: usize, step: usize) -> Option<String> {
        let shown = visible(text, self.offset, window);
        let period = (char_len(text) + window).max(1);
        self.offset = (self.offset + step) % period;
        (!shown.is_empty()).then_some(shown)
    }
}

/// Rendering state of one marquee session
#[derive(Clone, Debug)]
pub struct MarqueeCursor {
    mode: MarqueeMode,
    window: usize,
    step: usize,
    empty_ticks_to_idle: u32,
    thinking: PaneCursor,
    response: PaneCursor,
    empty_ticks: u32,
    last_sent: Option<String>,
}

impl MarqueeCursor {
    /// New cursor; window and step are clamped to at least 1
    #[must_use]
    pub fn new(mode: MarqueeMode, window: usize, step: usize, empty_ticks_to_idle: u32) -> Self {
        Self {
            mode,
            window: window.max(1),
            step: step.max(1),
            empty_ticks_to_idle,
            thinking: PaneCursor::default(),
            response: PaneCursor::default(),
            empty_ticks: 0,
            last_sent: None,
        }
    }

    /// Rendering mode
    #[must_use]
    pub fn mode(&self) -> MarqueeMode {
        self.mode
    }

    /// Advance one tick over already sanitized pane texts
    pub fn tick(&mut self, thinking: &str, response: &str, layout: &MarqueeLayout) -> MarqueeTick {
        if thinking.trim().is_empty() && response.trim().is_empty() {
            self.empty_ticks += 1;
            return if self.empty_ticks >= self.empty_ticks_to_idle {
                MarqueeTick::Idle
            } else {
                MarqueeTick::Waiting
            };
        }
        self.empty_ticks = 0;

        let (top, bottom) = match self.mode {
            MarqueeMode::Paginate => {
                let size = layout.page_size(self.window);
                (
                    self.thinking.page(thinking, size),
                    self.response.page(response, size),
                )
            }
            MarqueeMode::Scroll => {
                let window = layout.scroll_window(self.window);
                (
                    self.thinking.scroll(thinking, window, self.step),
                    self.response.scroll(response, window, self.step),
                )
            }
        };

        let top = top.map_or_else(
            || THINKING_LABEL.trim_end().to_string(),
            |t| format!("{THINKING_LABEL}{t}"),
        );
        let bottom = bottom.map_or_else(
            || RESPONSE_LABEL.trim_end().to_string(),
            |b| format!("{RESPONSE_LABEL}{b}"),
        );
        let frame = layout.assemble(&top, &bottom);

        if self.last_sent.as_deref() == Some(frame.as_str()) {
            MarqueeTick::Unchanged
        } else {
            MarqueeTick::Render(frame)
        }
    }

    /// Remember a frame that reached the chatbox
    pub fn record_sent(&mut self, frame: String) {
        self.last_sent = Some(frame);
    }
}

struct MarqueeSession {
    key: String,
    session_id: u64,
    thinking: MarqueeSource,
    response: MarqueeSource,
    cursor: MarqueeCursor,
    interval: Duration,
}

async fn run_marquee(weak: Weak<Inner>, mut session: MarqueeSession) {
    let mut ticker = tokio::time::interval(session.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        if !inner.is_operational() {
            break;
        }

        let thinking = inner.sanitizer.clean(&session.thinking.pull());
        let response = inner.sanitizer.clean(&session.response.pull());
        let layout = MarqueeLayout::compute(&inner.config, session.cursor.mode());

        match session.cursor.tick(&thinking, &response, &layout) {
            MarqueeTick::Render(frame) => {
                if inner.transmit_text(&frame).is_ok() {
                    session.cursor.record_sent(frame);
                }
            }
            MarqueeTick::Unchanged | MarqueeTick::Waiting => {}
            MarqueeTick::Idle => {
                tracing::debug!(key = %session.key, "Marquee empty, handing over to idle block");
                let decision = inner.maybe_send_idle_ui();
                tracing::debug!(key = %session.key, %decision, "Idle block after marquee");
                break;
            }
        }
    }

    if let Some(inner) = weak.upgrade() {
        let session_id = session.session_id;
        inner
            .marquees
            .remove_if(&session.key, |_, handle| handle.session_id == session_id);
        tracing::info!(key = %session.key, "Marquee ended");
    }
}

impl ChatboxTransport {
    /// Start a marquee under `key`, replacing any session already there
    ///
    /// Interval, window and mode come from `options`, then configuration.
    pub fn start_marquee(
        &self,
        key: &str,
        thinking: impl Into<MarqueeSource>,
        response: impl Into<MarqueeSource>,
        options: MarqueeOptions,
    ) -> MarqueeOutcome {
        let inner = &self.inner;
        if !inner.is_operational() {
            return MarqueeOutcome::Disabled;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(key, error = %e, "No runtime for marquee");
                return MarqueeOutcome::Failed {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        let ui = &inner.config.ui;
        let interval = options
            .interval
            .unwrap_or(ui.marquee_interval)
            .max(MIN_MARQUEE_INTERVAL);
        let window = options.window_chars.unwrap_or(ui.marquee_window_chars).max(1);
        let mode = options.mode.unwrap_or(ui.marquee_mode);
        let session_id = inner.next_session_id();

        let session = MarqueeSession {
            key: key.to_string(),
            session_id,
            thinking: thinking.into(),
            response: response.into(),
            cursor: MarqueeCursor::new(
                mode,
                window,
                ui.marquee_scroll_step,
                ui.empty_ticks_to_idle,
            ),
            interval,
        };
        let task = runtime.spawn(run_marquee(Arc::downgrade(inner), session));

        let previous = inner
            .marquees
            .insert(key.to_string(), MarqueeHandle { session_id, task });
        let replaced = previous.is_some();
        if let Some(previous) = previous {
            previous.task.abort();
        }

        tracing::info!(
            key,
            %mode,
            interval_ms = interval.as_millis() as u64,
            window,
            replaced,
            "Marquee started"
        );
        MarqueeOutcome::Started {
            key: key.to_string(),
            replaced,
        }
    }

    /// Stop and discard the marquee under `key`
    pub fn stop_marquee(&self, key: &str) -> MarqueeOutcome {
        match self.inner.marquees.remove(key) {
            Some((_, handle)) => {
                handle.task.abort();
                tracing::info!(key, "Marquee stopped");
                MarqueeOutcome::Stopped {
                    key: key.to_string(),
                }
            }
            None => MarqueeOutcome::NotRunning {
                key: key.to_string(),
            },
        }
    }

    /// Keys of marquees that are still ticking
    #[must_use]
    pub fn active_marquees(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .marquees
            .iter()
            .filter(|entry| !entry.value().task.is_finished())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn layout(max_length: usize, prefix: &str, divider: &str, mode: MarqueeMode) -> MarqueeLayout {
        let mut config = TransportConfig::default()
            .with_max_length(max_length)
            .with_prefix(prefix);
        config.ui.divider = divider.to_string();
        MarqueeLayout::compute(&config, mode)
    }

    #[test]
    fn test_layout_default_budget() {
        let scroll = MarqueeLayout::compute(&TransportConfig::default(), MarqueeMode::Scroll);
        // (144 - 10 - 47) / 2 - 10
        assert_eq!(scroll.pane_chars, 33);
        let pages = MarqueeLayout::compute(&TransportConfig::default(), MarqueeMode::Paginate);
        assert_eq!(pages.pane_chars, 25);
    }

    #[test]
    fn test_layout_tight_budget_falls_back_to_window() {
        let tight = layout(20, "", "-----", MarqueeMode::Paginate);
        assert_eq!(tight.pane_chars, 0);
        assert_eq!(tight.page_size(40), 40);
        assert_eq!(tight.scroll_window(40), 10);
        assert_eq!(tight.scroll_window(0), 1);
    }

    #[test]
    fn test_visible_wraps_with_gap() {
        assert_eq!(visible("abc", 5, 10), "abc");
        assert_eq!(visible("abcdef", 0, 4), "abcd");
        assert_eq!(visible("abcdef", 4, 4), "ef  ");
        assert_eq!(visible("abcdef", 8, 4), "  ab");
        assert_eq!(visible("abcdef", 10, 4), "abcd");
    }

    #[test]
    fn test_paginate_cursor_advances_and_wraps() {
        let layout = layout(120, "", "--", MarqueeMode::Paginate);
        assert_eq!(layout.pane_chars, 40);

        let text = "x".repeat(300);
        let mut cursor = MarqueeCursor::new(MarqueeMode::Paginate, 40, 3, 2);
        for tick in 0..10 {
            let MarqueeTick::Render(frame) = cursor.tick(&text, "", &layout) else {
                panic!("tick {tick} did not render");
            };
            let expected = format!("Thinking: ({}/8) ", tick % 8 + 1);
            assert!(frame.starts_with(&expected), "{frame}");
            assert!(frame.ends_with("\n--\nResponse:"));
        }
    }

    #[test]
    fn test_paginate_resets_on_new_text() {
        let layout = layout(120, "", "--", MarqueeMode::Paginate);
        let mut cursor = MarqueeCursor::new(MarqueeMode::Paginate, 40, 3, 2);
        let long = "y".repeat(100);
        cursor.tick(&long, "", &layout);
        cursor.tick(&long, "", &layout);

        let MarqueeTick::Render(frame) = cursor.tick("fresh thought", "", &layout) else {
            panic!("expected render");
        };
        assert!(frame.starts_with("Thinking: (1/1) fresh thought"));
    }

    #[test]
    fn test_unchanged_frame_is_not_resent() {
        let layout = layout(144, "[G] ", "--", MarqueeMode::Paginate);
        let mut cursor = MarqueeCursor::new(MarqueeMode::Paginate, 40, 3, 2);
        let MarqueeTick::Render(frame) = cursor.tick("short", "answer", &layout) else {
            panic!("expected render");
        };
        assert_eq!(frame, "[G] Thinking: (1/1) short\n--\nResponse: (1/1) answer");
        cursor.record_sent(frame);
        assert_eq!(cursor.tick("short", "answer", &layout), MarqueeTick::Unchanged);
    }

    #[test]
    fn test_scroll_advances_by_step() {
        let layout = layout(120, "", "--", MarqueeMode::Scroll);
        let mut cursor = MarqueeCursor::new(MarqueeMode::Scroll, 4, 2, 2);
        let render = |cursor: &mut MarqueeCursor| match cursor.tick("abcdefgh", "", &layout) {
            MarqueeTick::Render(frame) => frame,
            other => panic!("expected render, got {other:?}"),
        };
        assert!(render(&mut cursor).starts_with("Thinking: abcd\n"));
        assert!(render(&mut cursor).starts_with("Thinking: cdef\n"));
        assert!(render(&mut cursor).starts_with("Thinking: efgh\n"));
    }

    #[test]
    fn test_empty_ticks_lead_to_idle() {
        let layout = layout(144, "", "--", MarqueeMode::Scroll);
        let mut cursor = MarqueeCursor::new(MarqueeMode::Scroll, 40, 3, 2);
        assert_eq!(cursor.tick("", " ", &layout), MarqueeTick::Waiting);
        assert!(matches!(cursor.tick("back", "", &layout), MarqueeTick::Render(_)));
        assert_eq!(cursor.tick("", "", &layout), MarqueeTick::Waiting);
        assert_eq!(cursor.tick("", "", &layout), MarqueeTick::Idle);
    }

    #[test]
    fn test_frame_within_budget() {
        let layout = layout(30, "[Gabriel] ", "-----", MarqueeMode::Scroll);
        let mut cursor = MarqueeCursor::new(MarqueeMode::Scroll, 40, 3, 2);
        let long = "z".repeat(200);
        for _ in 0..20 {
            if let MarqueeTick::Render(frame) = cursor.tick(&long, &long, &layout) {
                assert!(char_len(&frame) <= 30);
            }
        }
    }
}
