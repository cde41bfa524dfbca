//! Relay Loop
//!
//! Reads commands line by line and drives a [`ChatboxTransport`]:
//!
//! ```text
//!    stdin ──lines──► parse_line ──► Relay::handle ──► ChatboxTransport
//!                                         │
//!    idle ticker ────► Relay::poll_idle ──┘
//! ```
//!
//! With `two_part_enabled`, `/think` and `/final` update two shared panes that
//! a live marquee pulls on every tick. Without it, `/final` is a plain
//! response and thinking text is dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use chatbox_core::{
    ChatboxStatus, ChatboxTransport, IdleDecision, MarqueeOptions, MarqueeOutcome, MarqueeSource,
};

use crate::command::{parse_line, Command, DEFAULT_MARQUEE_KEY};

/// Shared pane text read by live marquee sources
#[derive(Debug, Default)]
struct Panes {
    thinking: Mutex<String>,
    response: Mutex<String>,
}

impl Panes {
    fn clear(&self) {
        self.thinking.lock().clear();
        self.response.lock().clear();
    }
}

/// What the loop does after a command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Keep reading
    Continue,
    /// Write a line to the output, then keep reading
    Print(String),
    /// Stop reading and shut down
    Quit,
}

/// `/status` output
#[derive(Debug, Serialize)]
struct StatusReport {
    #[serde(flatten)]
    status: ChatboxStatus,
    operational: bool,
    two_part_enabled: bool,
    marquees: Vec<String>,
}

fn print_json<T: Serialize>(value: &T) -> Step {
    match serde_json::to_string(value) {
        Ok(json) => Step::Print(json),
        Err(e) => {
            warn!(error = %e, "Failed to serialize output");
            Step::Continue
        }
    }
}

/// Drives a transport from parsed input lines
pub struct Relay {
    chatbox: ChatboxTransport,
    panes: Arc<Panes>,
    idle_poll: Duration,
}

impl Relay {
    /// Create a relay; the idle block is considered every `idle_poll`
    pub fn new(chatbox: ChatboxTransport, idle_poll: Duration) -> Self {
        Self {
            chatbox,
            panes: Arc::new(Panes::default()),
            idle_poll: idle_poll.max(Duration::from_millis(100)),
        }
    }

    /// The transport being driven
    pub fn chatbox(&self) -> &ChatboxTransport {
        &self.chatbox
    }

    fn two_part_enabled(&self) -> bool {
        self.chatbox.config().ui.two_part_enabled
    }

    /// Start a marquee under `key` over the shared panes
    fn start_pane_marquee(&self, key: &str) -> MarqueeOutcome {
        let thinking = Arc::clone(&self.panes);
        let response = Arc::clone(&self.panes);
        self.chatbox.start_marquee(
            key,
            MarqueeSource::from_fn(move || thinking.thinking.lock().clone()),
            MarqueeSource::from_fn(move || response.response.lock().clone()),
            MarqueeOptions::default(),
        )
    }

    fn ensure_pane_marquee(&self) {
        let running = self
            .chatbox
            .active_marquees()
            .iter()
            .any(|key| key == DEFAULT_MARQUEE_KEY);
        if !running {
            let outcome = self.start_pane_marquee(DEFAULT_MARQUEE_KEY);
            debug!(?outcome, "Two-part marquee");
        }
    }

    /// Apply one command
    pub async fn handle(&self, command: Command) -> Step {
        match command {
            Command::Say(text) => {
                // A direct answer replaces the live panes
                if self.two_part_enabled() {
                    self.chatbox.stop_marquee(DEFAULT_MARQUEE_KEY);
                    self.panes.clear();
                }
                let outcome = self.chatbox.respond(&text).await;
                debug!(?outcome, "Response sent");
            }
            Command::Typing(on) => {
                self.chatbox.set_typing(on);
            }
            Command::SpeechStart => self.chatbox.on_speech_start(),
            Command::SpeechEnd => self.chatbox.on_speech_end(),
            Command::Think(text) => {
                if self.two_part_enabled() {
                    *self.panes.thinking.lock() = text;
                    self.ensure_pane_marquee();
                } else {
                    debug!("Two-part display disabled, thinking text dropped");
                }
            }
            Command::Final(text) => {
                if self.two_part_enabled() {
                    *self.panes.response.lock() = text;
                    self.ensure_pane_marquee();
                } else {
                    let outcome = self.chatbox.respond(&text).await;
                    debug!(?outcome, "Final text sent as response");
                }
            }
            Command::MarqueeStart(key) => return print_json(&self.start_pane_marquee(&key)),
            Command::MarqueeStop(key) => return print_json(&self.chatbox.stop_marquee(&key)),
            Command::Clear => {
                self.chatbox.stop_marquee(DEFAULT_MARQUEE_KEY);
                self.panes.clear();
                self.chatbox.clear_chatbox();
            }
            Command::Idle => {
                let decision = self.chatbox.maybe_send_idle_ui();
                return Step::Print(format!("idle: {decision}"));
            }
            Command::Status => {
                let report = StatusReport {
                    status: self.chatbox.get_status(),
                    operational: self.chatbox.is_operational(),
                    two_part_enabled: self.two_part_enabled(),
                    marquees: self.chatbox.active_marquees(),
                };
                return print_json(&report);
            }
            Command::Quit => return Step::Quit,
        }
        Step::Continue
    }

    /// Send the idle block if the agent has been quiet long enough
    ///
    /// Returns `None` when no attempt was made.
    pub fn poll_idle(&self) -> Option<IdleDecision> {
        let config = self.chatbox.config();
        if !config.ui.enabled || !self.chatbox.active_marquees().is_empty() {
            return None;
        }
        let status = self.chatbox.get_status();
        if !status.is_agent_idle(Instant::now(), config.ui.idle_cooldown_after_speech) {
            return None;
        }
        let decision = self.chatbox.maybe_send_idle_ui();
        debug!(%decision, "Idle poll");
        Some(decision)
    }

    /// Serve `input` until it ends, `/quit` arrives or `shutdown` resolves,
    /// then shut the transport down
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails. The
    /// transport is shut down either way.
    pub async fn run<R, W, S>(&self, input: R, output: W, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let result = self.serve(input, output, shutdown).await;
        self.chatbox.shutdown().await;
        result
    }

    async fn serve<R, W, S>(&self, input: R, mut output: W, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let mut lines = input.lines();
        let mut idle = tokio::time::interval(self.idle_poll);
        idle.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    return Ok(());
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        info!("Input closed");
                        return Ok(());
                    };
                    let step = match parse_line(&line) {
                        Ok(Some(command)) => self.handle(command).await,
                        Ok(None) => Step::Continue,
                        Err(e) => {
                            warn!(error = %e, "Ignoring input line");
                            Step::Print(format!("error: {e}"))
                        }
                    };
                    match step {
                        Step::Continue => {}
                        Step::Print(text) => {
                            output.write_all(text.as_bytes()).await?;
                            output.write_all(b"\n").await?;
                            output.flush().await.context("Failed to write output")?;
                        }
                        Step::Quit => {
                            info!("Quit requested");
                            return Ok(());
                        }
                    }
                }
                _ = idle.tick() => {
                    self.poll_idle();
                }
            }
        }
    }
}
