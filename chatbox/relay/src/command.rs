//! Relay Input Commands
//!
//! Every stdin line is either plain text (an agent response) or a slash
//! command:
//!
//! ```text
//! Hello there!                 respond with text
//! /say <text>                  same, for text starting with '/'
//! /typing on|off               toggle the typing indicator
//! /speech start|end            speech boundaries
//! /think <text>                thinking pane
//! /final <text>                response pane
//! /marquee start [key]         start a marquee over the panes
//! /marquee stop [key]          stop it
//! /clear                       blank panes and chatbox
//! /idle                        try the idle block now
//! /status                      print a status snapshot
//! /quit                        shut down
//! ```

use thiserror::Error;

/// Marquee key used when none is given
pub const DEFAULT_MARQUEE_KEY: &str = "main";

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Agent response text
    Say(String),
    /// Typing indicator on/off
    Typing(bool),
    /// Speech started
    SpeechStart,
    /// Speech ended
    SpeechEnd,
    /// Replace the thinking pane
    Think(String),
    /// Replace the response pane
    Final(String),
    /// Start a marquee under a key
    MarqueeStart(String),
    /// Stop the marquee under a key
    MarqueeStop(String),
    /// Blank panes and chatbox
    Clear,
    /// Attempt the idle block
    Idle,
    /// Print a status snapshot
    Status,
    /// Shut down
    Quit,
}

/// Why a line could not be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown slash command
    #[error("unknown command: /{0}")]
    Unknown(String),

    /// Known command with a bad or missing argument
    #[error("usage: {0}")]
    Usage(&'static str),
}

fn on_off(arg: &str) -> Option<bool> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn key_or_default(arg: &str) -> String {
    if arg.is_empty() {
        DEFAULT_MARQUEE_KEY.to_string()
    } else {
        arg.to_string()
    }
}

/// Parse one input line
///
/// Returns `Ok(None)` for blank lines.
///
/// # Errors
///
/// Returns an error for unknown slash commands and malformed arguments.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "say" => {
            if arg.is_empty() {
                return Err(CommandError::Usage("/say <text>"));
            }
            Command::Say(arg.to_string())
        }
        "typing" => Command::Typing(on_off(arg).ok_or(CommandError::Usage("/typing on|off"))?),
        "speech" => match arg {
            "start" => Command::SpeechStart,
            "end" => Command::SpeechEnd,
            _ => return Err(CommandError::Usage("/speech start|end")),
        },
        "think" => Command::Think(arg.to_string()),
        "final" => Command::Final(arg.to_string()),
        "marquee" => {
            let (action, key) = match arg.split_once(char::is_whitespace) {
                Some((action, key)) => (action, key.trim()),
                None => (arg, ""),
            };
            match action {
                "start" => Command::MarqueeStart(key_or_default(key)),
                "stop" => Command::MarqueeStop(key_or_default(key)),
                _ => return Err(CommandError::Usage("/marquee start|stop [key]")),
            }
        }
        "clear" => Command::Clear,
        "idle" => Command::Idle,
        "status" => Command::Status,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(line: &str) -> Command {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn test_plain_text_is_said() {
        assert_eq!(parse("  Hello there!  "), Command::Say("Hello there!".into()));
        assert_eq!(parse("/say /not a command"), Command::Say("/not a command".into()));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   \t").unwrap(), None);
    }

    #[test]
    fn test_typing_and_speech() {
        assert_eq!(parse("/typing on"), Command::Typing(true));
        assert_eq!(parse("/TYPING Off"), Command::Typing(false));
        assert_eq!(parse("/speech start"), Command::SpeechStart);
        assert_eq!(parse("/speech end"), Command::SpeechEnd);
        assert_eq!(
            parse_line("/typing maybe"),
            Err(CommandError::Usage("/typing on|off"))
        );
    }

    #[test]
    fn test_panes_keep_inner_whitespace() {
        assert_eq!(parse("/think  a  b "), Command::Think("a  b".into()));
        assert_eq!(parse("/final"), Command::Final(String::new()));
    }

    #[test]
    fn test_marquee_keys() {
        assert_eq!(parse("/marquee start"), Command::MarqueeStart("main".into()));
        assert_eq!(parse("/marquee stop vision"), Command::MarqueeStop("vision".into()));
        assert!(matches!(parse_line("/marquee pause"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_line("/dance now").unwrap_err();
        assert_eq!(err, CommandError::Unknown("dance".into()));
        assert_eq!(err.to_string(), "unknown command: /dance");
    }
}
