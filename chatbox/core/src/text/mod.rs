//! Text Shaping for the Chatbox
//!
//! Everything that turns free-form agent output into strings the chatbox can
//! display lives here:
//! - [`TextSanitizer`]: strips markup, collapses whitespace, bounds line count
//! - [`split_message`] / [`paginate`]: budget-sized pieces at natural boundaries
//! - [`truncate_with_ellipsis`]: the last line of defense for the length budget
//!
//! All lengths are measured in Unicode scalar values (`char`s), which is what
//! the chatbox counts against its limit.

mod chunk;
mod sanitize;

pub use chunk::{paginate, split_message, SENTENCE_LOOKBACK};
pub use sanitize::{TextSanitizer, MAX_LINES};

/// Suffix appended when a string has to be cut to fit the budget
pub const ELLIPSIS: &str = "...";

/// Length of a string in characters
#[inline]
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Take the first `n` characters of a string
#[must_use]
pub fn take_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Cut `text` down to at most `max` characters
///
/// Text that already fits is returned unchanged. Longer text keeps its first
/// `max - 3` characters followed by `...`. Budgets too small to hold the
/// ellipsis get a plain cut.
#[must_use]
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }
    let ellipsis_len = ELLIPSIS.len();
    if max <= ellipsis_len {
        return take_chars(text, max);
    }
    let mut out = take_chars(text, max - ellipsis_len);
    out.push_str(ELLIPSIS);
    out
}

/// Short preview of a message for log lines
pub(crate) fn preview(text: &str) -> String {
    truncate_with_ellipsis(text, 50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_leaves_short_text_alone() {
        assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
        assert_eq!(truncate_with_ellipsis("", 0), "");
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        let out = truncate_with_ellipsis("hello world", 8);
        assert_eq!(out, "hello...");
        assert_eq!(char_len(&out), 8);
    }

    #[test]
    fn test_truncate_tiny_budget() {
        assert_eq!(truncate_with_ellipsis("hello", 2), "he");
        assert_eq!(truncate_with_ellipsis("hello", 0), "");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let text = "héllo wörld ünïcode";
        let out = truncate_with_ellipsis(text, 10);
        assert_eq!(char_len(&out), 10);
        assert!(out.ends_with(ELLIPSIS));
    }
}
