//! Markup and whitespace cleanup for chatbox text

use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of non-empty lines kept after cleaning
///
/// When more remain, only the most recent lines are kept.
pub const MAX_LINES: usize = 9;

// Patterns are literals; a failure here is a programming error caught by tests.
static FENCED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[^\n]*\n?([\s\S]*?)```").expect("fenced code pattern"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern"));
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(.*?)`").expect("inline code pattern"));
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]*(.*)$").expect("heading pattern"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("link pattern"));
static SPECIAL_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?;:-]").expect("special chars pattern"));

/// Cleans raw agent output for display
///
/// Cleaning never fails; the worst case is an empty string, which callers
/// treat as "nothing to send".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextSanitizer {
    /// Remove markdown markers, keeping their inner text
    pub strip_markdown: bool,
    /// Remove everything except word characters, whitespace and `.,!?;:-`
    pub remove_special_chars: bool,
}

impl Default for TextSanitizer {
    fn default() -> Self {
        Self {
            strip_markdown: true,
            remove_special_chars: false,
        }
    }
}

impl TextSanitizer {
    /// Create a sanitizer with explicit options
    #[must_use]
    pub fn new(strip_markdown: bool, remove_special_chars: bool) -> Self {
        Self {
            strip_markdown,
            remove_special_chars,
        }
    }

    /// Clean `text` for the chatbox
    ///
    /// Order matters: markup is removed before the special-character filter
    /// (which would otherwise eat the markers and leave their syntax mangled),
    /// and line bounding happens last so it counts display lines.
    #[must_use]
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut text = text.to_string();

        if self.strip_markdown {
            text = FENCED_CODE_RE.replace_all(&text, "$1").into_owned();
            text = BOLD_RE.replace_all(&text, "$1").into_owned();
            text = ITALIC_RE.replace_all(&text, "$1").into_owned();
            text = INLINE_CODE_RE.replace_all(&text, "$1").into_owned();
            text = HEADING_RE.replace_all(&text, "$1").into_owned();
            text = LINK_RE.replace_all(&text, "$1").into_owned();
        }

        if self.remove_special_chars {
            text = SPECIAL_CHARS_RE.replace_all(&text, "").into_owned();
        }

        text = strip_control_chars(&text);

        let mut lines: Vec<String> = text
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect();

        if lines.len() > MAX_LINES {
            lines.drain(..lines.len() - MAX_LINES);
        }

        lines.join("\n").trim().to_string()
    }
}

/// Drop control characters the wire cannot carry (NUL, escapes, ...)
///
/// Newlines survive; other whitespace controls such as tabs become spaces.
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' => Some(c),
            c if c.is_control() => c.is_whitespace().then_some(' '),
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(text: &str) -> String {
        TextSanitizer::default().clean(text)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   \n\t  \n"), "");
    }

    #[test]
    fn test_strips_bold_and_italic() {
        assert_eq!(clean("this is **very** *nice*"), "this is very nice");
    }

    #[test]
    fn test_strips_inline_code() {
        assert_eq!(clean("run `cargo fmt` first"), "run cargo fmt first");
    }

    #[test]
    fn test_fenced_code_keeps_body() {
        let out = clean("look:\n```rust\nlet x = 1;\n```\ndone");
        assert_eq!(out, "look:\nlet x = 1;\ndone");
    }

    #[test]
    fn test_strips_headings() {
        assert_eq!(clean("## Summary\nall good"), "Summary\nall good");
    }

    #[test]
    fn test_links_keep_label() {
        assert_eq!(
            clean("see [the docs](https://example.com/docs) now"),
            "see the docs now"
        );
    }

    #[test]
    fn test_markdown_kept_when_disabled() {
        let sanitizer = TextSanitizer::new(false, false);
        assert_eq!(sanitizer.clean("**bold**"), "**bold**");
    }

    #[test]
    fn test_special_chars_removed() {
        let sanitizer = TextSanitizer::new(true, true);
        assert_eq!(sanitizer.clean("hi <3 @you, ok?"), "hi 3 you, ok?");
    }

    #[test]
    fn test_special_chars_keep_unicode_words() {
        let sanitizer = TextSanitizer::new(true, true);
        assert_eq!(sanitizer.clean("héllo ~wörld~!"), "héllo wörld!");
    }

    #[test]
    fn test_collapses_whitespace_and_drops_blank_lines() {
        assert_eq!(
            clean("  hello    there \n\n\n  general\t\tkenobi  "),
            "hello there\ngeneral kenobi"
        );
    }

    #[test]
    fn test_control_chars_removed() {
        assert_eq!(clean("hello\0world"), "helloworld");
        assert_eq!(clean("bell\u{7}\u{1b}[0m done"), "bell[0m done");
        assert_eq!(clean("tab\tseparated\r\nnext"), "tab separated\nnext");
        assert_eq!(clean("\0\0"), "");
    }

    #[test]
    fn test_control_chars_removed_with_special_filter() {
        let sanitizer = TextSanitizer::new(true, true);
        assert_eq!(sanitizer.clean("a\0b, c"), "ab, c");
    }

    #[test]
    fn test_keeps_last_nine_lines() {
        let input: Vec<String> = (1..=12).map(|i| format!("line {i}")).collect();
        let out = clean(&input.join("\n"));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), MAX_LINES);
        assert_eq!(lines[0], "line 4");
        assert_eq!(lines[8], "line 12");
    }
}
