//! Chunk Planning
//!
//! Splits cleaned text into pieces that fit a character budget, preferring to
//! cut after a sentence, then at a word boundary, and only as a last resort in
//! the middle of a word.

/// How far back from the budget edge to look for a sentence terminator
pub const SENTENCE_LOOKBACK: usize = 120;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Split `text` into chunks of at most `budget` characters
///
/// Text that already fits comes back as a single, untouched chunk. Otherwise
/// every chunk is trimmed and empty chunks are dropped, so joining the result
/// with single spaces reproduces the word sequence of `text`.
///
/// A zero budget is treated as one character.
#[must_use]
pub fn split_message(text: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= budget {
        return vec![text.to_string()];
    }
    plan(&chars, budget)
}

/// Split `text` into display pages of at most `size` characters
///
/// Same cutting rules as [`split_message`], but the input is trimmed first and
/// empty input yields no pages.
#[must_use]
pub fn paginate(text: &str, size: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    plan(&chars, size.max(1))
}

fn plan(chars: &[char], budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = chars;

    while !remaining.is_empty() {
        if remaining.len() <= budget {
            push_trimmed(&mut chunks, remaining);
            break;
        }

        let cut = find_cut(remaining, budget);
        push_trimmed(&mut chunks, &remaining[..cut]);
        remaining = trim_start(&remaining[cut..]);
    }

    chunks
}

/// Pick the cut position for a window that does not fit
///
/// `chars` is longer than `budget`. Returns a position in `1..=budget`; a
/// space sitting right at the budget edge counts as a word boundary.
fn find_cut(chars: &[char], budget: usize) -> usize {
    let floor = budget.saturating_sub(SENTENCE_LOOKBACK);
    if let Some(end) =
        (floor + 1..=budget).rev().find(|&i| SENTENCE_TERMINATORS.contains(&chars[i - 1]))
    {
        return end;
    }

    match chars[..=budget].iter().rposition(|&c| c == ' ') {
        Some(space) if space > 0 => space,
        _ => budget,
    }
}

fn trim_start(chars: &[char]) -> &[char] {
    let start = chars
        .iter()
        .position(|c| !c.is_whitespace())
        .unwrap_or(chars.len());
    &chars[start..]
}

fn push_trimmed(chunks: &mut Vec<String>, chars: &[char]) {
    let chunk: String = chars.iter().collect();
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}
