//! Idle Block Templates
//!
//! A small placeholder substitution over a fixed key set. There is no
//! expression syntax: `{name}` is replaced by a value, `{{` and `}}` are
//! literal braces, anything else inside braces is an error.

use thiserror::Error;

/// Placeholders a template may use
pub const PLACEHOLDERS: [&str; 6] = [
    "title",
    "time",
    "divider",
    "prompt_line",
    "active_time",
    "avatar",
];

/// Layout used when no template is configured or the template is invalid
pub const DEFAULT_TEMPLATE: &str =
    "{title}\n{time}\n{divider}\n{prompt_line}\nActive time: {active_time}\nCurrent Avatar: {avatar}";

/// Errors from template rendering
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder outside the whitelist
    #[error("Unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    /// `{` without a matching `}`, or a stray `}`
    #[error("Unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),
}

/// Values substituted into the idle block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdleFields {
    /// Title line
    pub title: String,
    /// Formatted local time
    pub time: String,
    /// Divider line
    pub divider: String,
    /// Call-to-action line
    pub prompt_line: String,
    /// Formatted time since start
    pub active_time: String,
    /// Current avatar name
    pub avatar: String,
}

impl IdleFields {
    fn lookup(&self, key: &str) -> Option<&str> {
        let value = match key {
            "title" => &self.title,
            "time" => &self.time,
            "divider" => &self.divider,
            "prompt_line" => &self.prompt_line,
            "active_time" => &self.active_time,
            "avatar" => &self.avatar,
            _ => return None,
        };
        Some(value.as_str())
    }
}

/// Substitute `fields` into `template`
///
/// # Errors
///
/// - `UnknownPlaceholder` for a key outside [`PLACEHOLDERS`]
/// - `UnbalancedBrace` for an unclosed `{` or a lone `}`
pub fn render(template: &str, fields: &IdleFields) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    let mut offset = 0;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            offset += pos + 2;
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            offset += pos + 2;
            continue;
        }
        if tail.starts_with('}') {
            return Err(TemplateError::UnbalancedBrace(offset + pos));
        }

        let close = tail[1..]
            .find(['{', '}'])
            .filter(|&i| tail.as_bytes()[i + 1] == b'}')
            .ok_or(TemplateError::UnbalancedBrace(offset + pos))?;
        let key = tail[1..=close].trim();
        let value = fields
            .lookup(key)
            .ok_or_else(|| TemplateError::UnknownPlaceholder(key.to_string()))?;
        out.push_str(value);

        let consumed = close + 2;
        rest = &tail[consumed..];
        offset += pos + consumed;
    }
    out.push_str(rest);
    Ok(out)
}

/// Render with `template`, falling back to [`DEFAULT_TEMPLATE`] when it is
/// missing, blank or invalid
#[must_use]
pub fn render_or_default(template: Option<&str>, fields: &IdleFields) -> String {
    if let Some(template) = template.filter(|t| !t.trim().is_empty()) {
        match render(template, fields) {
            Ok(text) => return text,
            Err(e) => tracing::warn!(error = %e, "Idle template invalid, using default layout"),
        }
    }
    // DEFAULT_TEMPLATE only uses whitelisted keys
    render(DEFAULT_TEMPLATE, fields).unwrap_or_default()
}
