//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! on the chatbox crates:
//! - No thread sleeps or runtime blocking in production code
//! - Timer waits only where a configured delay is being honored
//! - No blocking std I/O inside async functions
//!
//! The helpers here read production sources (everything before a file's
//! `#[cfg(test)]` module) and answer simple questions about a line's context.

use std::fs;
use std::path::{Path, PathBuf};

/// Source directories holding production code, relative to the workspace root
pub const PRODUCTION_DIRS: [&str; 2] = ["chatbox/core/src", "chatbox/relay/src"];

/// Workspace root, two levels above this package
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// One Rust file, cut at its test module
#[derive(Debug)]
pub struct SourceFile {
    /// Path of the file
    pub path: PathBuf,
    /// Production lines (before the first `#[cfg(test)]`)
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Read `path`, keeping only production lines
    pub fn read(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        let lines = content
            .lines()
            .take_while(|line| line.trim() != "#[cfg(test)]")
            .map(str::to_string)
            .collect();
        Some(Self {
            path: path.to_path_buf(),
            lines,
        })
    }

    /// Borrowed view of the lines
    pub fn line_refs(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }

    /// Format a violation at `idx`
    pub fn violation(&self, idx: usize, what: &str) -> String {
        format!(
            "{}:{} - {what}: {}",
            self.path.display(),
            idx + 1,
            self.lines[idx].trim()
        )
    }
}

/// Every `.rs` file under the production directories
pub fn production_sources() -> Vec<SourceFile> {
    let root = workspace_root();
    let mut files = Vec::new();
    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }
        for entry in walkdir::WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
                files.extend(SourceFile::read(entry.path()));
            }
        }
    }
    files
}

/// The code part of a line: comments and doc comments removed
pub fn code_part(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") {
        return "";
    }
    line.split("//").next().unwrap_or(line)
}

fn declares_fn(line: &str) -> bool {
    line.starts_with("fn ") || line.contains(" fn ")
}

/// Whether the nearest enclosing function declaration is `async fn`
pub fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    for i in (0..=current_idx).rev() {
        let line = code_part(lines[i]).trim();
        if declares_fn(line) {
            return line.contains("async fn ");
        }
        // Stop at module/impl boundaries
        if line.starts_with("mod ") || (line.starts_with("impl") && line.contains('{')) {
            return false;
        }
    }
    false
}

/// Whether a timer wait honors a configured delay
///
/// Acceptable waits name what they wait for (`delay`, `lead_in`) or drive a
/// `tokio::time::interval`.
pub fn is_configured_delay_context(lines: &[&str], current_idx: usize) -> bool {
    let line = code_part(lines[current_idx]).to_lowercase();
    if line.contains("delay") || line.contains("lead_in") {
        return true;
    }
    let start = current_idx.saturating_sub(10);
    lines[start..current_idx].iter().any(|l| {
        let l = code_part(l);
        l.contains("tokio::time::interval") || l.contains(".tick()")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_function_detection() {
        let code = vec![
            "    pub async fn respond(&self) {",
            "        let x = std::fs::read_to_string(\"f\");",
            "    }",
        ];
        assert!(is_in_async_function(&code, 1));

        let code = vec![
            "    pub(crate) fn load() -> String {",
            "        std::fs::read_to_string(\"f\").unwrap_or_default()",
            "    }",
        ];
        assert!(!is_in_async_function(&code, 1));
    }

    #[test]
    fn test_configured_delay_detection() {
        let code = vec![
            "        if i + 1 < total {",
            "            tokio::time::sleep(self.config.message_delay).await;",
        ];
        assert!(is_configured_delay_context(&code, 1));

        let code = vec![
            "    loop {",
            "        tokio::time::sleep(Duration::from_millis(10)).await;",
        ];
        assert!(!is_configured_delay_context(&code, 1));
    }

    #[test]
    fn test_comments_are_not_code() {
        assert_eq!(code_part("    // thread::sleep(x)"), "");
        assert_eq!(code_part("    /// block_on"), "");
        assert_eq!(code_part("let a = 1; // note"), "let a = 1; ");
    }

    #[test]
    fn test_production_sources_found() {
        let files = production_sources();
        assert!(files.iter().any(|f| f.path.ends_with("chatbox/core/src/lib.rs")));
        assert!(files.iter().any(|f| f.path.ends_with("chatbox/relay/src/main.rs")));
    }

    #[test]
    fn test_test_modules_are_cut() {
        let path = workspace_root().join("chatbox/core/src/messages.rs");
        let file = SourceFile::read(&path).unwrap();
        assert!(!file.lines.iter().any(|l| l.contains("mod tests")));
    }
}
