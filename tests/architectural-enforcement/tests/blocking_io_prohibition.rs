//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions in the chatbox crates MUST NOT use blocking
//! std I/O. Synchronous functions may: the UDP send primitive is a
//! non-blocking socket used from sync code, and config/avatar files are read
//! before or outside the runtime's hot path.
//!
//! **Required** inside async code: `tokio::fs`, `tokio::net`, `tokio::io`.

use architectural_enforcement::{code_part, is_in_async_function, production_sources};

const BLOCKING_CALLS: [(&str, &str); 5] = [
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("std::io::stdin()", "Blocking stdin"),
    ("std::io::stdout()", "Blocking stdout"),
];

/// Test that async production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = Vec::new();

    for file in production_sources() {
        let lines = file.line_refs();
        for (idx, line) in lines.iter().enumerate() {
            let code = code_part(line);
            for (pattern, what) in BLOCKING_CALLS {
                if code.contains(pattern) && is_in_async_function(&lines, idx) {
                    violations.push(file.violation(idx, what));
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Blocking I/O calls found in async code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ REQUIRED async I/O:");
        eprintln!("  - tokio::io::stdin() / stdout() in the relay loop");
        eprintln!("  - tokio::fs for files read while serving");
        panic!(
            "\nFound {} blocking I/O violation(s) in async code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// Test that the transport never holds a lock across an await point
///
/// Guards are taken as statement temporaries or dropped before awaiting; a
/// `let` binding of a `.lock()` followed by `.await` in the same function is
/// flagged.
#[test]
fn test_no_lock_guard_held_across_await() {
    let mut violations = Vec::new();

    for file in production_sources() {
        let lines = file.line_refs();
        for (idx, line) in lines.iter().enumerate() {
            let code = code_part(line);
            let statement = code.trim();
            let binds_guard = statement.starts_with("let ")
                && (statement.ends_with(".lock();") || statement.ends_with(".write();"));
            if !binds_guard || !is_in_async_function(&lines, idx) {
                continue;
            }
            let held_until_await = lines[idx + 1..]
                .iter()
                .map(|l| code_part(l))
                .take_while(|l| !l.contains("drop("))
                .take_while(|l| !l.trim_start().starts_with("}"))
                .any(|l| l.contains(".await"));
            if held_until_await {
                violations.push(file.violation(idx, "Lock guard held across await"));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Lock guards held across await:\n{}",
        violations.join("\n")
    );
}
