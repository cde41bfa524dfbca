//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production chatbox code MUST NOT block a runtime thread.
//! - `std::thread::sleep` and `block_on` are forbidden outright
//! - `tokio::time::sleep` is allowed only where it honors a configured delay
//!   (chunk spacing, auto-clear, typing lead-in) or paces an interval
//!
//! **Exceptions**: test code (`#[cfg(test)]` modules are not scanned)

use architectural_enforcement::{code_part, is_configured_delay_context, production_sources};

/// Test that production code never sleeps a thread or blocks on a future
#[test]
fn test_no_thread_sleep_or_block_on() {
    let mut violations = Vec::new();

    for file in production_sources() {
        let lines = file.line_refs();
        for (idx, line) in lines.iter().enumerate() {
            let code = code_part(line);
            if code.contains("thread::sleep(") {
                violations.push(file.violation(idx, "Thread sleep"));
            }
            if code.contains("block_on(") {
                violations.push(file.violation(idx, "Runtime block_on"));
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Blocking waits found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use tokio::time::sleep / interval inside tasks instead.");
        panic!(
            "\nFound {} blocking wait(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// Test that every timer wait is a configured delay, not polling
#[test]
fn test_timer_waits_honor_configured_delays() {
    let mut violations = Vec::new();

    for file in production_sources() {
        let lines = file.line_refs();
        for (idx, line) in lines.iter().enumerate() {
            let code = code_part(line);
            if (code.contains("::sleep(") || code.contains(".sleep("))
                && !code.contains("thread::sleep(")
                && !is_configured_delay_context(&lines, idx)
            {
                violations.push(file.violation(idx, "Unexplained sleep"));
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ Sleeps found that do not honor a configured delay!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ ACCEPTABLE timer waits:");
        eprintln!("  - message_delay between chunks");
        eprintln!("  - auto_clear_delay before blanking");
        eprintln!("  - typing_lead_in before a response");
        eprintln!("  - tokio::time::interval() for periodic work");
        eprintln!("\n❌ FORBIDDEN:");
        eprintln!("  - Sleep in polling loops");
        eprintln!("  - Sleep as poor man's synchronization");
        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}
