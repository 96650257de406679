//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async functions in the stream crates MUST NOT block the
//! executor. Blocking file, network, process or HTTP calls and thread sleeps
//! are only allowed in synchronous functions (config loading before the
//! runtime starts) and in test code.

use architectural_enforcement::{
    code_part, is_in_async_function, is_in_test_function, production_sources,
};

/// Blocking call patterns and what they are
const BLOCKING_PATTERNS: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("reqwest::blocking", "Blocking HTTP client"),
    ("std::thread::sleep", "Thread sleep"),
];

#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = Vec::new();

    for file in production_sources() {
        let lines = file.line_refs();
        for (idx, line) in lines.iter().enumerate() {
            let code = code_part(line);
            if code.is_empty() || is_in_test_function(&lines, idx) {
                continue;
            }
            if !is_in_async_function(&lines, idx) {
                continue;
            }
            for (pattern, kind) in BLOCKING_PATTERNS {
                if code.contains(pattern) {
                    violations.push(file.violation(idx, kind));
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\nBlocking calls found in async production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nUse tokio::fs, tokio::net, tokio::time or the async reqwest client.");

        panic!(
            "\nFound {} blocking call(s) in async code.\nFix these before merging!",
            violations.len()
        );
    }
}

#[test]
fn test_sync_config_loading_is_allowed() {
    // Config files are read synchronously before any connection exists
    let config = production_sources()
        .into_iter()
        .find(|f| f.path.ends_with("config/mod.rs"))
        .expect("config module should be scanned");
    let lines = config.line_refs();

    let read = lines
        .iter()
        .position(|line| code_part(line).contains("std::fs::read_to_string"))
        .expect("config loading reads the file");

    assert!(!is_in_async_function(&lines, read));
}
