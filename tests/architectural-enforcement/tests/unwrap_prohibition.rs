//! Integration Test: Panic-Free Production Code
//!
//! **Policy**: Production code in the stream crates propagates errors with
//! `?` and typed error enums. `.unwrap()` and `.expect(..)` are only allowed
//! in tests, doc examples and `#[cfg(test)]` modules.

use architectural_enforcement::{code_part, is_in_test_function, production_sources};

#[test]
fn test_no_unwrap_in_production_code() {
    let mut violations = Vec::new();
    let mut scanned = 0;

    for file in production_sources() {
        scanned += 1;
        let lines = file.line_refs();
        for (idx, line) in lines.iter().enumerate() {
            let code = code_part(line);
            if is_in_test_function(&lines, idx) {
                continue;
            }
            if code.contains(".unwrap()") {
                violations.push(file.violation(idx, "unwrap() in production code"));
            }
            if code.contains(".expect(") {
                violations.push(file.violation(idx, "expect() in production code"));
            }
        }
    }

    assert!(scanned > 0, "no production sources were scanned");

    if !violations.is_empty() {
        eprintln!("\nPanicking calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nReturn a Result and use `?`, or handle the None/Err case.");

        panic!(
            "\nFound {} panicking call(s) in production code.",
            violations.len()
        );
    }
}
