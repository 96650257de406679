//! Architectural Enforcement Integration Tests
//!
//! Source scans that keep production code in line with the workspace rules:
//! - No blocking I/O or sleeps inside async functions
//! - No `unwrap()` / `expect()` outside test code
//!
//! The scans are line based. They are cheap heuristics, not a parser, so the
//! helpers here err on the side of treating ambiguous code as production code.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["streams/core/src", "streams/inspect/src"];

/// Workspace root directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// A loaded Rust source file
pub struct SourceFile {
    /// Path on disk
    pub path: PathBuf,
    /// File content, one entry per line
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Lines as string slices, for the detector helpers
    #[must_use]
    pub fn line_refs(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }

    /// Format a violation message for a 0-based line index
    #[must_use]
    pub fn violation(&self, idx: usize, kind: &str) -> String {
        format!(
            "{}:{} - {}: {}",
            self.path.display(),
            idx + 1,
            kind,
            self.lines[idx].trim()
        )
    }
}

/// Load every `.rs` file under the production directories
#[must_use]
pub fn production_sources() -> Vec<SourceFile> {
    let root = workspace_root();
    let mut files = Vec::new();

    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }

        for entry in walkdir::WalkDir::new(&path)
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.path().extension().and_then(|s| s.to_str()) != Some("rs") {
                continue;
            }
            let Ok(content) = fs::read_to_string(entry.path()) else {
                continue;
            };
            files.push(SourceFile {
                path: entry.path().to_path_buf(),
                lines: content.lines().map(str::to_string).collect(),
            });
        }
    }

    files
}

/// The code part of a line, with `//` comments removed
#[must_use]
pub fn code_part(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") {
        return "";
    }
    line.split("//").next().unwrap_or(line)
}

/// Index of the first `#[cfg(test)]` line, if any
///
/// Everything from there on is treated as test code.
#[must_use]
pub fn test_section_start(lines: &[&str]) -> Option<usize> {
    lines
        .iter()
        .position(|line| line.trim_start().starts_with("#[cfg(test)]"))
}

/// Whether a trimmed line opens a function
#[must_use]
pub fn is_fn_header(line: &str) -> bool {
    let line = line.trim_start();
    let line = line
        .strip_prefix("pub(crate) ")
        .or_else(|| line.strip_prefix("pub(super) "))
        .or_else(|| line.strip_prefix("pub "))
        .unwrap_or(line);
    line.starts_with("fn ") || line.starts_with("async fn ")
}

/// Whether a function header line declares an async function
#[must_use]
pub fn is_async_header(line: &str) -> bool {
    is_fn_header(line) && line.contains("async fn ")
}

/// Whether a line starts a module or impl scope
fn is_scope_boundary(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("mod ")
        || line.starts_with("pub mod ")
        || (line.starts_with("impl") && line.contains('{'))
}

/// The nearest function header above `current_idx`, stopping at scope
/// boundaries
fn enclosing_fn<'a>(lines: &[&'a str], current_idx: usize) -> Option<&'a str> {
    for i in (0..current_idx).rev() {
        let line = lines[i];
        if is_fn_header(line) {
            return Some(line);
        }
        if is_scope_boundary(line) {
            return None;
        }
    }
    None
}

/// Check if line is inside a test function or a `#[cfg(test)]` section
#[must_use]
pub fn is_in_test_function(lines: &[&str], current_idx: usize) -> bool {
    if test_section_start(lines).is_some_and(|start| current_idx > start) {
        return true;
    }

    let Some(fn_idx) = (0..current_idx).rev().find(|&i| is_fn_header(lines[i])) else {
        return false;
    };

    for i in (0..fn_idx).rev() {
        let line = lines[i].trim();
        if line.starts_with("#[test]") || line.starts_with("#[tokio::test") {
            return true;
        }
        if !line.starts_with("#[") && !line.starts_with("///") {
            break;
        }
    }

    false
}

/// Check if line is inside an async function
#[must_use]
pub fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    enclosing_fn(lines, current_idx).is_some_and(is_async_header)
}

/// Check if line is inside a non-async function
#[must_use]
pub fn is_in_non_async_function(lines: &[&str], current_idx: usize) -> bool {
    enclosing_fn(lines, current_idx).is_some_and(|header| !is_async_header(header))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_header_detection() {
        assert!(is_fn_header("fn load() {"));
        assert!(is_fn_header("    pub fn new() -> Self {"));
        assert!(is_fn_header("    pub(crate) async fn fetch(&self) {"));
        assert!(is_async_header("pub async fn classify<'r, C>("));
        assert!(!is_async_header("    pub fn new() -> Self {"));
        assert!(!is_fn_header("let f = |x| x;"));
        assert!(!is_fn_header("// fn commented()"));
    }

    #[test]
    fn test_async_detection() {
        let code = vec![
            "    pub async fn bad(&self) {",
            "        let s = std::fs::read_to_string(\"x\");",
            "    }",
        ];
        assert!(is_in_async_function(&code, 1));
        assert!(!is_in_non_async_function(&code, 1));
    }

    #[test]
    fn test_non_async_detection() {
        let code = vec![
            "fn load_file_config(path: Option<PathBuf>) {",
            "    let s = std::fs::read_to_string(path);",
            "}",
        ];
        assert!(is_in_non_async_function(&code, 1));
        assert!(!is_in_async_function(&code, 1));
    }

    #[test]
    fn test_test_code_detection() {
        let code = vec![
            "fn helper() {}",
            "#[tokio::test]",
            "async fn test_something() {",
            "    value.unwrap();",
            "}",
        ];
        assert!(is_in_test_function(&code, 3));
        assert!(!is_in_test_function(&code, 0));

        let module = vec![
            "fn production() {}",
            "#[cfg(test)]",
            "mod tests {",
            "    fn helper() { value.unwrap(); }",
            "}",
        ];
        assert!(is_in_test_function(&module, 3));
        assert!(!is_in_test_function(&module, 0));
    }

    #[test]
    fn test_code_part_strips_comments() {
        assert_eq!(code_part("/// x.unwrap()"), "");
        assert_eq!(code_part("let a = b; // c.unwrap()"), "let a = b; ");
    }

    #[test]
    fn test_production_sources_are_found() {
        let files = production_sources();
        assert!(
            files.iter().any(|f| f.path.ends_with("accessor.rs")),
            "scan root {} does not contain the stream sources",
            workspace_root().display()
        );
    }
}
