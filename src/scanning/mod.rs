//! Source scanning
//!
//! Turns files on disk into [`FileSyntax`] records.
//!
//! Modules:
//! - discovery: walks the analyzed root and filters candidate files
//! - treesitter: primary scanner walking tree-sitter syntax trees
//! - fallback: regex scanner used when tree-sitter cannot help
//! - parallel: rayon-backed batch scanning of a discovered file list
//! - models: the per-file syntax model shared by everything downstream
pub mod discovery;
pub mod fallback;
pub mod models;
pub mod parallel;
pub mod treesitter;

pub use discovery::discover_files;
pub use fallback::FallbackScanner;
pub use models::{ClassDef, FileSyntax, FunctionDef, ImportDecl, ScanStats};
pub use parallel::{ParallelScanner, ScanConfig, ScanResult};
pub use treesitter::TreeSitterScanner;

use regex::Regex;
use std::sync::LazyLock;

static TODO_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(TODO|FIXME|HACK|XXX|BUG)\b").unwrap());

/// Newline count plus one; an empty file has zero lines
pub(crate) fn line_count(content: &str) -> usize {
    if content.is_empty() {
        0
    } else {
        content.matches('\n').count() + 1
    }
}

pub(crate) fn count_todo_markers(content: &str) -> usize {
    TODO_MARKER_RE.find_iter(content).count()
}

pub(crate) fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("a"), 1);
        assert_eq!(line_count("a\nb\n"), 3);
    }

    #[test]
    fn test_todo_markers_are_whole_words() {
        let text = "// TODO: fix\n# FIXME later\nlet debugger = 1; // XXX\nTODOS are not markers";
        assert_eq!(count_todo_markers(text), 3);
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
        assert_eq!(content_hash("abc").len(), 64);
    }
}
