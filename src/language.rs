//! Language support shared by scanning, import resolution and roles

use anyhow::{anyhow, Result};
use std::path::Path;

/// Languages with both a tree-sitter grammar and a regex fallback
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "python",
    "go",
    "typescript",
    "tsx",
    "javascript",
    "java",
    "rust",
    "ruby",
    "c",
    "cpp",
];

/// Map a file extension to a language name
pub fn detect_language_from_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "py" => Some("python"),
        "go" => Some("go"),
        "ts" => Some("typescript"),
        "tsx" => Some("tsx"),
        "js" | "jsx" | "mjs" | "cjs" => Some("javascript"),
        "java" => Some("java"),
        "rs" => Some("rust"),
        "rb" => Some("ruby"),
        "c" | "h" => Some("c"),
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some("cpp"),
        _ => None,
    }
}

/// Detect programming language from a path's extension
pub fn detect_language(path: &Path) -> Option<&'static str> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(detect_language_from_extension)
}

/// Get the tree-sitter grammar for a language name
pub fn get_tree_sitter_language(language: &str) -> Result<tree_sitter::Language> {
    match language {
        "python" => Ok(tree_sitter_python::LANGUAGE.into()),
        "go" => Ok(tree_sitter_go::LANGUAGE.into()),
        "typescript" => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "tsx" => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "javascript" => Ok(tree_sitter_javascript::LANGUAGE.into()),
        "java" => Ok(tree_sitter_java::LANGUAGE.into()),
        "rust" => Ok(tree_sitter_rust::LANGUAGE.into()),
        "ruby" => Ok(tree_sitter_ruby::LANGUAGE.into()),
        "c" => Ok(tree_sitter_c::LANGUAGE.into()),
        "cpp" => Ok(tree_sitter_cpp::LANGUAGE.into()),
        _ => Err(anyhow!("Unsupported language: {}", language)),
    }
}

/// Languages whose blocks are delimited by braces
pub fn uses_braces(language: &str) -> bool {
    !matches!(language, "python" | "ruby")
}

/// TypeScript and TSX share every rule except the grammar
pub fn language_family(language: &str) -> &str {
    match language {
        "tsx" => "typescript",
        other => other,
    }
}

/// Whether a path looks like a test file (`test_x.py`, `x_test.go`, `tests/`, `spec/`)
pub fn is_test_path(path: &str) -> bool {
    let lower = path.to_lowercase().replace('\\', "/");
    let file_name = lower.rsplit('/').next().unwrap_or(&lower);
    file_name.starts_with("test_")
        || lower.contains("/test_")
        || file_name.contains("_test.")
        || file_name.contains("_spec.")
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
        || lower.starts_with("tests/")
        || lower.contains("/tests/")
        || lower.starts_with("spec/")
        || lower.contains("/spec/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_language_has_a_grammar() {
        for lang in SUPPORTED_LANGUAGES {
            assert!(
                get_tree_sitter_language(lang).is_ok(),
                "Language '{}' should be supported",
                lang
            );
        }
        assert!(get_tree_sitter_language("cobol").is_err());
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(detect_language(Path::new("src/lib.rs")), Some("rust"));
        assert_eq!(detect_language(Path::new("a/b.hpp")), Some("cpp"));
        assert_eq!(detect_language(Path::new("a/b.h")), Some("c"));
        assert_eq!(detect_language(Path::new("a/b.mjs")), Some("javascript"));
        assert_eq!(detect_language(Path::new("README.md")), None);
        assert_eq!(detect_language(Path::new("Makefile")), None);
    }

    #[test]
    fn test_test_path_detection() {
        assert!(is_test_path("tests/test_api.py"));
        assert!(is_test_path("pkg/server_test.go"));
        assert!(is_test_path("spec/models/user_spec.rb"));
        assert!(!is_test_path("src/contest.py"));
        assert!(!is_test_path("src/latest/handler.go"));
    }
}
