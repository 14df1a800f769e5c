//! Per-file syntax model produced by the scanners

use serde::{Deserialize, Serialize};

use crate::math::gini::gini_or_zero;

/// A function or method definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    /// Whitespace-separated tokens inside the body
    pub body_tokens: usize,
    /// Tokens outside the body (name, params, return type), at least 1
    pub signature_tokens: usize,
    pub nesting_depth: usize,
    pub start_line: usize,
    pub end_line: usize,
    /// Callee names; `None` when the regex fallback produced this definition
    pub call_targets: Option<Vec<String>>,
    pub decorators: Vec<String>,
}

impl FunctionDef {
    /// Fewer than five body tokens: `pass`, `...`, `return None`, `{}`
    pub fn is_stub(&self) -> bool {
        self.body_tokens < 5
    }

    /// 0.0 = fully implemented, 1.0 = empty body.
    ///
    /// A body three times the size of the signature counts as implemented.
    pub fn stub_score(&self) -> f64 {
        if self.signature_tokens == 0 {
            return if self.body_tokens > 0 { 0.0 } else { 1.0 };
        }
        let ratio = self.body_tokens as f64 / (self.signature_tokens as f64 * 3.0);
        1.0 - ratio.min(1.0)
    }
}

/// A class-like declaration (class, struct, trait, interface, module)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<String>,
    pub methods: Vec<FunctionDef>,
    pub fields: Vec<String>,
    pub is_abstract: bool,
    /// Class-level decorators / annotations (`dataclass`, `Entity`)
    #[serde(default)]
    pub decorators: Vec<String>,
}

/// An import / include / use declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Module path as written (`os.path`, `./util`, `stdio.h`, `crate::db`)
    pub source: String,
    pub names: Vec<String>,
    /// `<...>` includes and similar toolchain-provided imports
    #[serde(default)]
    pub is_system: bool,
    /// Repository-relative path when the import resolves to a scanned file
    pub resolved_path: Option<String>,
}

impl ImportDecl {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            names: Vec::new(),
            is_system: false,
            resolved_path: None,
        }
    }
}

/// Everything the analysis needs to know about one source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSyntax {
    /// Repository-relative path with `/` separators
    pub path: String,
    pub language: String,
    /// Every function definition in the file, methods included
    pub functions: Vec<FunctionDef>,
    pub classes: Vec<ClassDef>,
    pub imports: Vec<ImportDecl>,
    pub has_main_guard: bool,
    pub lines: usize,
    pub tokens: usize,
    pub todo_count: usize,
    /// blake3 of the raw content
    pub content_hash: String,
    pub parsed_with_fallback: bool,
}

impl FileSyntax {
    pub fn empty(path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            has_main_guard: false,
            lines: 0,
            tokens: 0,
            todo_count: 0,
            content_hash: String::new(),
            parsed_with_fallback: false,
        }
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    pub fn max_nesting(&self) -> usize {
        self.functions
            .iter()
            .map(|f| f.nesting_depth)
            .max()
            .unwrap_or(0)
    }

    /// Mean stub score across functions
    pub fn stub_ratio(&self) -> f64 {
        if self.functions.is_empty() {
            return 0.0;
        }
        self.functions.iter().map(|f| f.stub_score()).sum::<f64>() / self.functions.len() as f64
    }

    /// Inequality of function body sizes (no bias correction)
    pub fn impl_gini(&self) -> f64 {
        let sizes: Vec<f64> = self.functions.iter().map(|f| f.body_tokens as f64).collect();
        gini_or_zero(&sizes, false)
    }

    /// Mean of (nesting + 1) over functions; 1.0 for files without functions
    pub fn complexity(&self) -> f64 {
        if self.functions.is_empty() {
            return 1.0;
        }
        self.functions
            .iter()
            .map(|f| f.nesting_depth as f64 + 1.0)
            .sum::<f64>()
            / self.functions.len() as f64
    }

    /// Every identifier that names something defined in the file
    pub fn defined_names(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.classes.iter().map(|c| c.name.as_str()))
    }

    /// Parent directory of the file (`.` for top-level files)
    pub fn parent_dir(&self) -> &str {
        parent_dir(&self.path)
    }
}

/// Parent directory of a repository-relative path (`.` at the top level)
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => ".",
    }
}

/// File name without directories and extension
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Counters reported after a parallel scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    pub scanned: usize,
    pub fallback: usize,
    pub failed: usize,
}

impl ScanStats {
    pub fn fallback_rate(&self) -> f64 {
        if self.scanned == 0 {
            0.0
        } else {
            self.fallback as f64 / self.scanned as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(body: usize, sig: usize) -> FunctionDef {
        FunctionDef {
            name: "f".into(),
            params: vec![],
            body_tokens: body,
            signature_tokens: sig,
            nesting_depth: 0,
            start_line: 1,
            end_line: 1,
            call_targets: Some(vec![]),
            decorators: vec![],
        }
    }

    #[test]
    fn test_stub_score() {
        assert_eq!(function(0, 4).stub_score(), 1.0);
        assert_eq!(function(12, 4).stub_score(), 0.0);
        assert!((function(6, 4).stub_score() - 0.5).abs() < 1e-12);
        assert_eq!(function(3, 0).stub_score(), 0.0);
        assert_eq!(function(0, 0).stub_score(), 1.0);
        assert!(function(4, 1).is_stub());
        assert!(!function(5, 1).is_stub());
    }

    #[test]
    fn test_file_level_aggregates() {
        let mut file = FileSyntax::empty("pkg/mod.py", "python");
        assert_eq!(file.complexity(), 1.0);
        assert_eq!(file.impl_gini(), 0.0);

        let mut deep = function(30, 3);
        deep.nesting_depth = 3;
        file.functions = vec![function(0, 3), deep];
        assert_eq!(file.max_nesting(), 3);
        assert!((file.complexity() - 2.5).abs() < 1e-12);
        assert!((file.stub_ratio() - 0.5).abs() < 1e-12);
        assert!(file.impl_gini() > 0.0);
        assert_eq!(file.parent_dir(), "pkg");
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(parent_dir("main.go"), ".");
        assert_eq!(parent_dir("a/b/c.rs"), "a/b");
        assert_eq!(file_stem("a/b/user_service.py"), "user_service");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }
}
