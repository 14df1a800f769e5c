//! Import resolution
//!
//! Maps an import as written in a file to a scanned file of the same
//! repository. Each language has its own lookup rules; what they share is
//! the three-way outcome: the import names a scanned file, it points outside
//! the repository, or it looks internal but matches nothing (a phantom).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::language::language_family;
use crate::scanning::models::{file_stem, parent_dir, ImportDecl};

const JS_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Internal(String),
    External,
    Phantom,
}

/// Lookup tables over the set of scanned paths
#[derive(Debug, Default)]
pub struct ImportResolver {
    files: BTreeSet<String>,
    /// Dotted Python module → file (`pkg.mod`, also without a `src.` prefix)
    python_modules: HashMap<String, String>,
    /// First segment of every Python module key
    python_roots: HashSet<String>,
    /// Directory → files directly inside it, sorted
    directories: BTreeMap<String, Vec<String>>,
    top_level_dirs: HashSet<String>,
}

impl ImportResolver {
    pub fn new<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut resolver = Self::default();
        for path in paths {
            resolver.files.insert(path.to_string());
            resolver
                .directories
                .entry(parent_dir(path).to_string())
                .or_default()
                .push(path.to_string());
            if let Some((first, _)) = path.split_once('/') {
                resolver.top_level_dirs.insert(first.to_string());
            }
            if path.ends_with(".py") {
                let mut dotted = path.trim_end_matches(".py").replace('/', ".");
                if dotted.ends_with(".__init__") {
                    dotted.truncate(dotted.len() - ".__init__".len());
                }
                if let Some(short) = dotted.strip_prefix("src.") {
                    resolver.register_python(short.to_string(), path);
                }
                resolver.register_python(dotted, path);
            }
        }
        for files in resolver.directories.values_mut() {
            files.sort();
        }
        resolver
    }

    fn register_python(&mut self, dotted: String, path: &str) {
        if let Some(first) = dotted.split('.').next() {
            self.python_roots.insert(first.to_string());
        }
        self.python_modules.entry(dotted).or_insert_with(|| path.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    /// Resolve `import` as written in `from` (a repository-relative path)
    pub fn resolve(&self, from: &str, language: &str, import: &ImportDecl) -> Resolution {
        let source = import.source.trim();
        if source.is_empty() {
            return Resolution::External;
        }
        match language_family(language) {
            "python" => self.resolve_python(from, source, &import.names),
            "c" | "cpp" => self.resolve_include(from, source, import.is_system),
            "javascript" | "typescript" => self.resolve_js(from, source),
            "rust" => self.resolve_rust(from, source),
            "go" => self.resolve_by_directory(source, '/'),
            "java" => self.resolve_java(source),
            "ruby" => self.resolve_ruby(from, source),
            _ => Resolution::External,
        }
    }

    fn first_existing<I>(&self, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = String>,
    {
        candidates.into_iter().find(|c| self.files.contains(c))
    }

    fn looks_internal(&self, first_segment: &str) -> bool {
        self.top_level_dirs.contains(first_segment) || self.python_roots.contains(first_segment)
    }

    fn external_or_phantom(&self, first_segment: &str) -> Resolution {
        if self.looks_internal(first_segment) {
            Resolution::Phantom
        } else {
            Resolution::External
        }
    }

    fn resolve_python(&self, from: &str, source: &str, names: &[String]) -> Resolution {
        if source.starts_with('.') {
            let dots = source.chars().take_while(|c| *c == '.').count();
            let module = &source[dots..];
            let mut dir = parent_dir(from).to_string();
            for _ in 1..dots {
                dir = parent_dir(&dir).to_string();
            }
            let base = if module.is_empty() {
                dir
            } else {
                join(&dir, &module.replace('.', "/"))
            };

            let mut candidates: Vec<String> = names
                .iter()
                .flat_map(|n| [format!("{}/{}.py", base, n), format!("{}/{}/__init__.py", base, n)])
                .collect();
            if !module.is_empty() {
                candidates.push(format!("{}.py", base));
            }
            candidates.push(format!("{}/__init__.py", base));
            let candidates = candidates.into_iter().filter_map(|c| normalize(&c));

            return match self.first_existing(candidates) {
                Some(path) => Resolution::Internal(path),
                None => Resolution::Phantom,
            };
        }

        // `from pkg import mod` names a submodule more often than a symbol
        for name in names {
            if let Some(path) = self.python_modules.get(&format!("{}.{}", source, name)) {
                return Resolution::Internal(path.clone());
            }
        }
        if let Some(path) = self.python_modules.get(source) {
            return Resolution::Internal(path.clone());
        }
        if let Some(path) = self.python_modules.get(&format!("src.{}", source)) {
            return Resolution::Internal(path.clone());
        }
        self.external_or_phantom(source.split('.').next().unwrap_or(source))
    }

    fn resolve_include(&self, from: &str, source: &str, is_system: bool) -> Resolution {
        if is_system {
            return Resolution::External;
        }
        let relative = normalize(&join(parent_dir(from), source));
        if let Some(path) = self.first_existing(relative.into_iter().chain(normalize(source))) {
            return Resolution::Internal(path);
        }

        let suffix = format!("/{}", source.trim_start_matches("./"));
        let matches: Vec<&String> = self.files.iter().filter(|f| f.ends_with(&suffix)).collect();
        match matches.as_slice() {
            [only] => Resolution::Internal((*only).clone()),
            [] => Resolution::Phantom,
            // Ambiguous basename: prefer the candidate closest to the includer
            many => {
                let best = many
                    .iter()
                    .max_by_key(|f| (common_prefix_len(f, from), std::cmp::Reverse(f.len())));
                match best {
                    Some(path) => Resolution::Internal((*path).clone()),
                    None => Resolution::Phantom,
                }
            }
        }
    }

    fn resolve_js(&self, from: &str, source: &str) -> Resolution {
        let (base, relative) = if source.starts_with('.') {
            (normalize(&join(parent_dir(from), source)), true)
        } else if let Some(rest) = source.strip_prefix("@/").or_else(|| source.strip_prefix("~/")) {
            (normalize(&format!("src/{}", rest)), true)
        } else {
            (None, false)
        };

        if !relative {
            let first = source.split('/').next().unwrap_or(source);
            if self.top_level_dirs.contains(first) {
                if let Some(path) = normalize(source).and_then(|b| self.js_candidates(&b)) {
                    return Resolution::Internal(path);
                }
            }
            return self.external_or_phantom(first);
        }

        match base.and_then(|b| self.js_candidates(&b)) {
            Some(path) => Resolution::Internal(path),
            None => Resolution::Phantom,
        }
    }

    fn js_candidates(&self, base: &str) -> Option<String> {
        // TypeScript sources import their compiled names (`./util.js`)
        let stripped = JS_EXTENSIONS
            .iter()
            .find_map(|ext| base.strip_suffix(ext))
            .unwrap_or(base);

        let mut candidates = vec![base.to_string()];
        for ext in JS_EXTENSIONS {
            candidates.push(format!("{}{}", stripped, ext));
        }
        for ext in JS_EXTENSIONS {
            candidates.push(format!("{}/index{}", base, ext));
        }
        self.first_existing(candidates)
    }

    fn resolve_rust(&self, from: &str, source: &str) -> Resolution {
        let mut segments: Vec<&str> = source.split("::").filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Resolution::External;
        }

        let mut dir = match segments[0] {
            "crate" => {
                segments.remove(0);
                rust_crate_root(from)
            }
            "self" | "super" => {
                let mut dir = rust_module_dir(from);
                if segments[0] == "self" {
                    segments.remove(0);
                }
                while segments.first() == Some(&"super") {
                    segments.remove(0);
                    dir = parent_dir(&dir).to_string();
                }
                dir
            }
            _ => return Resolution::External,
        };
        if dir == "." {
            dir.clear();
        }

        // Longest module path first; trailing segments may name items
        for len in (1..=segments.len()).rev() {
            let module = segments[..len].join("/");
            let base = join_opt(&dir, &module);
            if let Some(path) =
                self.first_existing([format!("{}.rs", base), format!("{}/mod.rs", base)])
            {
                return Resolution::Internal(path);
            }
        }
        if segments.is_empty() {
            return Resolution::External;
        }
        Resolution::Phantom
    }

    /// Go packages and Java wildcard imports name a directory
    fn resolve_by_directory(&self, source: &str, separator: char) -> Resolution {
        let wanted = source.replace(separator, "/");
        let best = self
            .directories
            .iter()
            .filter(|(dir, _)| {
                dir.as_str() != "." && (wanted == **dir || wanted.ends_with(&format!("/{}", dir)))
            })
            .max_by_key(|(dir, _)| dir.len());
        if let Some((_, files)) = best {
            if let Some(first) = files.first() {
                return Resolution::Internal(first.clone());
            }
        }
        if self.shares_directory_prefix(&wanted) {
            Resolution::Phantom
        } else {
            Resolution::External
        }
    }

    fn resolve_java(&self, source: &str) -> Resolution {
        let as_path = format!("{}.java", source.replace('.', "/"));
        let suffix = format!("/{}", as_path);
        if let Some(path) = self
            .files
            .iter()
            .find(|f| **f == as_path || f.ends_with(&suffix))
        {
            return Resolution::Internal(path.clone());
        }
        self.resolve_by_directory(source, '.')
    }

    fn resolve_ruby(&self, from: &str, source: &str) -> Resolution {
        let with_ext = if source.ends_with(".rb") {
            source.to_string()
        } else {
            format!("{}.rb", source)
        };

        if source.starts_with('.') {
            return match normalize(&join(parent_dir(from), &with_ext)) {
                Some(path) if self.files.contains(&path) => Resolution::Internal(path),
                _ => Resolution::Phantom,
            };
        }

        let suffix = format!("/{}", with_ext);
        if let Some(path) = self
            .files
            .iter()
            .find(|f| **f == with_ext || f.ends_with(&suffix))
        {
            return Resolution::Internal(path.clone());
        }
        self.external_or_phantom(source.split('/').next().unwrap_or(source))
    }

    /// Whether the first two segments of `wanted` appear as consecutive
    /// directories somewhere in the repository
    fn shares_directory_prefix(&self, wanted: &str) -> bool {
        let mut parts = wanted.split('/');
        let (Some(a), Some(b)) = (parts.next(), parts.next()) else {
            return self.top_level_dirs.contains(wanted);
        };
        let needle = format!("{}/{}", a, b);
        let nested = format!("/{}", needle);
        self.directories
            .keys()
            .any(|dir| dir.starts_with(&needle) || dir.contains(&nested))
    }
}

fn join(dir: &str, rel: &str) -> String {
    if dir.is_empty() || dir == "." {
        rel.to_string()
    } else {
        format!("{}/{}", dir, rel)
    }
}

fn join_opt(dir: &str, rel: &str) -> String {
    if dir.is_empty() {
        rel.to_string()
    } else {
        format!("{}/{}", dir, rel)
    }
}

/// Collapse `.` and `..` segments; `None` when the path escapes the root
pub(crate) fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.split('/')
        .zip(b.split('/'))
        .take_while(|(x, y)| x == y)
        .count()
}

/// Directory holding `lib.rs` / `main.rs` for the crate containing `from`
fn rust_crate_root(from: &str) -> String {
    let dir = parent_dir(from);
    let segments: Vec<&str> = if dir == "." { Vec::new() } else { dir.split('/').collect() };
    match segments.iter().rposition(|s| *s == "src") {
        Some(idx) => segments[..=idx].join("/"),
        None => dir.to_string(),
    }
}

/// Directory in which `self::` children of `from` live
fn rust_module_dir(from: &str) -> String {
    let dir = parent_dir(from);
    match file_stem(from) {
        "mod" | "lib" | "main" => dir.to_string(),
        stem => join(dir, stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(paths: &[&str]) -> ImportResolver {
        ImportResolver::new(paths.iter().copied())
    }

    #[test]
    fn test_normalize_collapses_dots() {
        assert_eq!(normalize("a/./b/../c.py").as_deref(), Some("a/c.py"));
        assert_eq!(normalize("../outside.py"), None);
    }

    #[test]
    fn test_python_absolute_and_relative() {
        let r = resolver(&["src/pkg/__init__.py", "src/pkg/models.py", "src/pkg/sub/util.py"]);
        let imp = ImportDecl::new("pkg.models");
        assert_eq!(
            r.resolve("src/pkg/sub/util.py", "python", &imp),
            Resolution::Internal("src/pkg/models.py".into())
        );

        let rel = ImportDecl::new("..models");
        assert_eq!(
            r.resolve("src/pkg/sub/util.py", "python", &rel),
            Resolution::Internal("src/pkg/models.py".into())
        );

        assert_eq!(
            r.resolve("src/pkg/models.py", "python", &ImportDecl::new("os.path")),
            Resolution::External
        );
        assert_eq!(
            r.resolve("src/pkg/models.py", "python", &ImportDecl::new("pkg.missing")),
            Resolution::Phantom
        );
    }

    #[test]
    fn test_python_from_import_of_submodule() {
        let r = resolver(&["app/__init__.py", "app/services/__init__.py", "app/services/auth.py"]);
        let mut imp = ImportDecl::new("app.services");
        imp.names = vec!["auth".into()];
        assert_eq!(
            r.resolve("app/__init__.py", "python", &imp),
            Resolution::Internal("app/services/auth.py".into())
        );
    }

    #[test]
    fn test_c_includes() {
        let r = resolver(&["src/main.c", "src/util.h", "include/net/socket.h"]);
        assert_eq!(
            r.resolve("src/main.c", "c", &ImportDecl::new("util.h")),
            Resolution::Internal("src/util.h".into())
        );
        assert_eq!(
            r.resolve("src/main.c", "c", &ImportDecl::new("net/socket.h")),
            Resolution::Internal("include/net/socket.h".into())
        );
        let mut system = ImportDecl::new("stdio.h");
        system.is_system = true;
        assert_eq!(r.resolve("src/main.c", "c", &system), Resolution::External);
        assert_eq!(
            r.resolve("src/main.c", "c", &ImportDecl::new("generated.h")),
            Resolution::Phantom
        );
    }

    #[test]
    fn test_js_relative_and_index() {
        let r = resolver(&["web/app.ts", "web/lib/index.ts", "web/util.ts"]);
        assert_eq!(
            r.resolve("web/app.ts", "typescript", &ImportDecl::new("./lib")),
            Resolution::Internal("web/lib/index.ts".into())
        );
        assert_eq!(
            r.resolve("web/app.ts", "typescript", &ImportDecl::new("./util.js")),
            Resolution::Internal("web/util.ts".into())
        );
        assert_eq!(
            r.resolve("web/app.ts", "typescript", &ImportDecl::new("react")),
            Resolution::External
        );
        assert_eq!(
            r.resolve("web/app.ts", "typescript", &ImportDecl::new("./gone")),
            Resolution::Phantom
        );
    }

    #[test]
    fn test_rust_paths() {
        let r = resolver(&[
            "src/lib.rs",
            "src/graph/mod.rs",
            "src/graph/models.rs",
            "src/config.rs",
        ]);
        assert_eq!(
            r.resolve("src/lib.rs", "rust", &ImportDecl::new("crate::config::AnalysisConfig")),
            Resolution::Internal("src/config.rs".into())
        );
        assert_eq!(
            r.resolve("src/graph/mod.rs", "rust", &ImportDecl::new("self::models")),
            Resolution::Internal("src/graph/models.rs".into())
        );
        assert_eq!(
            r.resolve("src/graph/models.rs", "rust", &ImportDecl::new("super::super::config")),
            Resolution::Internal("src/config.rs".into())
        );
        assert_eq!(
            r.resolve("src/lib.rs", "rust", &ImportDecl::new("serde::Serialize")),
            Resolution::External
        );
        assert_eq!(
            r.resolve("src/lib.rs", "rust", &ImportDecl::new("crate::nowhere")),
            Resolution::Phantom
        );
    }

    #[test]
    fn test_go_and_java() {
        let r = resolver(&[
            "pkg/store/store.go",
            "pkg/store/cache.go",
            "src/main/java/com/acme/util/Strings.java",
        ]);
        assert_eq!(
            r.resolve("cmd/main.go", "go", &ImportDecl::new("github.com/acme/app/pkg/store")),
            Resolution::Internal("pkg/store/cache.go".into())
        );
        assert_eq!(
            r.resolve("cmd/main.go", "go", &ImportDecl::new("fmt")),
            Resolution::External
        );
        assert_eq!(
            r.resolve("x.java", "java", &ImportDecl::new("com.acme.util.Strings")),
            Resolution::Internal("src/main/java/com/acme/util/Strings.java".into())
        );
        assert_eq!(
            r.resolve("x.java", "java", &ImportDecl::new("com.acme.gone.Missing")),
            Resolution::Phantom
        );
    }

    #[test]
    fn test_ruby_requires() {
        let r = resolver(&["lib/app/user.rb", "lib/app/helpers.rb"]);
        assert_eq!(
            r.resolve("lib/app/user.rb", "ruby", &ImportDecl::new("./helpers")),
            Resolution::Internal("lib/app/helpers.rb".into())
        );
        assert_eq!(
            r.resolve("lib/app/user.rb", "ruby", &ImportDecl::new("app/user")),
            Resolution::Internal("lib/app/user.rb".into())
        );
        assert_eq!(
            r.resolve("lib/app/user.rb", "ruby", &ImportDecl::new("json")),
            Resolution::External
        );
    }
}
