// Regex fallback scanner
//
// Used when tree-sitter cannot produce a usable tree. Line oriented and
// approximate: bodies end at the matching brace (or dedent for indentation
// languages) and nesting is estimated from indentation.

use regex::Regex;
use std::sync::LazyLock;

use super::models::{ClassDef, FileSyntax, FunctionDef, ImportDecl};
use super::{content_hash, count_todo_markers, line_count};
use crate::language::{language_family, uses_braces};

static MAIN_GUARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"if\s+__name__\s*==\s*["']__main__["']"#).unwrap());
static PARAMS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

/// Words that the loose method patterns would otherwise report as functions
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "else", "do", "try", "sizeof",
    "elif", "with", "match",
];

struct LanguagePatterns {
    functions: Vec<Regex>,
    classes: Vec<Regex>,
    imports: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?m){}", p)).unwrap())
        .collect()
}

static PYTHON: LazyLock<LanguagePatterns> = LazyLock::new(|| LanguagePatterns {
    functions: compile(&[r"^\s*(?:async\s+)?def\s+(\w+)\s*\([^)]*\)"]),
    classes: compile(&[r"^\s*class\s+(\w+)(?:\s*\(([^)]*)\))?:"]),
    imports: compile(&[r"^import\s+([\w.]+)", r"^from\s+([\w.]+)\s+import"]),
});

static GO: LazyLock<LanguagePatterns> = LazyLock::new(|| LanguagePatterns {
    functions: compile(&[
        r"^func\s+(\w+)\s*\([^)]*\)",
        r"^func\s+\([^)]*\)\s*(\w+)\s*\([^)]*\)",
    ]),
    classes: compile(&[r"^type\s+(\w+)\s+(?:struct|interface)\s*\{"]),
    imports: compile(&[r#"^import\s+"([^"]+)""#, r#"^\s+"([^"]+)"\s*$"#]),
});

static TYPESCRIPT: LazyLock<LanguagePatterns> = LazyLock::new(|| LanguagePatterns {
    functions: compile(&[
        r"^(?:export\s+)?(?:async\s+)?function\s+(\w+)\s*\([^)]*\)",
        r"^\s*(\w+)\s*\([^)]*\)\s*\{",
    ]),
    classes: compile(&[r"^(?:export\s+)?(?:abstract\s+)?(?:class|interface)\s+(\w+)"]),
    imports: compile(&[
        r#"^import\s+.*from\s+['"]([^'"]+)['"]"#,
        r#"require\(['"]([^'"]+)['"]\)"#,
    ]),
});

static JAVA: LazyLock<LanguagePatterns> = LazyLock::new(|| LanguagePatterns {
    functions: compile(&[
        r"(?:public|private|protected)?\s*(?:static)?\s*\w+\s+(\w+)\s*\([^)]*\)\s*(?:throws\s+\w+)?\s*\{",
    ]),
    classes: compile(&[r"(?:public\s+)?(?:abstract\s+)?(?:class|interface)\s+(\w+)"]),
    imports: compile(&[r"^import\s+(?:static\s+)?([\w.]+)"]),
});

static RUST: LazyLock<LanguagePatterns> = LazyLock::new(|| LanguagePatterns {
    functions: compile(&[r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+(\w+)"]),
    classes: compile(&[r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+(\w+)"]),
    imports: compile(&[r"^\s*(?:pub\s+)?use\s+([\w:]+)", r"^\s*(?:pub\s+)?mod\s+(\w+)\s*;"]),
});

static RUBY: LazyLock<LanguagePatterns> = LazyLock::new(|| LanguagePatterns {
    functions: compile(&[r"^\s*def\s+(?:self\.)?(\w+[?!]?)"]),
    classes: compile(&[r"^\s*(?:class|module)\s+(\w+)(?:\s*<\s*([\w:]+))?"]),
    imports: compile(&[
        r#"^\s*require\s+['"]([^'"]+)['"]"#,
        r#"^\s*require_relative\s+['"]([^'"]+)['"]"#,
    ]),
});

static C: LazyLock<LanguagePatterns> = LazyLock::new(|| LanguagePatterns {
    functions: compile(&[r"^(?:static\s+|inline\s+)*\w+[\s*]+(\w+)\s*\([^)]*\)\s*\{"]),
    classes: compile(&[r"^(?:typedef\s+)?(?:struct|union|enum)\s+(\w+)\s*\{"]),
    imports: compile(&[r#"^\s*#\s*include\s*([<"][^>"]+[>"])"#]),
});

static CPP: LazyLock<LanguagePatterns> = LazyLock::new(|| LanguagePatterns {
    functions: compile(&[r"^\w+(?:::\w+)*[\s*&]+(\w+)\s*\([^)]*\)\s*(?:const)?\s*\{"]),
    classes: compile(&[r"^(?:class|struct)\s+(\w+)(?:\s*:\s*(?:public|protected|private)?\s*([\w:]+))?"]),
    imports: compile(&[r#"^\s*#\s*include\s*([<"][^>"]+[>"])"#]),
});

fn patterns_for(language: &str) -> Option<&'static LanguagePatterns> {
    match language_family(language) {
        "python" => Some(&PYTHON),
        "go" => Some(&GO),
        "typescript" | "javascript" => Some(&TYPESCRIPT),
        "java" => Some(&JAVA),
        "rust" => Some(&RUST),
        "ruby" => Some(&RUBY),
        "c" => Some(&C),
        "cpp" => Some(&CPP),
        _ => None,
    }
}

/// Regex-based scanner producing the same model as the tree-sitter scanner
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackScanner;

impl FallbackScanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan(&self, path: &str, content: &str, language: &str) -> FileSyntax {
        let mut syntax = FileSyntax::empty(path, language);
        syntax.lines = line_count(content);
        syntax.tokens = content.split_whitespace().count();
        syntax.todo_count = count_todo_markers(content);
        syntax.content_hash = content_hash(content);
        syntax.parsed_with_fallback = true;

        let Some(patterns) = patterns_for(language) else {
            return syntax;
        };
        let lines: Vec<&str> = content.lines().collect();

        syntax.functions = extract_functions(&lines, patterns, language);
        syntax.classes = extract_classes(content, patterns, language);
        syntax.imports = extract_imports(content, patterns, language);
        syntax.has_main_guard = if language == "python" {
            MAIN_GUARD_RE.is_match(content)
        } else {
            syntax.functions.iter().any(|f| f.name == "main")
        };
        syntax
    }
}

fn extract_functions(lines: &[&str], patterns: &LanguagePatterns, language: &str) -> Vec<FunctionDef> {
    let mut functions = Vec::new();
    let braces = uses_braces(language);

    for (idx, line) in lines.iter().enumerate() {
        let Some(caps) = patterns.functions.iter().find_map(|re| re.captures(line)) else {
            continue;
        };
        let Some(name) = caps.get(1).map(|m| m.as_str().to_string()) else {
            continue;
        };
        if CONTROL_KEYWORDS.contains(&name.as_str()) {
            continue;
        }

        let (body_start, body_end) = if braces {
            brace_body(lines, idx)
        } else {
            indented_body(lines, idx)
        };
        let body_start = body_start.min(lines.len());
        let body_end = body_end.clamp(body_start, lines.len());
        let body_lines = &lines[body_start..body_end];
        let body_tokens: usize = body_lines.iter().map(|l| l.split_whitespace().count()).sum();

        let header = line.split('{').next().unwrap_or(line);
        let signature_tokens = header.split_whitespace().count().max(1);

        let params = PARAMS_RE
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        functions.push(FunctionDef {
            name,
            params,
            body_tokens,
            signature_tokens,
            nesting_depth: indentation_nesting(body_lines),
            start_line: idx + 1,
            end_line: body_end.max(idx + 1),
            call_targets: None,
            decorators: python_decorators(lines, idx, language),
        });
    }
    functions
}

/// Lines strictly inside the braces opened on (or after) `start`
fn brace_body(lines: &[&str], start: usize) -> (usize, usize) {
    let mut depth: i64 = 0;
    let mut opened = false;
    for (offset, line) in lines[start..].iter().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return (start + 1, start + offset);
        }
    }
    (start + 1, lines.len())
}

/// Lines indented deeper than the definition; a Ruby `end` sits at the
/// definition's own indent and closes the body the same way
fn indented_body(lines: &[&str], start: usize) -> (usize, usize) {
    let base = indent_width(lines[start]);
    let mut end = start + 1;
    for (offset, line) in lines[start + 1..].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if indent_width(line) <= base {
            return (start + 1, start + 1 + offset);
        }
        end = start + 2 + offset;
    }
    (start + 1, end)
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Indentation of the deepest line relative to the first body line, in 4-space steps
fn indentation_nesting(body: &[&str]) -> usize {
    let mut base: Option<usize> = None;
    let mut max = 0;
    for line in body.iter().filter(|l| !l.trim().is_empty()) {
        let indent = indent_width(line);
        let base_indent = *base.get_or_insert(indent);
        max = max.max(indent.saturating_sub(base_indent) / 4);
    }
    max
}

fn python_decorators(lines: &[&str], idx: usize, language: &str) -> Vec<String> {
    if language != "python" {
        return Vec::new();
    }
    let mut decorators = Vec::new();
    let mut cursor = idx;
    while cursor > 0 {
        cursor -= 1;
        let trimmed = lines[cursor].trim();
        if !trimmed.starts_with('@') {
            break;
        }
        let name = trimmed.trim_start_matches('@');
        decorators.push(name.split('(').next().unwrap_or(name).trim().to_string());
    }
    decorators.reverse();
    decorators
}

fn extract_classes(content: &str, patterns: &LanguagePatterns, language: &str) -> Vec<ClassDef> {
    let mut classes = Vec::new();
    for re in &patterns.classes {
        for caps in re.captures_iter(content) {
            let Some(name) = caps.get(1).map(|m| m.as_str().to_string()) else {
                continue;
            };
            if classes.iter().any(|c: &ClassDef| c.name == name) {
                continue;
            }
            let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            let bases: Vec<String> = caps
                .get(2)
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .map(|b| b.trim().to_string())
                        .filter(|b| !b.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            let is_abstract = match language_family(language) {
                "python" => bases.iter().any(|b| b == "ABC" || b == "Protocol"),
                "java" | "typescript" => whole.contains("abstract") || whole.contains("interface"),
                "rust" => whole.contains("trait"),
                "go" => whole.contains("interface"),
                _ => false,
            };
            classes.push(ClassDef {
                name,
                bases,
                methods: Vec::new(),
                fields: Vec::new(),
                is_abstract,
                decorators: Vec::new(),
            });
        }
    }
    classes
}

fn extract_imports(content: &str, patterns: &LanguagePatterns, language: &str) -> Vec<ImportDecl> {
    let mut imports = Vec::new();
    for (pattern_idx, re) in patterns.imports.iter().enumerate() {
        for caps in re.captures_iter(content) {
            let Some(raw) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };
            let import = match language_family(language) {
                "c" | "cpp" => {
                    let mut import = ImportDecl::new(raw.trim_matches(|c| c == '<' || c == '>' || c == '"'));
                    import.is_system = raw.starts_with('<');
                    import
                }
                "rust" if pattern_idx == 1 => ImportDecl::new(format!("self::{}", raw)),
                "ruby" if pattern_idx == 1 && !raw.starts_with('.') => {
                    ImportDecl::new(format!("./{}", raw))
                }
                _ => ImportDecl::new(raw),
            };
            imports.push(import);
        }
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_fallback_body_and_nesting() {
        let code = "import os\nfrom pkg.util import helper\n\n@cli.command\ndef run(a, b):\n    if a:\n        for x in b:\n            print(x)\n    return a\n\ndef stub():\n    pass\n\nif __name__ == \"__main__\":\n    run(1, [2])\n";
        let syntax = FallbackScanner::new().scan("tool.py", code, "python");

        assert!(syntax.parsed_with_fallback);
        assert!(syntax.has_main_guard);
        assert_eq!(syntax.functions.len(), 2);

        let run = &syntax.functions[0];
        assert_eq!(run.name, "run");
        assert_eq!(run.params, vec!["a", "b"]);
        assert_eq!(run.nesting_depth, 2);
        assert_eq!(run.decorators, vec!["cli.command"]);
        assert!(run.call_targets.is_none());
        assert!(syntax.functions[1].is_stub());

        let sources: Vec<&str> = syntax.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["os", "pkg.util"]);
    }

    #[test]
    fn test_c_fallback_braces_and_includes() {
        let code = "#include <stdio.h>\n#include \"util.h\"\n\nint add(int a, int b) {\n    int c = a + b;\n    return c;\n}\n\nint main(void) {\n    return add(1, 2);\n}\n";
        let syntax = FallbackScanner::new().scan("add.c", code, "c");

        let names: Vec<&str> = syntax.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["add", "main"]);
        assert_eq!(syntax.functions[0].body_tokens, 8);
        assert!(syntax.has_main_guard);
        assert!(syntax.imports[0].is_system);
        assert_eq!(syntax.imports[1].source, "util.h");
        assert!(!syntax.imports[1].is_system);
    }
}
