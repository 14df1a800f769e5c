//! TODO density and docstring coverage

use regex::Regex;

use crate::scanning::models::FileSyntax;

/// Markers per 100 lines
pub fn todo_density(todo_count: usize, lines: usize) -> f64 {
    if lines == 0 {
        return 0.0;
    }
    todo_count as f64 / lines as f64 * 100.0
}

fn is_docstring_start(line: &str) -> bool {
    ["\"\"\"", "'''", "r\"\"\"", "r'''"]
        .iter()
        .any(|q| line.starts_with(q))
}

/// A docstring within the first lines after `start_line` (1-based)
fn function_has_docstring(lines: &[&str], start_line: usize, end_line: usize) -> bool {
    if start_line < 1 || start_line > lines.len() {
        return false;
    }
    let stop = (start_line + 3).min(end_line).min(lines.len());
    for line in lines.iter().take(stop).skip(start_line) {
        let line = line.trim();
        if is_docstring_start(line) {
            return true;
        }
        if !line.is_empty() && !line.starts_with('#') {
            break;
        }
    }
    false
}

fn class_has_docstring(content: &str, class_name: &str) -> bool {
    let pattern = format!(r"(?m)^\s*class\s+{}\s*[:(]", regex::escape(class_name));
    let Ok(re) = Regex::new(&pattern) else {
        return false;
    };
    let Some(m) = re.find(content) else {
        return false;
    };
    for line in content[m.end()..].split('\n').take(5) {
        let line = line.trim();
        if is_docstring_start(line) {
            return true;
        }
        if !line.is_empty() && !line.starts_with('#') && !line.ends_with(':') {
            break;
        }
    }
    false
}

/// Documented functions and classes / all of them. Python only; `Some(1.0)`
/// when there is nothing to document.
pub fn docstring_coverage(syntax: &FileSyntax, content: &str) -> Option<f64> {
    if syntax.language != "python" {
        return None;
    }
    let total = syntax.function_count() + syntax.class_count();
    if total == 0 {
        return Some(1.0);
    }
    let lines: Vec<&str> = content.split('\n').collect();
    let documented = syntax
        .functions
        .iter()
        .filter(|f| function_has_docstring(&lines, f.start_line, f.end_line))
        .count()
        + syntax
            .classes
            .iter()
            .filter(|c| class_has_docstring(content, &c.name))
            .count();
    Some(documented as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_density() {
        assert_eq!(todo_density(2, 50), 4.0);
        assert_eq!(todo_density(3, 0), 0.0);
    }

    #[test]
    fn test_class_docstring_detection() {
        let content = "class Cache:\n    \"\"\"LRU cache.\"\"\"\n    pass\n\nclass Bare:\n    pass\n";
        assert!(class_has_docstring(content, "Cache"));
        assert!(!class_has_docstring(content, "Bare"));
    }

    #[test]
    fn test_non_python_has_no_coverage() {
        let syntax = FileSyntax::empty("main.go", "go");
        assert_eq!(docstring_coverage(&syntax, "package main\n"), None);
    }
}
