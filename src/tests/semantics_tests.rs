// Semantics Tests
//
// Role classification and completeness metrics on scanned files.

use std::collections::BTreeMap;
use std::fs;

use crate::scanning::{FileSyntax, TreeSitterScanner};
use crate::semantics::{self, roles::classify_role, Role};
use crate::tests::helpers::fixture_path;

fn scan_fixture(name: &str) -> (FileSyntax, String) {
    let content = fs::read_to_string(fixture_path(name)).expect("Failed to read fixture");
    let syntax = TreeSitterScanner::new()
        .scan(name, &content, "python")
        .expect("Fixture should parse");
    (syntax, content)
}

fn scan_source(path: &str, language: &str, content: &str) -> FileSyntax {
    TreeSitterScanner::new().scan(path, content, language).unwrap()
}

#[cfg(test)]
mod role_tests {
    use super::*;

    #[test]
    fn test_dataclass_fixture_is_model() {
        let (syntax, _) = scan_fixture("sample_model.py");
        assert_eq!(classify_role(&syntax), Role::Model);
    }

    #[test]
    fn test_main_guard_fixture_is_entry_point() {
        let (syntax, _) = scan_fixture("sample_entry.py");
        assert_eq!(classify_role(&syntax), Role::EntryPoint);
    }

    #[test]
    fn test_test_path_wins_over_structure() {
        let syntax = scan_source(
            "tests/test_billing.py",
            "python",
            "if __name__ == \"__main__\":\n    pass\n\ndef test_total():\n    assert 1 == 1\n",
        );
        assert_eq!(classify_role(&syntax), Role::Test);
    }

    #[test]
    fn test_protocol_classes_make_an_interface() {
        let syntax = scan_source(
            "app/ports.py",
            "python",
            "from typing import Protocol\n\nclass Store(Protocol):\n    def get(self, key): ...\n\nclass Queue(Protocol):\n    def push(self, item): ...\n",
        );
        assert_eq!(classify_role(&syntax), Role::Interface);
    }

    #[test]
    fn test_exception_module() {
        let syntax = scan_source(
            "app/errors.py",
            "python",
            "class NotFound(Exception):\n    pass\n\nclass Conflict(ValueError):\n    pass\n",
        );
        assert_eq!(classify_role(&syntax), Role::Exception);
    }

    #[test]
    fn test_argparse_import_is_cli() {
        let syntax = scan_source(
            "app/commands.py",
            "python",
            "import argparse\n\ndef build():\n    return argparse.ArgumentParser()\n",
        );
        assert_eq!(classify_role(&syntax), Role::Cli);
    }

    #[test]
    fn test_route_decorator_is_service() {
        let syntax = scan_source(
            "app/views.py",
            "python",
            "@app.get(\"/users\")\ndef list_users():\n    return []\n",
        );
        assert_eq!(classify_role(&syntax), Role::Service);
    }

    #[test]
    fn test_plain_functions_are_utility() {
        let syntax = scan_source(
            "app/helpers.py",
            "python",
            "def slugify(text):\n    return text.lower()\n",
        );
        assert_eq!(classify_role(&syntax), Role::Utility);
    }

    #[test]
    fn test_c_main_is_not_misclassified_as_test() {
        let content = fs::read_to_string(fixture_path("sample.c")).unwrap();
        let syntax = scan_source("sample.c", "c", &content);
        assert_ne!(classify_role(&syntax), Role::Test);
    }
}

#[cfg(test)]
mod file_semantics_tests {
    use super::*;

    #[test]
    fn test_analyze_semantics_fills_every_file() {
        let fixtures = ["sample_model.py", "sample_entry.py", "sample_simple.py", "sample_stubs.py"];
        let mut files = Vec::new();
        let mut contents = BTreeMap::new();
        for name in fixtures {
            let (syntax, content) = scan_fixture(name);
            contents.insert(name.to_string(), content);
            files.push(syntax);
        }
        let roles = semantics::classify_roles(&files);

        let result = semantics::analyze_semantics(&files, &roles, &contents);

        assert_eq!(result.len(), 4);
        assert_eq!(result["sample_model.py"].role, Role::Model);
        assert_eq!(result["sample_entry.py"].role, Role::EntryPoint);
        for s in result.values() {
            assert!(s.concept_entropy >= 0.0);
            assert!((1..=3).contains(&s.tier));
            assert!((0.0..=1.0).contains(&s.naming_drift));
            assert!(!s.primary_concept().is_empty());
        }
    }

    #[test]
    fn test_docstring_coverage_and_todo_density() {
        let (syntax, content) = scan_fixture("sample_simple.py");
        let roles = semantics::classify_roles(std::slice::from_ref(&syntax));
        let contents = BTreeMap::from([("sample_simple.py".to_string(), content)]);

        let result = semantics::analyze_semantics(std::slice::from_ref(&syntax), &roles, &contents);
        let simple = &result["sample_simple.py"];
        assert_eq!(simple.docstring_coverage, Some(1.0));
        assert_eq!(simple.todo_density, 0.0);

        let (stubs, stubs_content) = scan_fixture("sample_stubs.py");
        let roles = semantics::classify_roles(std::slice::from_ref(&stubs));
        let contents = BTreeMap::from([("sample_stubs.py".to_string(), stubs_content)]);
        let result = semantics::analyze_semantics(std::slice::from_ref(&stubs), &roles, &contents);
        assert!(result["sample_stubs.py"].todo_density > 0.0);
    }

    #[test]
    fn test_docstring_coverage_is_python_only() {
        let content = fs::read_to_string(fixture_path("sample.c")).unwrap();
        let syntax = scan_source("sample.c", "c", &content);
        let roles = semantics::classify_roles(std::slice::from_ref(&syntax));
        let contents = BTreeMap::from([("sample.c".to_string(), content)]);

        let result = semantics::analyze_semantics(std::slice::from_ref(&syntax), &roles, &contents);
        assert_eq!(result["sample.c"].docstring_coverage, None);
    }
}
