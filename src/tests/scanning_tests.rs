// Scanning Tests
//
// The sample fixtures under fixtures/samples are the contract for the
// tree-sitter scanner: includes, structs/classes, functions and nesting.

use std::fs;

use crate::config::AnalysisConfig;
use crate::scanning::{discover_files, FileSyntax, ParallelScanner, ScanConfig, TreeSitterScanner};
use crate::tests::helpers::{fixture_path, unique_temp_dir, write_file};

fn scan_fixture(name: &str, language: &str) -> FileSyntax {
    let content = fs::read_to_string(fixture_path(name)).expect("Failed to read fixture");
    TreeSitterScanner::new()
        .scan(name, &content, language)
        .expect("Fixture should parse")
}

fn function_names(syntax: &FileSyntax) -> Vec<&str> {
    syntax.functions.iter().map(|f| f.name.as_str()).collect()
}

/// Reference for the nested loop in both `process_data` fixtures: every
/// positive value `v` contributes `0 + 1 + ... + (v - 1)`.
fn nested_sum(data: &[i64]) -> i64 {
    let mut sum = 0;
    for &v in data {
        if v > 0 {
            for j in 0..v {
                sum += j;
            }
        }
    }
    sum
}

#[cfg(test)]
mod c_fixture_tests {
    use super::*;

    #[test]
    fn test_c_sample_includes_are_system_headers() {
        let syntax = scan_fixture("sample.c", "c");

        let sources: Vec<&str> = syntax.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["stdio.h", "stdlib.h", "string.h"]);
        assert!(syntax.imports.iter().all(|i| i.is_system));
    }

    #[test]
    fn test_c_sample_struct_and_functions() {
        let syntax = scan_fixture("sample.c", "c");

        assert!(syntax.classes.iter().any(|c| c.name == "Greeter"));
        let names = function_names(&syntax);
        for expected in ["greeter_init", "greeter_greet", "process_data", "helper", "main"] {
            assert!(names.contains(&expected), "missing {} in {:?}", expected, names);
        }
        assert_eq!(syntax.function_count(), 5);
        assert!(!syntax.parsed_with_fallback);
    }

    #[test]
    fn test_c_process_data_nesting() {
        let syntax = scan_fixture("sample.c", "c");

        let process = syntax
            .functions
            .iter()
            .find(|f| f.name == "process_data")
            .expect("process_data should be extracted");
        // for -> if -> for
        assert_eq!(process.nesting_depth, 3);
        assert_eq!(syntax.max_nesting(), 3);

        let helper = syntax.functions.iter().find(|f| f.name == "helper").unwrap();
        assert_eq!(helper.nesting_depth, 0);
        assert_eq!(helper.params.len(), 1);
    }

    #[test]
    fn test_c_main_calls_greeter_functions() {
        let syntax = scan_fixture("sample.c", "c");

        let main = syntax.functions.iter().find(|f| f.name == "main").unwrap();
        let calls = main.call_targets.as_ref().expect("tree-sitter records calls");
        assert!(calls.contains(&"greeter_init".to_string()));
        assert!(calls.contains(&"greeter_greet".to_string()));
    }
}

#[cfg(test)]
mod cpp_fixture_tests {
    use super::*;

    #[test]
    fn test_cpp_sample_includes() {
        let syntax = scan_fixture("sample.cpp", "cpp");

        let sources: Vec<&str> = syntax.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["iostream", "string", "vector"]);
        assert!(syntax.imports.iter().all(|i| i.is_system));
    }

    #[test]
    fn test_cpp_abstract_base_and_subclass() {
        let syntax = scan_fixture("sample.cpp", "cpp");

        let greeter = syntax
            .classes
            .iter()
            .find(|c| c.name == "Greeter")
            .expect("Greeter class");
        assert!(greeter.is_abstract, "pure virtual greet() makes Greeter abstract");

        let hello = syntax
            .classes
            .iter()
            .find(|c| c.name == "HelloGreeter")
            .expect("HelloGreeter class");
        assert!(!hello.is_abstract);
        assert!(hello.bases.iter().any(|b| b == "Greeter"), "bases: {:?}", hello.bases);
    }

    #[test]
    fn test_cpp_template_function_and_main() {
        let syntax = scan_fixture("sample.cpp", "cpp");

        let names = function_names(&syntax);
        assert!(names.contains(&"process_data"), "{:?}", names);
        assert!(names.contains(&"main"), "{:?}", names);

        let process = syntax.functions.iter().find(|f| f.name == "process_data").unwrap();
        assert_eq!(process.nesting_depth, 3);
    }
}

#[cfg(test)]
mod nested_sum_tests {
    use super::*;

    #[test]
    fn test_nested_sum_of_one_two_three_is_four() {
        // (0) + (0 + 1) + (0 + 1 + 2)
        assert_eq!(nested_sum(&[1, 2, 3]), 4);
    }

    #[test]
    fn test_nested_sum_skips_non_positive_values() {
        assert_eq!(nested_sum(&[]), 0);
        assert_eq!(nested_sum(&[-5, 0]), 0);
        assert_eq!(nested_sum(&[-1, 3]), 3);
    }
}

#[cfg(test)]
mod python_fixture_tests {
    use super::*;

    #[test]
    fn test_python_simple_functions_and_class() {
        let syntax = scan_fixture("sample_simple.py", "python");

        let names = function_names(&syntax);
        assert!(names.contains(&"hello"));
        assert!(names.contains(&"add"));
        let calculator = syntax.classes.iter().find(|c| c.name == "Calculator").unwrap();
        let methods: Vec<&str> = calculator.methods.iter().map(|m| m.name.as_str()).collect();
        assert!(methods.contains(&"multiply"));
        assert!(methods.contains(&"divide"));
    }

    #[test]
    fn test_python_stubs_are_detected() {
        let syntax = scan_fixture("sample_stubs.py", "python");

        let stub = |name: &str| {
            syntax
                .functions
                .iter()
                .find(|f| f.name == name)
                .unwrap_or_else(|| panic!("missing {}", name))
                .is_stub()
        };
        assert!(stub("stub_pass"));
        assert!(stub("stub_ellipsis"));
        assert!(!stub("implemented_function"));
        assert!(syntax.stub_ratio() > 0.0);
        assert!(syntax.todo_count >= 1);
    }

    #[test]
    fn test_python_main_guard() {
        let entry = scan_fixture("sample_entry.py", "python");
        assert!(entry.has_main_guard);

        let simple = scan_fixture("sample_simple.py", "python");
        assert!(!simple.has_main_guard);
    }

    #[test]
    fn test_python_dataclass_decorators_are_captured() {
        let syntax = scan_fixture("sample_model.py", "python");

        let user = syntax.classes.iter().find(|c| c.name == "User").unwrap();
        assert!(user.decorators.iter().any(|d| d == "dataclass"), "{:?}", user.decorators);
    }
}

#[cfg(test)]
mod discovery_tests {
    use super::*;

    #[test]
    fn test_discover_and_scan_fixture_directory() {
        let root = fixture_path("");
        let config = AnalysisConfig::default();

        let paths = discover_files(&root, &config).unwrap();
        assert!(paths.len() >= 9, "found {:?}", paths);

        let scanner = ParallelScanner::new(ScanConfig {
            num_threads: 2,
            batch_size: 4,
        });
        let result = scanner.scan_files(&root, &paths).unwrap();

        assert_eq!(result.files.len(), paths.len());
        assert_eq!(result.stats.failed, 0);
        let sorted: Vec<&str> = result.files.iter().map(|f| f.path.as_str()).collect();
        let mut expected = sorted.clone();
        expected.sort();
        assert_eq!(sorted, expected, "scan output is sorted by path");
        assert!(result.contents.contains_key("sample.c"));
    }

    #[test]
    fn test_discovery_honours_excludes_and_hidden_dirs() {
        let dir = unique_temp_dir("discovery_excludes");
        let root = dir.path();
        write_file(root, "src/app.py", "def run():\n    return 1\n");
        write_file(root, "node_modules/lib/index.js", "module.exports = {};\n");
        write_file(root, ".hidden/secret.py", "x = 1\n");
        write_file(root, "README.md", "# not source\n");

        let paths = discover_files(root, &AnalysisConfig::default()).unwrap();
        let rel: Vec<String> = paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["src/app.py"]);
    }

    #[test]
    fn test_discovery_respects_max_files() {
        let dir = unique_temp_dir("discovery_max_files");
        for i in 0..5 {
            write_file(dir.path(), &format!("m{i}.py"), "def f():\n    return 1\n");
        }
        let config = AnalysisConfig {
            max_files: 3,
            ..AnalysisConfig::default()
        };

        let paths = discover_files(dir.path(), &config).unwrap();
        assert_eq!(paths.len(), 3);
    }
}
