// Insight Tests
//
// InsightAnalyzer end to end: a temp project with known defects in, the
// matching findings out.

use std::path::Path;

use crate::analysis::{InsightAnalyzer, InsightResult};
use crate::config::AnalysisConfig;
use crate::database::compute_identity_key;
use crate::insights::{Finding, InsightEngine};
use crate::tests::helpers::{unique_temp_dir, write_file};

/// Twenty-odd distinct lines so the copies clear the clone size floor
fn parser_source() -> String {
    let mut source = String::from("import re\n\n");
    for i in 0..12 {
        source.push_str(&format!(
            "def parse_field_{i}(line):\n    parts = re.split(r\"[,;]\", line)\n    return parts[{i} % len(parts)].strip()\n\n"
        ));
    }
    source
}

/// main -> service -> {models, utils}; utils has a phantom import;
/// `legacy.py` is imported by nothing; `parser_a` / `parser_b` are copies.
fn defect_project(root: &Path) {
    write_file(
        root,
        "app/main.py",
        "import app.service\n\nif __name__ == \"__main__\":\n    app.service.run()\n",
    );
    write_file(
        root,
        "app/service.py",
        "import app.models\nimport app.utils\n\ndef run():\n    user = app.models.User()\n    return app.utils.format_user(user)\n",
    );
    write_file(
        root,
        "app/models.py",
        "from dataclasses import dataclass\n\n@dataclass\nclass User:\n    name: str = \"\"\n    email: str = \"\"\n",
    );
    write_file(
        root,
        "app/utils.py",
        "import app.vanished\n\ndef format_user(user):\n    return f\"{user.name} <{user.email}>\"\n",
    );
    write_file(
        root,
        "app/legacy.py",
        "class LegacyExporter:\n    def export(self, rows):\n        return list(rows)\n",
    );
    write_file(root, "app/parser_a.py", &parser_source());
    write_file(root, "app/parser_b.py", &parser_source());
}

fn analyze(root: &Path) -> InsightResult {
    let config = AnalysisConfig {
        parallel_workers: Some(2),
        ..AnalysisConfig::default()
    };
    InsightAnalyzer::new(root, config).analyze().unwrap()
}

fn of_type<'a>(findings: &'a [Finding], finding_type: &str) -> Vec<&'a Finding> {
    findings.iter().filter(|f| f.finding_type == finding_type).collect()
}

#[cfg(test)]
mod analyzer_tests {
    use super::*;

    #[test]
    fn test_phantom_import_finding() {
        let dir = unique_temp_dir("insights_phantom");
        defect_project(dir.path());

        let result = analyze(dir.path());
        let phantoms = of_type(&result.findings, "phantom_imports");
        assert_eq!(phantoms.len(), 1);
        assert_eq!(phantoms[0].files, vec!["app/utils.py".to_string()]);
        assert!((phantoms[0].severity - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_orphan_findings_skip_entry_points() {
        let dir = unique_temp_dir("insights_orphans");
        defect_project(dir.path());

        let result = analyze(dir.path());
        let orphan_files: Vec<&str> = of_type(&result.findings, "orphan_code")
            .iter()
            .map(|f| f.files[0].as_str())
            .collect();
        assert!(orphan_files.contains(&"app/legacy.py"), "{:?}", orphan_files);
        assert!(!orphan_files.contains(&"app/main.py"));
        assert!(!orphan_files.contains(&"app/models.py"));
    }

    #[test]
    fn test_copy_paste_clone_finding() {
        let dir = unique_temp_dir("insights_clones");
        defect_project(dir.path());

        let result = analyze(dir.path());
        let clones = of_type(&result.findings, "copy_paste_clone");
        assert_eq!(clones.len(), 1);
        assert_eq!(
            clones[0].files,
            vec!["app/parser_a.py".to_string(), "app/parser_b.py".to_string()]
        );
        assert!(result.global_signals.clone_ratio > 0.0);
    }

    #[test]
    fn test_findings_are_ranked_and_capped() {
        let dir = unique_temp_dir("insights_ranked");
        defect_project(dir.path());

        let result = analyze(dir.path());
        assert!(!result.findings.is_empty());
        for pair in result.findings.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
        for finding in &result.findings {
            assert!((0.0..=1.0).contains(&finding.severity));
            assert!((0.0..=1.0).contains(&finding.confidence));
            assert!(!finding.files.is_empty());
        }

        let capped = InsightAnalyzer::new(
            dir.path(),
            AnalysisConfig {
                insights_max_findings: 1,
                ..AnalysisConfig::default()
            },
        )
        .analyze()
        .unwrap();
        assert_eq!(capped.findings.len(), 1);
        assert_eq!(capped.findings[0], result.findings[0]);
    }

    #[test]
    fn test_identity_keys_are_stable_across_runs() {
        let dir = unique_temp_dir("insights_identity");
        defect_project(dir.path());

        let first = analyze(dir.path());
        let second = analyze(dir.path());
        let keys = |r: &InsightResult| -> Vec<String> {
            r.findings.iter().map(|f| f.identity_key()).collect()
        };
        assert_eq!(keys(&first), keys(&second));

        let clone = of_type(&first.findings, "copy_paste_clone")[0];
        let reversed = vec![clone.files[1].clone(), clone.files[0].clone()];
        assert_eq!(clone.identity_key(), compute_identity_key("copy_paste_clone", &reversed));
    }

    #[test]
    fn test_stats_and_summary() {
        let dir = unique_temp_dir("insights_stats");
        defect_project(dir.path());

        let result = analyze(dir.path());
        assert_eq!(result.stats.files_discovered, 7);
        assert_eq!(result.stats.scan.scanned, 7);
        assert_eq!(result.stats.finders_run.len(), InsightEngine::new(10).finder_names().len());
        assert_eq!(result.store_summary.total_files, 7);
        assert_eq!(result.store_summary.total_modules, 1);
        assert!(result
            .store_summary
            .signals_available
            .contains(&"signal_field".to_string()));
        assert!(!result
            .store_summary
            .signals_available
            .contains(&"git_history".to_string()));
    }

    #[test]
    fn test_empty_directory_has_no_findings() {
        let dir = unique_temp_dir("insights_empty");

        let result = analyze(dir.path());
        assert!(result.findings.is_empty());
        assert!(result.file_signals.is_empty());
    }
}
