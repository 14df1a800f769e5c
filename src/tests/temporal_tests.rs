// Temporal Tests
//
// Scripted git histories with fixed authors and timestamps. Every test
// returns early when git is not installed.

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::AnalysisConfig;
use crate::temporal::{self, GitExtractor};
use crate::tests::helpers::{commit_all, git_available, init_repo, unique_temp_dir, write_file};

const DAY: i64 = 86_400;
/// 2024-01-01T00:00:00Z
const START: i64 = 1_704_067_200;

fn config(min_commits: usize) -> AnalysisConfig {
    AnalysisConfig {
        git_min_commits: min_commits,
        ..AnalysisConfig::default()
    }
}

/// Six commits: `core.py` and `db.py` always change together, `ui.py`
/// changes alone, and two authors share `core.py`.
fn scripted_history(root: &Path) {
    init_repo(root);
    write_file(root, "core.py", "def a():\n    return 0\n");
    write_file(root, "db.py", "def q():\n    return 0\n");
    write_file(root, "ui.py", "def v():\n    return 0\n");
    commit_all(root, "initial import", "alice", START);

    for i in 1..=4 {
        write_file(root, "core.py", &format!("def a():\n    return {i}\n"));
        write_file(root, "db.py", &format!("def q():\n    return {i}\n"));
        let author = if i % 2 == 0 { "alice" } else { "bob" };
        let message = if i == 3 { "fix query bug" } else { "extend core" };
        commit_all(root, message, author, START + i * 7 * DAY);
    }

    write_file(root, "ui.py", "def v():\n    return 1\n");
    commit_all(root, "refactor view", "carol", START + 40 * DAY);
}

fn analyzed() -> BTreeSet<String> {
    ["core.py", "db.py", "ui.py"].iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod git_extraction_tests {
    use super::*;

    #[test]
    fn test_not_a_repository() {
        if !git_available() {
            return;
        }
        let dir = unique_temp_dir("temporal_no_repo");
        let extractor = GitExtractor::new(dir.path(), 100);

        assert!(!extractor.is_git_repo());
        assert!(extractor.extract().is_err());
        assert!(temporal::analyze_history(dir.path(), &config(1), &analyzed()).is_none());
    }

    #[test]
    fn test_extract_commits_newest_first() {
        if !git_available() {
            return;
        }
        let dir = unique_temp_dir("temporal_extract");
        scripted_history(dir.path());

        let extractor = GitExtractor::new(dir.path(), 100);
        let history = extractor.extract().unwrap().expect("history");

        assert_eq!(history.total_commits(), 6);
        assert_eq!(history.commits[0].subject, "refactor view");
        assert_eq!(history.commits[0].files, vec!["ui.py".to_string()]);
        assert_eq!(history.commits[5].timestamp, START);
        assert_eq!(history.team_size(), 3);
        assert_eq!(history.span_days, 40);
        assert!(extractor.head_commit().is_some_and(|sha| sha.len() == 40));
    }

    #[test]
    fn test_max_commits_limits_history() {
        if !git_available() {
            return;
        }
        let dir = unique_temp_dir("temporal_limit");
        scripted_history(dir.path());

        let history = GitExtractor::new(dir.path(), 2).extract().unwrap().unwrap();
        assert_eq!(history.total_commits(), 2);
    }
}

#[cfg(test)]
mod history_analysis_tests {
    use super::*;

    #[test]
    fn test_churn_series_per_file() {
        if !git_available() {
            return;
        }
        let dir = unique_temp_dir("temporal_churn");
        scripted_history(dir.path());

        let analysis = temporal::analyze_history(dir.path(), &config(3), &analyzed()).unwrap();
        assert!(analysis.has_churn());

        let core = &analysis.churn["core.py"];
        assert_eq!(core.total_changes, 5);
        assert!((core.fix_ratio - 0.2).abs() < 1e-9);
        // alice 3 commits, bob 2: between one and two effective authors
        assert!(core.bus_factor > 1.0 && core.bus_factor < 2.0);

        let ui = &analysis.churn["ui.py"];
        assert_eq!(ui.total_changes, 2);
        assert!((ui.refactor_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cochange_pairs_require_repeated_changes() {
        if !git_available() {
            return;
        }
        let dir = unique_temp_dir("temporal_cochange");
        scripted_history(dir.path());

        let analysis = temporal::analyze_history(dir.path(), &config(3), &analyzed()).unwrap();
        let matrix = &analysis.cochange;

        let pair = &matrix.pairs[&("core.py".to_string(), "db.py".to_string())];
        assert_eq!(pair.cochange_count, 5);
        assert!((pair.confidence_a_b - 1.0).abs() < 1e-9);
        // ui.py only shared the initial commit with the others
        assert!(!matrix.pairs.contains_key(&("core.py".to_string(), "ui.py".to_string())));
        assert_eq!(matrix.file_change_counts["ui.py"], 2);
    }

    #[test]
    fn test_short_history_skips_churn_but_keeps_commits() {
        if !git_available() {
            return;
        }
        let dir = unique_temp_dir("temporal_short");
        scripted_history(dir.path());

        let analysis = temporal::analyze_history(dir.path(), &config(50), &analyzed()).unwrap();
        assert!(!analysis.has_churn());
        assert!(analysis.cochange.pairs.is_empty());
        assert_eq!(analysis.history.total_commits(), 6);
    }
}
