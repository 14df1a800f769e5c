// Signal Field Tests
//
// Invariants of the fused signal field on analyzed temp projects: tiers,
// percentile ranges, composite score bounds.

use std::path::Path;

use crate::analysis::{InsightAnalyzer, InsightResult};
use crate::config::AnalysisConfig;
use crate::tests::helpers::{unique_temp_dir, write_file};

/// `count` files in a chain: `m0` imports `m1` imports `m2` ...
fn chain_project(root: &Path, count: usize) {
    for i in 0..count {
        let import = if i + 1 < count {
            format!("import pkg.m{}\n\n", i + 1)
        } else {
            String::new()
        };
        let body: String = (0..=(i % 4))
            .map(|j| format!("def f{j}(x):\n    if x > {j}:\n        return x * {j}\n    return x\n\n"))
            .collect();
        write_file(root, &format!("pkg/m{i}.py"), &format!("{import}{body}"));
    }
}

fn analyze(root: &Path) -> InsightResult {
    let config = AnalysisConfig {
        parallel_workers: Some(2),
        ..AnalysisConfig::default()
    };
    InsightAnalyzer::new(root, config).analyze().unwrap()
}

fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

#[cfg(test)]
mod tier_tests {
    use super::*;

    #[test]
    fn test_small_codebase_uses_absolute_tier() {
        let dir = unique_temp_dir("signals_absolute");
        chain_project(dir.path(), 5);

        let result = analyze(dir.path());
        assert_eq!(result.store_summary.tier, "ABSOLUTE");
        assert!(result.file_signals.values().all(|f| f.percentiles.is_empty()));
    }

    #[test]
    fn test_medium_codebase_gets_percentiles() {
        let dir = unique_temp_dir("signals_bayesian");
        chain_project(dir.path(), 20);

        let result = analyze(dir.path());
        assert_eq!(result.store_summary.tier, "BAYESIAN");
        for fs in result.file_signals.values() {
            assert!(!fs.percentiles.is_empty(), "{} has no percentiles", fs.path);
            assert!(fs.percentiles.values().all(|p| in_unit_range(*p)));
        }
    }

    #[test]
    fn test_large_codebase_uses_full_tier() {
        let dir = unique_temp_dir("signals_full");
        chain_project(dir.path(), 55);

        let result = analyze(dir.path());
        assert_eq!(result.store_summary.tier, "FULL");
        assert_eq!(result.file_signals.len(), 55);
    }
}

#[cfg(test)]
mod field_tests {
    use super::*;

    #[test]
    fn test_composites_stay_in_unit_range() {
        let dir = unique_temp_dir("signals_bounds");
        chain_project(dir.path(), 20);

        let result = analyze(dir.path());
        for fs in result.file_signals.values() {
            assert!(in_unit_range(fs.risk_score), "risk {} for {}", fs.risk_score, fs.path);
            assert!(in_unit_range(fs.raw_risk));
            assert!(in_unit_range(fs.wiring_quality));
            assert!(in_unit_range(fs.file_health_score));
        }
        let global = &result.global_signals;
        for (name, value) in [
            ("codebase_health", global.codebase_health),
            ("architecture_health", global.architecture_health),
            ("wiring_score", global.wiring_score),
            ("team_risk", global.team_risk),
            ("orphan_ratio", global.orphan_ratio),
            ("phantom_ratio", global.phantom_ratio),
            ("glue_deficit", global.glue_deficit),
        ] {
            assert!(in_unit_range(value), "{} = {}", name, value);
        }
    }

    #[test]
    fn test_graph_signals_follow_the_chain() {
        let dir = unique_temp_dir("signals_chain");
        chain_project(dir.path(), 6);

        let result = analyze(dir.path());
        let head = &result.file_signals["pkg/m0.py"];
        let tail = &result.file_signals["pkg/m5.py"];

        assert_eq!(head.in_degree, 0);
        assert_eq!(head.out_degree, 1);
        assert_eq!(tail.in_degree, 1);
        // Everything upstream of the tail depends on it
        assert_eq!(tail.blast_radius_size, 5);
        assert!(tail.pagerank > head.pagerank);
        assert_eq!(result.global_signals.cycle_count, 0);
        assert_eq!(result.dependency_edges.len(), 5);
    }

    #[test]
    fn test_unimported_utility_is_not_an_orphan() {
        let dir = unique_temp_dir("signals_orphans");
        chain_project(dir.path(), 4);
        write_file(
            dir.path(),
            "pkg/stale.py",
            "class StaleReport:\n    def render(self):\n        return \"\"\n",
        );

        let result = analyze(dir.path());
        // The chain head only defines functions
        let head = &result.file_signals["pkg/m0.py"];
        assert_eq!(head.role.as_str(), "UTILITY");
        assert_eq!(head.in_degree, 0);
        assert!(!head.is_orphan);
        assert!(result.file_signals["pkg/stale.py"].is_orphan);
        assert!((result.global_signals.orphan_ratio - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_no_git_means_no_temporal_signals() {
        let dir = unique_temp_dir("signals_no_git");
        chain_project(dir.path(), 4);

        let result = analyze(dir.path());
        assert!(!result.store_summary.git_available);
        assert_eq!(result.store_summary.commits_analyzed, 0);
        assert!(result.commit_sha.is_none());
        assert!(result.file_signals.values().all(|f| f.total_changes == 0));
    }

    #[test]
    fn test_module_signals_per_directory() {
        let dir = unique_temp_dir("signals_modules");
        chain_project(dir.path(), 4);
        write_file(dir.path(), "lib/extra.py", "import pkg.m0\n\ndef extra():\n    return 1\n");

        let result = analyze(dir.path());
        assert_eq!(result.module_signals.len(), 2);
        let pkg = &result.module_signals["pkg"];
        assert_eq!(pkg.file_count, 4);
        assert!(in_unit_range(pkg.health_score));
        assert!(in_unit_range(pkg.cohesion));
    }
}
