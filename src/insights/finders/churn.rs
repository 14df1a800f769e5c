//! Change-history patterns: fixes piling up, erratic edits, directories in trouble

use super::{by_severity, tiered_field};
use crate::insights::engine::Finder;
use crate::insights::models::{
    confidence_from_margins, Effort, Evidence, Finding, Polarity, Scope,
};
use crate::insights::store::{AnalysisStore, Requirement};
use crate::temporal::Trajectory;

/// Central file where a large share of changes are fixes
pub struct BugAttractorFinder;

impl BugAttractorFinder {
    const SEVERITY: f64 = 0.70;
    const FIX_RATIO: f64 = 0.4;
    const PAGERANK_PCTL: f64 = 0.80;
}

impl Finder for BugAttractorFinder {
    fn name(&self) -> &'static str {
        "bug_attractor"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::CoChange]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = tiered_field(store) else {
            return Vec::new();
        };
        let median = field.hotspot_median();
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            if fs.total_changes <= median || fs.fix_ratio <= Self::FIX_RATIO {
                continue;
            }
            let pr = fs.percentile("pagerank");
            if pr <= Self::PAGERANK_PCTL {
                continue;
            }

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY,
                title: format!("Bug attractor: {path} ({:.0}% fixes)", fs.fix_ratio * 100.0),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new(
                        "fix_ratio",
                        fs.fix_ratio,
                        fs.percentile("fix_ratio"),
                        format!("{:.0}% of changes are bug fixes", fs.fix_ratio * 100.0),
                    ),
                    Evidence::new(
                        "pagerank",
                        fs.pagerank,
                        pr,
                        format!("Top {:.0}% by centrality", (1.0 - pr) * 100.0),
                    ),
                    Evidence::new(
                        "total_changes",
                        fs.total_changes as f64,
                        0.0,
                        format!("{} total changes", fs.total_changes),
                    ),
                    Evidence::new(
                        "blast_radius_size",
                        fs.blast_radius_size as f64,
                        0.0,
                        format!("Blast radius: {} files", fs.blast_radius_size),
                    ),
                ],
                suggestion:
                    "40%+ of changes are bug fixes in a central file. Root-cause analysis needed."
                        .to_string(),
                confidence: confidence_from_margins(&[
                    (fs.fix_ratio, Self::FIX_RATIO, Polarity::HighIsBad),
                    (pr, Self::PAGERANK_PCTL, Polarity::HighIsBad),
                ]),
                effort: Effort::Medium,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}

/// Active file that keeps needing fixes, central or not
pub struct BugMagnetFinder;

impl BugMagnetFinder {
    const SEVERITY: f64 = 0.80;
    const FIX_RATIO: f64 = 0.4;
    const MIN_CHANGES: usize = 5;
    const COMPLEX_LOAD: f64 = 30.0;
}

impl Finder for BugMagnetFinder {
    fn name(&self) -> &'static str {
        "bug_magnet"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::CoChange]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = tiered_field(store) else {
            return Vec::new();
        };
        let median = field.hotspot_median();
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            if fs.total_changes <= median
                || fs.total_changes < Self::MIN_CHANGES
                || fs.fix_ratio < Self::FIX_RATIO
            {
                continue;
            }

            let mut severity = (Self::SEVERITY + (fs.fix_ratio - Self::FIX_RATIO) * 0.3).min(0.95);
            let fixes = (fs.total_changes as f64 * fs.fix_ratio) as usize;
            let mut evidence = vec![
                Evidence::new(
                    "fix_ratio",
                    fs.fix_ratio,
                    fs.percentile("fix_ratio"),
                    format!(
                        "{:.0}% of changes ({}/{}) are bug fixes",
                        fs.fix_ratio * 100.0,
                        fixes,
                        fs.total_changes
                    ),
                ),
                Evidence::new(
                    "total_changes",
                    fs.total_changes as f64,
                    fs.percentile("total_changes"),
                    format!("changed {} times", fs.total_changes),
                ),
            ];
            if fs.cognitive_load > Self::COMPLEX_LOAD {
                severity = (severity + 0.05).min(0.95);
                evidence.push(Evidence::new(
                    "cognitive_load",
                    fs.cognitive_load,
                    fs.percentile("cognitive_load"),
                    format!("cognitive load {:.1} (complex code)", fs.cognitive_load),
                ));
            }
            evidence.push(Evidence::new(
                "refactor_ratio",
                fs.refactor_ratio,
                fs.percentile("refactor_ratio"),
                format!("{:.0}% of changes were refactors", fs.refactor_ratio * 100.0),
            ));

            let suggestion = if fs.refactor_ratio < 0.1 {
                "This file keeps breaking and is rarely restructured. Refactor it and add tests around the parts the fixes touch."
            } else {
                "This file keeps breaking despite refactoring. Look for root cause patterns in git history and add tests."
            };
            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity,
                title: format!("Bug magnet: {path}"),
                files: vec![path.clone()],
                evidence,
                suggestion: suggestion.to_string(),
                confidence: confidence_from_margins(&[(
                    fs.fix_ratio,
                    Self::FIX_RATIO,
                    Polarity::HighIsBad,
                )])
                .max(0.75),
                effort: Effort::High,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}

/// Active file whose change rate spikes or swings instead of settling
pub struct ThrashingCodeFinder;

impl ThrashingCodeFinder {
    const CV: f64 = 1.5;
    const MIN_CHANGES: usize = 3;
    const MIN_LINES: usize = 30;

    fn severity(spiking: bool, erratic: bool, cv: f64) -> f64 {
        match (spiking, erratic) {
            (true, true) => 0.90,
            (true, false) => 0.80,
            _ if cv > 2.0 => 0.85,
            _ => 0.75,
        }
    }
}

impl Finder for ThrashingCodeFinder {
    fn name(&self) -> &'static str {
        "thrashing_code"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::CoChange]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = tiered_field(store) else {
            return Vec::new();
        };
        let median = field.hotspot_median();
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            if fs.total_changes <= median
                || fs.total_changes < Self::MIN_CHANGES
                || fs.lines < Self::MIN_LINES
            {
                continue;
            }
            let spiking = fs.churn_trajectory == Trajectory::Spiking;
            let erratic = fs.churn_cv > Self::CV;
            if !spiking && !erratic {
                continue;
            }

            let confidence = if erratic {
                confidence_from_margins(&[(fs.churn_cv, Self::CV, Polarity::HighIsBad)])
            } else {
                0.75
            };
            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::severity(spiking, erratic, fs.churn_cv),
                title: format!("Thrashing code: {path}"),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new(
                        "churn_trajectory",
                        0.0,
                        0.0,
                        format!("change pattern: {}", fs.churn_trajectory),
                    ),
                    Evidence::new(
                        "churn_cv",
                        fs.churn_cv,
                        fs.percentile("churn_cv"),
                        format!("change variability {:.2} (>{} is erratic)", fs.churn_cv, Self::CV),
                    ),
                    Evidence::new(
                        "total_changes",
                        fs.total_changes as f64,
                        fs.percentile("total_changes"),
                        format!("changed {} times with no stable pattern", fs.total_changes),
                    ),
                    Evidence::new(
                        "change_entropy",
                        fs.change_entropy,
                        fs.percentile("change_entropy"),
                        format!(
                            "edits spread over ~{:.0} time windows",
                            2f64.powf(fs.change_entropy)
                        ),
                    ),
                ],
                suggestion: "This code can't stabilize. Review recent changes for conflicting requirements or unclear specs. Consider a design review.".to_string(),
                confidence: confidence.max(0.70),
                effort: Effort::Medium,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}

/// Directory where risky or churning files cluster
pub struct DirectoryHotspotFinder;

impl DirectoryHotspotFinder {
    const MIN_FILES: usize = 3;
    const HIGH_RISK_FILES: usize = 2;
    const HOTSPOT_SHARE: f64 = 0.5;
    const HIGH_RISK: f64 = 0.7;
    /// High-risk files named in the finding
    const SHOWN_FILES: usize = 5;
}

impl Finder for DirectoryHotspotFinder {
    fn name(&self) -> &'static str {
        "directory_hotspot"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = tiered_field(store) else {
            return Vec::new();
        };
        let mut findings = Vec::new();

        for (dir, ds) in &field.per_directory {
            if dir.is_empty() || dir == "." || ds.file_count < Self::MIN_FILES {
                continue;
            }
            if dir.to_lowercase().contains("test") {
                continue;
            }
            let high_risk_share = ds.high_risk_file_count as f64 / ds.file_count as f64;
            let hotspot_share = ds.hotspot_file_count as f64 / ds.file_count as f64;
            let high_risk = ds.high_risk_file_count >= Self::HIGH_RISK_FILES;
            let hot = hotspot_share > Self::HOTSPOT_SHARE;
            if !high_risk && !hot {
                continue;
            }

            let severity = if high_risk && hot {
                0.90
            } else if high_risk_share > 0.5 {
                0.88
            } else {
                0.80
            };
            let mut margins = Vec::new();
            if high_risk {
                margins.push((high_risk_share, 0.3, Polarity::HighIsBad));
            }
            if hot {
                margins.push((hotspot_share, Self::HOTSPOT_SHARE, Polarity::HighIsBad));
            }

            let risky: Vec<String> = field
                .per_file
                .values()
                .filter(|fs| fs.parent_dir == *dir && fs.risk_score > Self::HIGH_RISK)
                .take(Self::SHOWN_FILES)
                .map(|fs| fs.path.clone())
                .collect();
            let files = if risky.is_empty() { vec![dir.clone()] } else { risky };

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity,
                title: format!("Directory hotspot: {dir}/"),
                files,
                evidence: vec![
                    Evidence::new(
                        "high_risk_file_count",
                        ds.high_risk_file_count as f64,
                        0.0,
                        format!("{}/{} files are high-risk", ds.high_risk_file_count, ds.file_count),
                    ),
                    Evidence::new(
                        "hotspot_file_count",
                        ds.hotspot_file_count as f64,
                        0.0,
                        format!(
                            "{}/{} files are active hotspots",
                            ds.hotspot_file_count, ds.file_count
                        ),
                    ),
                    Evidence::new(
                        "avg_complexity",
                        ds.avg_complexity,
                        0.0,
                        format!("average cognitive load {:.1}", ds.avg_complexity),
                    ),
                    Evidence::new(
                        "avg_churn",
                        ds.avg_churn,
                        0.0,
                        format!("average {:.1} changes per file", ds.avg_churn),
                    ),
                ],
                suggestion: format!(
                    "This entire directory has systemic issues. Consider refactoring {dir}/ as a whole rather than individual files."
                ),
                confidence: confidence_from_margins(&margins).max(0.75),
                effort: Effort::High,
                scope: Scope::Module,
            });
        }
        by_severity(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{DirectorySignals, FileSignals, NormalizationTier, SignalField};

    fn store_with(files: Vec<FileSignals>) -> AnalysisStore {
        let mut field = SignalField::new(NormalizationTier::Bayesian);
        for file in files {
            field.per_file.insert(file.path.clone(), file);
        }
        let mut store = AnalysisStore::new(".");
        store.signal_field = Some(field);
        store
    }

    /// Four quiet files (1 change each) so the hotspot median is 1
    fn with_quiet(active: FileSignals) -> Vec<FileSignals> {
        let mut files: Vec<FileSignals> = (0..4)
            .map(|i| {
                let mut f = FileSignals::new(format!("pkg/quiet{i}.py"));
                f.total_changes = 1;
                f
            })
            .collect();
        files.push(active);
        files
    }

    #[test]
    fn test_bug_attractor_needs_centrality() {
        let mut hub = FileSignals::new("pkg/hub.py");
        hub.total_changes = 10;
        hub.fix_ratio = 0.6;
        hub.percentiles.insert("pagerank".into(), 0.9);
        let mut leaf = FileSignals::new("pkg/leaf.py");
        leaf.total_changes = 10;
        leaf.fix_ratio = 0.6;
        leaf.percentiles.insert("pagerank".into(), 0.5);

        let mut files = with_quiet(hub);
        files.push(leaf);
        let findings = BugAttractorFinder.find(&store_with(files));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Bug attractor: pkg/hub.py (60% fixes)");
        assert!((findings[0].evidence[1].percentile - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_bug_magnet_severity_scales_with_fixes_and_load() {
        let mut magnet = FileSignals::new("pkg/magnet.py");
        magnet.total_changes = 10;
        magnet.fix_ratio = 0.8;
        magnet.cognitive_load = 45.0;
        let findings = BugMagnetFinder.find(&store_with(with_quiet(magnet)));
        assert_eq!(findings.len(), 1);
        // 0.80 + 0.4 * 0.3, then +0.05 for the load
        assert!((findings[0].severity - 0.95).abs() < 1e-9);
        assert!(findings[0].evidence.iter().any(|e| e.signal == "refactor_ratio"));
        assert!(findings[0].confidence >= 0.75);
    }

    #[test]
    fn test_bug_magnet_needs_enough_history() {
        let mut young = FileSignals::new("pkg/young.py");
        young.total_changes = 4;
        young.fix_ratio = 1.0;
        assert!(BugMagnetFinder.find(&store_with(with_quiet(young))).is_empty());
    }

    #[test]
    fn test_thrashing_severity_ladder() {
        assert_eq!(ThrashingCodeFinder::severity(true, true, 2.5), 0.90);
        assert_eq!(ThrashingCodeFinder::severity(true, false, 0.4), 0.80);
        assert_eq!(ThrashingCodeFinder::severity(false, true, 2.5), 0.85);
        assert_eq!(ThrashingCodeFinder::severity(false, true, 1.8), 0.75);
    }

    #[test]
    fn test_thrashing_skips_small_files() {
        let mut big = FileSignals::new("pkg/big.py");
        big.total_changes = 8;
        big.lines = 120;
        big.churn_trajectory = Trajectory::Spiking;
        big.change_entropy = 2.0;
        let mut small = big.clone();
        small.path = "pkg/small.py".into();
        small.lines = 10;

        let mut files = with_quiet(big);
        files.push(small);
        let findings = ThrashingCodeFinder.find(&store_with(files));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].files, vec!["pkg/big.py"]);
        assert!(findings[0].evidence[3].description.contains("~4 time windows"));
    }

    fn directory(path: &str, files: usize, high_risk: usize, hotspots: usize) -> DirectorySignals {
        DirectorySignals {
            path: path.to_string(),
            file_count: files,
            high_risk_file_count: high_risk,
            hotspot_file_count: hotspots,
            ..DirectorySignals::default()
        }
    }

    #[test]
    fn test_directory_hotspot_reads_directory_signals() {
        let mut risky = FileSignals::new("core/engine.py");
        risky.parent_dir = "core".into();
        risky.risk_score = 0.9;
        let mut store = store_with(vec![risky]);
        let field = store.signal_field.as_mut().unwrap();
        for ds in [
            directory("core", 4, 2, 3),
            directory("api", 4, 0, 3),
            directory("tests", 5, 5, 5),
            directory("tiny", 2, 2, 2),
            directory("calm", 6, 1, 1),
        ] {
            field.per_directory.insert(ds.path.clone(), ds);
        }

        let findings = DirectoryHotspotFinder.find(&store);
        let titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Directory hotspot: core/", "Directory hotspot: api/"]);
        assert_eq!(findings[0].severity, 0.90);
        assert_eq!(findings[0].files, vec!["core/engine.py"]);
        // No high-risk members: the directory stands in
        assert_eq!(findings[1].files, vec!["api"]);
        assert_eq!(findings[1].scope, Scope::Module);
    }

    #[test]
    fn test_churn_finders_skip_absolute_tier() {
        let mut magnet = FileSignals::new("pkg/magnet.py");
        magnet.total_changes = 10;
        magnet.fix_ratio = 0.9;
        let mut store = store_with(with_quiet(magnet));
        if let Some(field) = store.signal_field.as_mut() {
            field.tier = NormalizationTier::Absolute;
        }
        assert!(BugMagnetFinder.find(&store).is_empty());
        assert!(DirectoryHotspotFinder.find(&store).is_empty());
    }
}
