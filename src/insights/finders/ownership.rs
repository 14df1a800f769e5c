//! Who knows the code: single owners, untested central files, team boundaries

use std::collections::BTreeSet;

use super::{by_severity, tiered_field};
use crate::insights::engine::Finder;
use crate::insights::models::{
    confidence_from_margins, Effort, Evidence, Finding, Polarity, Scope,
};
use crate::insights::store::{AnalysisStore, Requirement};
use crate::scanning::models::{file_stem, parent_dir};
use crate::semantics::Role;

/// Important, non-trivial file only one person has ever changed
pub struct TruckFactorFinder;

impl TruckFactorFinder {
    const SEVERITY: f64 = 0.85;
    const MIN_LINES: usize = 50;
    const PAGERANK_PCTL: f64 = 0.70;
    const BLAST: usize = 3;
}

impl Finder for TruckFactorFinder {
    fn name(&self) -> &'static str {
        "truck_factor"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::CoChange]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = tiered_field(store) else {
            return Vec::new();
        };
        // A single author is a tautology for solo projects
        if field.global.team_size <= 1 {
            return Vec::new();
        }
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            if fs.lines < Self::MIN_LINES || fs.bus_factor > 1.0 || fs.total_changes == 0 {
                continue;
            }
            let pr = fs.percentile("pagerank");
            let central = pr >= Self::PAGERANK_PCTL;
            let wide = fs.blast_radius_size >= Self::BLAST;
            if !central && !wide {
                continue;
            }

            let mut margins = Vec::new();
            if central {
                margins.push((pr, Self::PAGERANK_PCTL, Polarity::HighIsBad));
            }
            let mut evidence = vec![
                Evidence::new(
                    "bus_factor",
                    fs.bus_factor,
                    0.0,
                    "only 1 person has ever modified this file",
                ),
                Evidence::new(
                    "pagerank",
                    fs.pagerank,
                    pr,
                    format!("more central than {:.0}% of files", pr * 100.0),
                ),
            ];
            if wide {
                margins.push((fs.blast_radius_size as f64 / 10.0, 0.3, Polarity::HighIsBad));
                evidence.push(Evidence::new(
                    "blast_radius_size",
                    fs.blast_radius_size as f64,
                    fs.percentile("blast_radius_size"),
                    format!("changes here affect {} other files", fs.blast_radius_size),
                ));
            }

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: if central && wide { 0.95 } else { Self::SEVERITY },
                title: format!("Truck factor risk: {path}"),
                files: vec![path.clone()],
                evidence,
                suggestion: "Document this code and have another team member review it. Consider pair programming sessions.".to_string(),
                // One author is definitive, only the importance is graded
                confidence: confidence_from_margins(&margins).max(0.7),
                effort: Effort::Low,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}

/// Test file names that cover `path`, relative to its directory
fn test_candidates(path: &str) -> Vec<String> {
    let stem = file_stem(path);
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "py" => vec![
            format!("test_{stem}.py"),
            format!("{stem}_test.py"),
            format!("tests/test_{stem}.py"),
            format!("tests/{stem}/test_{stem}.py"),
        ],
        "go" => vec![format!("{stem}_test.go")],
        "java" => vec![format!("{stem}Test.java"), format!("{stem}Tests.java")],
        "ts" | "tsx" | "js" | "jsx" => {
            let base = stem.replace(".test", "").replace(".spec", "");
            vec![
                format!("{base}.test.{ext}"),
                format!("{base}.spec.{ext}"),
                format!("__tests__/{base}.test.{ext}"),
            ]
        }
        "rb" => vec![
            format!("{stem}_test.rb"),
            format!("test_{stem}.rb"),
            format!("spec/{stem}_spec.rb"),
        ],
        _ => Vec::new(),
    }
}

/// Whether a conventional test file exists next to `path` or at the root
fn has_test_file(path: &str, all: &BTreeSet<&str>) -> bool {
    // Rust tests live inline
    if path.ends_with(".rs") {
        return true;
    }
    let dir = parent_dir(path);
    test_candidates(path).iter().any(|candidate| {
        let beside = if dir.is_empty() || dir == "." {
            candidate.clone()
        } else {
            format!("{dir}/{candidate}")
        };
        all.contains(beside.as_str()) || all.contains(candidate.as_str())
    })
}

/// Central file with a single owner and no test file
pub struct ReviewBlindspotFinder;

impl ReviewBlindspotFinder {
    const SEVERITY: f64 = 0.80;
    const BUS_FACTOR: f64 = 1.5;
    const PAGERANK_PCTL: f64 = 0.75;
    const MAX_FINDINGS: usize = 10;
}

impl Finder for ReviewBlindspotFinder {
    fn name(&self) -> &'static str {
        "review_blindspot"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::CoChange]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = tiered_field(store) else {
            return Vec::new();
        };
        if field.global.team_size <= 1 {
            return Vec::new();
        }
        let median = field.hotspot_median();
        let all: BTreeSet<&str> = field.per_file.keys().map(String::as_str).collect();
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            if fs.role == Role::Test
                || fs.total_changes <= median
                || fs.bus_factor > Self::BUS_FACTOR
            {
                continue;
            }
            let pr = fs.percentile("pagerank");
            if pr <= Self::PAGERANK_PCTL || has_test_file(path, &all) {
                continue;
            }

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY,
                title: format!("Review blindspot: {path} (no tests, single owner)"),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new(
                        "pagerank",
                        fs.pagerank,
                        pr,
                        format!("Top {:.0}% by centrality", (1.0 - pr) * 100.0),
                    ),
                    Evidence::new(
                        "bus_factor",
                        fs.bus_factor,
                        fs.percentile("bus_factor"),
                        format!("Bus factor = {:.1} (single owner)", fs.bus_factor),
                    ),
                    Evidence::new("has_test", 0.0, 0.0, "No test file found"),
                ],
                suggestion:
                    "High-centrality code with single owner and no tests. Add tests and reviewer."
                        .to_string(),
                confidence: confidence_from_margins(&[
                    (pr, Self::PAGERANK_PCTL, Polarity::HighIsBad),
                    (fs.bus_factor, Self::BUS_FACTOR, Polarity::HighIsGood),
                ]),
                effort: Effort::Medium,
                scope: Scope::File,
            });
        }
        let mut findings = by_severity(findings);
        findings.truncate(Self::MAX_FINDINGS);
        findings
    }
}

/// Modules that import each other but are maintained by different people
pub struct ConwayViolationFinder;

impl ConwayViolationFinder {
    const SEVERITY: f64 = 0.55;
    const AUTHOR_DISTANCE: f64 = 0.8;
    const COUPLING: f64 = 0.3;
}

impl Finder for ConwayViolationFinder {
    fn name(&self) -> &'static str {
        "conway_violation"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[
            Requirement::SignalField,
            Requirement::Architecture,
            Requirement::AuthorDistances,
        ]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let (Some(field), Some(architecture), Some(distances)) = (
            tiered_field(store),
            store.architecture(),
            store.author_distances.as_ref(),
        ) else {
            return Vec::new();
        };
        let mut findings = Vec::new();

        for pair in architecture.coupled_pairs() {
            let Some(&distance) = distances.get(&pair) else {
                continue;
            };
            let coupling = architecture.pair_coupling(&pair.0, &pair.1);
            if distance <= Self::AUTHOR_DISTANCE || coupling <= Self::COUPLING {
                continue;
            }
            let (a, b) = pair;

            let mut evidence = vec![
                Evidence::new(
                    "author_distance",
                    distance,
                    0.0,
                    format!("Author distance = {distance:.2} (different teams)"),
                ),
                Evidence::new(
                    "structural_coupling",
                    coupling,
                    0.0,
                    format!("{:.0}% of their cross-module imports run between them", coupling * 100.0),
                ),
            ];
            for module in [&a, &b] {
                if let Some(ms) = field.per_module.get(module.as_str()) {
                    evidence.push(Evidence::new(
                        "knowledge_gini",
                        ms.knowledge_gini,
                        0.0,
                        format!(
                            "{module}/: knowledge gini {:.2}, {:.1} commits/week",
                            ms.knowledge_gini, ms.velocity
                        ),
                    ));
                }
            }

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY,
                title: format!("Conway violation: {a} <-> {b}"),
                files: vec![a, b],
                evidence,
                suggestion: "Coupled modules maintained by different teams. Align team boundaries."
                    .to_string(),
                confidence: confidence_from_margins(&[
                    (distance, Self::AUTHOR_DISTANCE, Polarity::HighIsBad),
                    (coupling, Self::COUPLING, Polarity::HighIsBad),
                ]),
                effort: Effort::High,
                scope: Scope::ModulePair,
            });
        }
        by_severity(findings)
    }
}
