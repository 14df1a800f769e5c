//! Files that are central, complex or volatile enough to be worth attention first

use super::{by_severity, ranked_field, tiered_field};
use crate::insights::engine::Finder;
use crate::insights::models::{
    confidence_from_margins, Effort, Evidence, Finding, Polarity, Scope,
};
use crate::insights::store::{AnalysisStore, Requirement};
use crate::signals::FileSignals;

/// Central file that is also complex or churning
pub struct HighRiskHubFinder;

impl HighRiskHubFinder {
    const SEVERITY: f64 = 1.0;
    const PCTL: f64 = 0.90;

    fn suggestion(complex: bool, churning: bool) -> &'static str {
        match (complex, churning) {
            (true, true) => {
                "This file is central, complex, and frequently modified. Split into smaller modules to reduce coupling and simplify changes."
            }
            (true, false) => {
                "This file is central and complex. Break into smaller pieces to make changes safer and reviews easier."
            }
            _ => {
                "This file is central and churning. Consider stabilizing the interface or extracting frequently-changing parts."
            }
        }
    }
}

impl Finder for HighRiskHubFinder {
    fn name(&self) -> &'static str {
        "high_risk_hub"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = ranked_field(store) else {
            return Vec::new();
        };
        let total = field.per_file.len();
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            let pr = fs.percentile("pagerank");
            let blast = fs.percentile("blast_radius_size");
            let cog = fs.percentile("cognitive_load");
            if pr < Self::PCTL && blast < Self::PCTL {
                continue;
            }
            let complex = cog >= Self::PCTL;
            let churning = fs.churn_trajectory.is_volatile();
            if !complex && !churning {
                continue;
            }

            let mut evidence = Vec::new();
            let mut pcts = Vec::new();
            if pr >= Self::PCTL {
                pcts.push(pr);
                evidence.push(Evidence::new(
                    "pagerank",
                    fs.pagerank,
                    pr,
                    format!("{} files import this directly", fs.in_degree),
                ));
            }
            if blast >= Self::PCTL {
                pcts.push(blast);
                evidence.push(Evidence::new(
                    "blast_radius_size",
                    fs.blast_radius_size as f64,
                    blast,
                    format!(
                        "a bug here could affect {} of {} files",
                        fs.blast_radius_size, total
                    ),
                ));
            }
            if complex {
                pcts.push(cog);
                evidence.push(Evidence::new(
                    "cognitive_load",
                    fs.cognitive_load,
                    cog,
                    format!("harder to understand than {:.0}% of files", cog * 100.0),
                ));
            }
            if churning {
                evidence.push(Evidence::new(
                    "churn_trajectory",
                    0.0,
                    0.0,
                    format!(
                        "trajectory={}, {} changes",
                        fs.churn_trajectory, fs.total_changes
                    ),
                ));
            }

            let avg = pcts.iter().sum::<f64>() / pcts.len() as f64;
            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY * avg.max(0.5),
                title: format!("High-risk hub: {path}"),
                files: vec![path.clone()],
                evidence,
                suggestion: Self::suggestion(complex, churning).to_string(),
                confidence: 0.9,
                effort: Effort::Medium,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}

/// Complex file whose content is spread over unrelated concepts
pub struct GodFileFinder;

impl GodFileFinder {
    const SEVERITY: f64 = 0.8;

    fn describe_complexity(fs: &FileSignals, cog: f64) -> String {
        let mut parts = Vec::new();
        if fs.function_count > 0 {
            parts.push(format!("{} functions", fs.function_count));
        }
        if fs.lines > 0 {
            parts.push(format!("{} lines", fs.lines));
        }
        if fs.max_nesting > 3 {
            parts.push(format!("nesting depth {}", fs.max_nesting));
        }
        if parts.is_empty() {
            format!("harder to read than {:.0}% of files", cog * 100.0)
        } else {
            format!(
                "complex ({}), harder to read than {:.0}% of files",
                parts.join(", "),
                cog * 100.0
            )
        }
    }
}

impl Finder for GodFileFinder {
    fn name(&self) -> &'static str {
        "god_file"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = ranked_field(store) else {
            return Vec::new();
        };
        // Untouched files only count against the ranking when history exists
        let has_history = store.has(Requirement::CoChange);
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            if has_history && fs.total_changes == 0 {
                continue;
            }
            if fs.function_count < 3 {
                continue;
            }
            let cog = fs.percentile("cognitive_load");
            let coherence = fs
                .percentiles
                .get("semantic_coherence")
                .copied()
                .unwrap_or(1.0);
            let complex = cog >= 0.80 || fs.function_count > 10;
            if !complex || coherence > 0.30 {
                continue;
            }

            let avg = (cog + (1.0 - coherence)) / 2.0;
            let suggestion = if fs.function_count > 5 {
                format!(
                    "This file has {} functions handling unrelated concerns. Identify clusters of related functions and extract each group into its own module.",
                    fs.function_count
                )
            } else {
                "This file is complex and mixes multiple responsibilities. Look for groups of functions that work on the same data and extract each group into a focused module.".to_string()
            };
            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY * avg.max(0.5),
                title: format!("God file: {path}"),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new(
                        "cognitive_load",
                        fs.cognitive_load,
                        cog,
                        Self::describe_complexity(fs, cog),
                    ),
                    Evidence::new(
                        "semantic_coherence",
                        fs.semantic_coherence,
                        coherence,
                        format!(
                            "unfocused, code suggests multiple unrelated concerns (less focused than {:.0}% of files)",
                            (1.0 - coherence) * 100.0
                        ),
                    ),
                ],
                suggestion,
                confidence: 0.85,
                effort: Effort::High,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}

/// Churning or spiking file changed more often than most
pub struct UnstableFileFinder;

impl UnstableFileFinder {
    const SEVERITY: f64 = 0.7;
}

impl Finder for UnstableFileFinder {
    fn name(&self) -> &'static str {
        "unstable_file"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::CoChange]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = store.signal_field.as_ref() else {
            return Vec::new();
        };
        if field.per_file.len() < super::MIN_FILES {
            return Vec::new();
        }

        let mut changes: Vec<usize> = field.per_file.values().map(|f| f.total_changes).collect();
        changes.sort_unstable();
        let median = changes[changes.len() / 2];
        let span_weeks = store
            .temporal
            .as_ref()
            .map(|t| (t.history.span_days / 7).max(1))
            .unwrap_or(0);

        let mut findings = Vec::new();
        for (path, fs) in &field.per_file {
            if !fs.churn_trajectory.is_volatile() || fs.total_changes <= median {
                continue;
            }
            let pctl = fs
                .percentiles
                .get("total_changes")
                .copied()
                .unwrap_or(0.5);
            let rate = if span_weeks > 0 {
                format!("changed {} times over {} weeks", fs.total_changes, span_weeks)
            } else {
                format!("changed {} times", fs.total_changes)
            };
            let (trend, suggestion) = match fs.churn_trajectory {
                crate::temporal::Trajectory::Spiking => (
                    "change rate is increasing, more edits recently",
                    "This file is being edited more frequently. Investigate unclear requirements or missing test coverage.",
                ),
                _ => (
                    "change rate is volatile, no sign of settling down",
                    "This file has been modified repeatedly without stabilizing. Consider splitting it or adding tests to reduce churn.",
                ),
            };

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY * pctl.max(0.3),
                title: format!("Unstable file: {path}"),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new("total_changes", fs.total_changes as f64, pctl, rate),
                    Evidence::new("churn_trajectory", fs.churn_slope, 0.0, trend),
                ],
                suggestion: suggestion.to_string(),
                confidence: 0.75,
                effort: Effort::Medium,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}

/// Active file much riskier than the files around it
pub struct WeakLinkFinder;

impl WeakLinkFinder {
    const SEVERITY: f64 = 0.75;
    const DELTA_H: f64 = 0.4;
}

impl Finder for WeakLinkFinder {
    fn name(&self) -> &'static str {
        "weak_link"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::Structural]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = tiered_field(store) else {
            return Vec::new();
        };
        let median = field.hotspot_median();
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            if fs.total_changes <= median || fs.is_orphan {
                continue;
            }
            let delta_h = field.delta_h.get(path).copied().unwrap_or(0.0);
            if delta_h <= Self::DELTA_H {
                continue;
            }

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: (Self::SEVERITY + (delta_h - Self::DELTA_H) * 0.25).min(0.85),
                title: format!("Weak link: {path} (Δh = {delta_h:.2})"),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new(
                        "delta_h",
                        delta_h,
                        0.0,
                        format!("Δh = {delta_h:.2} (much worse than neighbors)"),
                    ),
                    Evidence::new(
                        "raw_risk",
                        fs.raw_risk,
                        0.0,
                        format!("Raw risk = {:.2}", fs.raw_risk),
                    ),
                    Evidence::new(
                        "risk_score",
                        fs.risk_score,
                        0.0,
                        format!("Risk score = {:.2}", fs.risk_score),
                    ),
                ],
                suggestion: "This file drags down its healthy neighborhood. Prioritize improvement."
                    .to_string(),
                confidence: confidence_from_margins(&[(delta_h, Self::DELTA_H, Polarity::HighIsBad)]),
                effort: Effort::Medium,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}

/// Central, actively changed file known by a single author
pub struct KnowledgeSiloFinder;

impl KnowledgeSiloFinder {
    const SEVERITY: f64 = 0.70;
    const BUS_FACTOR: f64 = 1.5;
    const PAGERANK_PCTL: f64 = 0.75;
}

impl Finder for KnowledgeSiloFinder {
    fn name(&self) -> &'static str {
        "knowledge_silo"
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
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            if fs.total_changes <= median || fs.bus_factor > Self::BUS_FACTOR {
                continue;
            }
            let pr = fs.percentile("pagerank");
            if pr <= Self::PAGERANK_PCTL {
                continue;
            }

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY,
                title: format!("Knowledge silo: {path} (bus factor = {:.1})", fs.bus_factor),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new(
                        "bus_factor",
                        fs.bus_factor,
                        fs.percentile("bus_factor"),
                        format!("Bus factor = {:.1} (single point of failure)", fs.bus_factor),
                    ),
                    Evidence::new(
                        "pagerank",
                        fs.pagerank,
                        pr,
                        format!("Top {:.0}% by centrality", (1.0 - pr) * 100.0),
                    ),
                    Evidence::new(
                        "author_entropy",
                        fs.author_entropy,
                        0.0,
                        format!("Author entropy = {:.2}", fs.author_entropy),
                    ),
                ],
                suggestion: "Pair-program or rotate ownership. Single point of knowledge failure."
                    .to_string(),
                confidence: confidence_from_margins(&[
                    (pr, Self::PAGERANK_PCTL, Polarity::HighIsBad),
                    (fs.bus_factor, Self::BUS_FACTOR, Polarity::HighIsGood),
                ]),
                effort: Effort::Low,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}
