//! Findings about earlier recorded runs

use super::by_severity;
use crate::insights::engine::Finder;
use crate::insights::models::{Effort, Evidence, Finding, Scope};
use crate::insights::store::{AnalysisStore, Requirement};

/// Finding reported in several consecutive runs without being fixed
pub struct ChronicProblemFinder;

impl ChronicProblemFinder {
    const MIN_RUNS: usize = 3;
    const MAX_SEVERITY: f64 = 0.75;
    /// Runs at which severity saturates
    const FULL_RUNS: f64 = 10.0;
}

impl Finder for ChronicProblemFinder {
    fn name(&self) -> &'static str {
        "chronic_problem"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::History]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(history) = &store.history else {
            return Vec::new();
        };
        let findings = history
            .persistent
            .iter()
            .filter(|p| p.consecutive_runs >= Self::MIN_RUNS && p.finding_type != self.name())
            .map(|p| {
                let count = p.consecutive_runs;
                Finding {
                    finding_type: self.name().to_string(),
                    severity: Self::MAX_SEVERITY * (count as f64 / Self::FULL_RUNS).min(1.0),
                    title: format!("{} (unresolved for {count} runs)", p.title),
                    files: p.files.clone(),
                    evidence: vec![Evidence::new(
                        "persistence",
                        count as f64,
                        0.0,
                        format!("{} reported in {count} consecutive runs", p.finding_type),
                    )],
                    suggestion: format!(
                        "This has been flagged {count} times. Consider prioritizing a fix or explicitly suppressing it."
                    ),
                    confidence: 0.9,
                    effort: Effort::Medium,
                    scope: if p.files.len() == 2 { Scope::FilePair } else { Scope::File },
                }
            })
            .collect();
        by_severity(findings)
    }
}

/// Layer violation rate climbing across recent runs
pub struct ArchitectureErosionFinder;

impl ArchitectureErosionFinder {
    const WINDOW: usize = 5;
    const MIN_POINTS: usize = 3;
    const MIN_INCREASES: usize = 2;
    const MIN_RISE: f64 = 0.05;

    fn urgency(rate: f64) -> &'static str {
        if rate > 0.2 {
            "critical"
        } else if rate > 0.1 {
            "high"
        } else {
            "medium"
        }
    }
}

impl Finder for ArchitectureErosionFinder {
    fn name(&self) -> &'static str {
        "architecture_erosion"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::History]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(history) = &store.history else {
            return Vec::new();
        };
        let rates = &history.violation_rates;
        let recent = &rates[rates.len().saturating_sub(Self::WINDOW)..];
        if recent.len() < Self::MIN_POINTS {
            return Vec::new();
        }
        let increases = recent.windows(2).filter(|w| w[1] > w[0]).count();
        let (first, last) = (recent[0], recent[recent.len() - 1]);
        let rise = last - first;
        if increases < Self::MIN_INCREASES || rise < Self::MIN_RISE {
            return Vec::new();
        }

        let n = recent.len();
        let per_run = rise / n as f64;
        vec![Finding {
            finding_type: self.name().to_string(),
            severity: (0.65 + per_run * 2.0).min(1.0),
            title: format!(
                "Architecture erosion: violation rate increased {:.1}% over {n} snapshots",
                rise * 100.0
            ),
            files: Vec::new(),
            evidence: vec![
                Evidence::new(
                    "violation_rate",
                    last,
                    0.0,
                    format!(
                        "{:.1}% of cross-module edges now violate layering ({} urgency)",
                        last * 100.0,
                        Self::urgency(last)
                    ),
                ),
                Evidence::new(
                    "violation_rate_rise",
                    rise,
                    0.0,
                    format!("up from {:.1}% with {increases} increases in {n} runs", first * 100.0),
                ),
            ],
            suggestion: "Layering is degrading run over run. Review recent cross-module imports and restore dependency direction before it hardens.".to_string(),
            confidence: (increases as f64 / n as f64).min(1.0),
            effort: Effort::High,
            scope: Scope::Codebase,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::PersistentFinding;
    use crate::insights::store::HistoryContext;

    fn persistent(finding_type: &str, runs: usize) -> PersistentFinding {
        PersistentFinding {
            identity_key: format!("{finding_type}-key"),
            finding_type: finding_type.to_string(),
            title: format!("{finding_type} in app/core.py"),
            files: vec!["app/core.py".to_string()],
            consecutive_runs: runs,
        }
    }

    fn store(history: HistoryContext) -> AnalysisStore {
        let mut store = AnalysisStore::new(".");
        store.history = Some(history);
        store
    }

    #[test]
    fn test_chronic_problem_after_three_runs() {
        let store = store(HistoryContext {
            persistent: vec![
                persistent("god_file", 4),
                persistent("orphan_code", 2),
                persistent("chronic_problem", 9),
                persistent("high_risk_hub", 12),
            ],
            ..HistoryContext::default()
        });
        let findings = ChronicProblemFinder.find(&store);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].title, "high_risk_hub in app/core.py (unresolved for 12 runs)");
        assert!((findings[0].severity - 0.75).abs() < 1e-9);
        assert!((findings[1].severity - 0.3).abs() < 1e-9);
        assert_eq!(findings[1].files, vec!["app/core.py"]);
    }

    fn erosion(rates: &[f64]) -> Vec<Finding> {
        ArchitectureErosionFinder.find(&store(HistoryContext {
            violation_rates: rates.to_vec(),
            ..HistoryContext::default()
        }))
    }

    #[test]
    fn test_erosion_over_the_last_five_runs() {
        // The first run falls outside the window
        let findings = erosion(&[0.5, 0.02, 0.04, 0.04, 0.08, 0.12]);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].title,
            "Architecture erosion: violation rate increased 10.0% over 5 snapshots"
        );
        assert!((findings[0].severity - 0.69).abs() < 1e-9);
        assert!((findings[0].confidence - 0.6).abs() < 1e-9);
        assert!(findings[0].evidence[0].description.contains("high urgency"));
    }

    #[test]
    fn test_no_erosion_when_flat_or_short() {
        assert!(erosion(&[0.02, 0.06]).is_empty());
        assert!(erosion(&[0.02, 0.03, 0.04]).is_empty());
        assert!(erosion(&[0.10, 0.02, 0.20]).is_empty());
    }
}
