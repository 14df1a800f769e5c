/// Text rendering of analysis results and history
///
/// Every report has a serializable payload (used as-is for `--format json`)
/// and a `render_*` function producing the text form.
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::analysis::InsightResult;
use crate::database::{SeriesPoint, SnapshotDiff, SnapshotMeta};
use crate::insights::Finding;
use crate::signals::{DirectorySignals, FileSignals, GlobalSignals, ModuleSignals};

/// Evidence lines shown per finding in the text report
const SHOWN_EVIDENCE: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileExplanation {
    pub path: String,
    pub signals: FileSignals,
    pub findings: Vec<Finding>,
    pub outlier_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub tier: String,
    pub global: GlobalSignals,
    /// Least healthy first
    pub modules: Vec<ModuleSignals>,
    /// Highest average risk first
    pub directories: Vec<DirectorySignals>,
    pub riskiest_files: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendReport {
    pub signal: String,
    pub file: Option<String>,
    pub points: Vec<SeriesPoint>,
}

fn type_label(finding_type: &str) -> String {
    finding_type.replace('_', " ").to_uppercase()
}

fn write_finding(out: &mut String, index: usize, finding: &Finding) {
    let _ = writeln!(
        out,
        "{:>3}. [{:.2}] {}  {}",
        index + 1,
        finding.severity,
        type_label(&finding.finding_type),
        finding.title
    );
    for evidence in finding.evidence.iter().take(SHOWN_EVIDENCE) {
        let _ = writeln!(out, "       - {}", evidence.description);
    }
    for line in finding.suggestion.lines() {
        let _ = writeln!(out, "       → {}", line);
    }
    let _ = writeln!(
        out,
        "       effort {} · confidence {:.0}%",
        finding.effort.as_str(),
        finding.confidence * 100.0
    );
}

pub fn render_findings(result: &InsightResult) -> String {
    let summary = &result.store_summary;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Shannon Insight · {} files · {} modules · {} commits · tier {}",
        summary.total_files,
        summary.total_modules,
        summary.commits_analyzed,
        summary.tier
    );
    if !summary.git_available {
        let _ = writeln!(out, "(no git history: temporal findings skipped)");
    }
    let _ = writeln!(
        out,
        "Codebase health {:.2} · architecture {:.2} · wiring {:.2}",
        result.global_signals.codebase_health,
        result.global_signals.architecture_health,
        result.global_signals.wiring_score
    );
    let _ = writeln!(out);

    if result.findings.is_empty() {
        let _ = writeln!(out, "No findings. Nothing stands out.");
        return out;
    }
    let _ = writeln!(out, "{} findings:", result.findings.len());
    for (i, finding) in result.findings.iter().enumerate() {
        write_finding(&mut out, i, finding);
    }
    out
}

pub fn render_explanation(explanation: &FileExplanation) -> String {
    let fs = &explanation.signals;
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", explanation.path, fs.role);
    let _ = writeln!(
        out,
        "  {} lines · {} functions · {} classes · nesting {}",
        fs.lines, fs.function_count, fs.class_count, fs.max_nesting
    );

    let _ = writeln!(out, "\nSignals:");
    for (name, value) in fs.numeric_signals() {
        match fs.percentiles.get(name) {
            Some(pctl) => {
                let _ = writeln!(out, "  {:<22} {:>10.3}  (p{:.0})", name, value, pctl * 100.0);
            }
            None => {
                let _ = writeln!(out, "  {:<22} {:>10.3}", name, value);
            }
        }
    }
    let _ = writeln!(out, "  {:<22} {:>10}", "churn_trajectory", fs.churn_trajectory.as_str());

    if !explanation.outlier_reasons.is_empty() {
        let _ = writeln!(out, "\nOutlier: {}", explanation.outlier_reasons.join(", "));
    }

    if explanation.findings.is_empty() {
        let _ = writeln!(out, "\nNo findings involve this file.");
    } else {
        let _ = writeln!(out, "\nFindings:");
        for (i, finding) in explanation.findings.iter().enumerate() {
            write_finding(&mut out, i, finding);
        }
    }
    out
}

pub fn render_health(report: &HealthReport) -> String {
    let g = &report.global;
    let mut out = String::new();
    let _ = writeln!(out, "Codebase health: {:.2} (tier {})", g.codebase_health, report.tier);
    for (label, value) in [
        ("architecture", g.architecture_health),
        ("wiring", g.wiring_score),
        ("team risk", g.team_risk),
        ("modularity", g.modularity),
        ("cycles", g.cycle_count as f64),
        ("orphan ratio", g.orphan_ratio),
        ("phantom ratio", g.phantom_ratio),
        ("clone ratio", g.clone_ratio),
    ] {
        let _ = writeln!(out, "  {:<14} {:>8.2}", label, value);
    }

    if !report.modules.is_empty() {
        let _ = writeln!(out, "\nModules (least healthy first):");
        for module in &report.modules {
            let _ = writeln!(
                out,
                "  {:<32} health {:.2} · cohesion {:.2} · coupling {:.2} · {} files",
                module.path, module.health_score, module.cohesion, module.coupling, module.file_count
            );
            if module.velocity > 0.0 {
                let _ = writeln!(
                    out,
                    "  {:<32} {:.1} commits/week · knowledge gini {:.2}",
                    "", module.velocity, module.knowledge_gini
                );
            }
        }
    }
    if !report.directories.is_empty() {
        let _ = writeln!(out, "\nDirectories (riskiest first):");
        for dir in &report.directories {
            let _ = writeln!(
                out,
                "  {:<32} risk {:.2} · {} hotspots · {} files · mostly {}",
                dir.path, dir.avg_risk, dir.hotspot_file_count, dir.file_count, dir.dominant_role
            );
        }
    }
    if !report.riskiest_files.is_empty() {
        let _ = writeln!(out, "\nRiskiest files:");
        for (path, risk) in &report.riskiest_files {
            let _ = writeln!(out, "  {:.2}  {}", risk, path);
        }
    }
    out
}

pub fn render_history(snapshots: &[SnapshotMeta]) -> String {
    if snapshots.is_empty() {
        return "No snapshots yet. Run `shannon-insight analyze` to record one.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:>5}  {:<25}  {:<8}  {:>6}  {:>7}", "id", "timestamp", "commit", "files", "commits");
    for meta in snapshots {
        let commit = meta
            .commit_sha
            .as_deref()
            .map(|sha| &sha[..sha.len().min(8)])
            .unwrap_or("-");
        let _ = writeln!(
            out,
            "{:>5}  {:<25}  {:<8}  {:>6}  {:>7}",
            meta.id, meta.timestamp, commit, meta.file_count, meta.commits_analyzed
        );
    }
    out
}

pub fn render_diff(diff: &SnapshotDiff) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Snapshot #{} → #{}", diff.old_id, diff.new_id);
    let _ = writeln!(
        out,
        "  {} new · {} resolved · {} persisting findings",
        diff.new_findings.len(),
        diff.resolved_findings.len(),
        diff.persisting_findings.len()
    );

    for (heading, deltas) in [("New", &diff.new_findings), ("Resolved", &diff.resolved_findings)] {
        if deltas.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{heading}:");
        for delta in deltas {
            let severity = delta.new_severity.or(delta.old_severity).unwrap_or(0.0);
            let _ = writeln!(out, "  [{:.2}] {}", severity, delta.title);
        }
    }
    let moved: Vec<_> = diff
        .persisting_findings
        .iter()
        .filter(|d| d.severity_delta().abs() > 1e-6)
        .collect();
    if !moved.is_empty() {
        let _ = writeln!(out, "\nChanged severity:");
        for delta in moved {
            let _ = writeln!(out, "  {:+.2} {}", delta.severity_delta(), delta.title);
        }
    }

    if !diff.codebase_deltas.is_empty() {
        let _ = writeln!(out, "\nCodebase signals:");
        for d in &diff.codebase_deltas {
            let _ = writeln!(
                out,
                "  {:<22} {:>8.3} → {:>8.3} ({:+.3})",
                d.signal, d.old_value, d.new_value, d.delta()
            );
        }
    }
    if !diff.added_files.is_empty() || !diff.removed_files.is_empty() {
        let _ = writeln!(
            out,
            "\nFiles: +{} / -{} · {} changed",
            diff.added_files.len(),
            diff.removed_files.len(),
            diff.file_deltas.len()
        );
    }
    out
}

/// Direction of the last move, as an arrow
fn direction(points: &[SeriesPoint]) -> &'static str {
    match points {
        [.., a, b] if b.value > a.value => "↑",
        [.., a, b] if b.value < a.value => "↓",
        _ => "→",
    }
}

pub fn render_trend(report: &TrendReport) -> String {
    let subject = report.file.as_deref().unwrap_or("codebase");
    if report.points.is_empty() {
        return format!("No history for {} on {}.\n", report.signal, subject);
    }
    let mut out = String::new();
    let _ = writeln!(out, "{} · {} {}", report.signal, subject, direction(&report.points));
    for point in &report.points {
        let _ = writeln!(out, "  #{:<5} {:<25} {:>10.4}", point.snapshot_id, point.timestamp, point.value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: i64, value: f64) -> SeriesPoint {
        SeriesPoint {
            snapshot_id: id,
            timestamp: format!("2026-01-0{id}T00:00:00+00:00"),
            value,
        }
    }

    #[test]
    fn test_trend_arrow_follows_last_move() {
        let report = TrendReport {
            signal: "codebase_health".into(),
            file: None,
            points: vec![point(1, 0.5), point(2, 0.7), point(3, 0.6)],
        };
        let text = render_trend(&report);
        assert!(text.starts_with("codebase_health · codebase ↓"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_empty_history_hint() {
        assert!(render_history(&[]).contains("shannon-insight analyze"));
    }

    #[test]
    fn test_health_lists_directories_and_module_activity() {
        let report = HealthReport {
            tier: "BAYESIAN".into(),
            global: GlobalSignals::default(),
            modules: vec![ModuleSignals {
                path: "billing".into(),
                velocity: 2.5,
                knowledge_gini: 0.4,
                file_count: 3,
                ..ModuleSignals::default()
            }],
            directories: vec![DirectorySignals {
                path: "billing/core".into(),
                file_count: 3,
                avg_risk: 0.42,
                hotspot_file_count: 2,
                dominant_role: "SERVICE".into(),
                ..DirectorySignals::default()
            }],
            riskiest_files: Vec::new(),
        };
        let text = render_health(&report);
        assert!(text.contains("2.5 commits/week · knowledge gini 0.40"), "{text}");
        assert!(text.contains("Directories (riskiest first):"));
        assert!(text.contains("risk 0.42 · 2 hotspots · 3 files · mostly SERVICE"));
    }
}
