// Comparing two snapshots

use super::*;
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

use crate::insights::Finding;

/// Movements smaller than this are noise from float formatting
const SIGNAL_EPSILON: f64 = 1e-9;

impl HistoryDatabase {
    pub fn diff(&self, old_id: i64, new_id: i64) -> Result<SnapshotDiff> {
        let old = self.load_snapshot(old_id)?;
        let new = self.load_snapshot(new_id)?;
        Ok(diff_snapshots(&old, &new))
    }
}

fn keyed(findings: &[Finding]) -> BTreeMap<String, &Finding> {
    findings.iter().map(|f| (f.identity_key(), f)).collect()
}

fn delta_of(key: &str, finding: &Finding, old: Option<f64>, new: Option<f64>) -> FindingDelta {
    FindingDelta {
        identity_key: key.to_string(),
        finding_type: finding.finding_type.clone(),
        title: finding.title.clone(),
        files: finding.files.clone(),
        old_severity: old,
        new_severity: new,
    }
}

fn signal_deltas(old: &SignalMap, new: &SignalMap) -> Vec<SignalDelta> {
    new.iter()
        .filter_map(|(name, &new_value)| {
            let old_value = *old.get(name)?;
            ((new_value - old_value).abs() > SIGNAL_EPSILON).then(|| SignalDelta {
                signal: name.clone(),
                old_value,
                new_value,
            })
        })
        .collect()
}

/// Findings are matched by identity key; files by path (renames show up as
/// one removed and one added file).
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> SnapshotDiff {
    let old_findings = keyed(&old.findings);
    let new_findings = keyed(&new.findings);

    let mut new_list = Vec::new();
    let mut persisting = Vec::new();
    for (key, finding) in &new_findings {
        match old_findings.get(key) {
            Some(previous) => persisting.push(delta_of(
                key,
                finding,
                Some(previous.severity),
                Some(finding.severity),
            )),
            None => new_list.push(delta_of(key, finding, None, Some(finding.severity))),
        }
    }
    let resolved: Vec<FindingDelta> = old_findings
        .iter()
        .filter(|(key, _)| !new_findings.contains_key(*key))
        .map(|(key, finding)| delta_of(key, finding, Some(finding.severity), None))
        .collect();

    let by_new_severity = |a: &FindingDelta, b: &FindingDelta| {
        b.new_severity
            .unwrap_or(0.0)
            .total_cmp(&a.new_severity.unwrap_or(0.0))
            .then_with(|| a.title.cmp(&b.title))
    };
    new_list.sort_by(by_new_severity);
    persisting.sort_by(|a, b| {
        b.severity_delta()
            .abs()
            .total_cmp(&a.severity_delta().abs())
            .then_with(|| a.title.cmp(&b.title))
    });

    let old_files: BTreeSet<&String> = old.file_signals.keys().collect();
    let new_files: BTreeSet<&String> = new.file_signals.keys().collect();

    let file_deltas = new
        .file_signals
        .iter()
        .filter_map(|(path, signals)| {
            let previous = old.file_signals.get(path)?;
            let moved = signal_deltas(previous, signals);
            (!moved.is_empty()).then(|| FileDelta {
                path: path.clone(),
                signals: moved,
            })
        })
        .collect();

    SnapshotDiff {
        old_id: old.meta.id,
        new_id: new.meta.id,
        new_findings: new_list,
        resolved_findings: resolved,
        persisting_findings: persisting,
        file_deltas,
        added_files: new_files.difference(&old_files).map(|s| s.to_string()).collect(),
        removed_files: old_files.difference(&new_files).map(|s| s.to_string()).collect(),
        codebase_deltas: signal_deltas(&old.codebase_signals, &new.codebase_signals),
    }
}
