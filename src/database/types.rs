// Snapshot and diff type definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::insights::Finding;

/// Signal name -> value
pub type SignalMap = BTreeMap<String, f64>;

/// One row of the snapshots table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Zero until the snapshot has been saved
    pub id: i64,
    pub schema_version: i32,
    pub tool_version: String,
    pub commit_sha: Option<String>,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub analyzed_path: String,
    pub file_count: usize,
    pub module_count: usize,
    pub commits_analyzed: usize,
    pub analyzers_ran: Vec<String>,
    pub config_hash: String,
}

/// Everything one analysis run persists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    pub file_signals: BTreeMap<String, SignalMap>,
    pub module_signals: BTreeMap<String, SignalMap>,
    pub codebase_signals: SignalMap,
    pub findings: Vec<Finding>,
    pub dependency_edges: Vec<(String, String)>,
}

/// A finding of the latest snapshot and how long it has been reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentFinding {
    pub identity_key: String,
    pub finding_type: String,
    pub title: String,
    pub files: Vec<String>,
    /// Consecutive snapshots, ending at the latest, that contain it
    pub consecutive_runs: usize,
}

/// A finding matched across two snapshots by identity key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingDelta {
    pub identity_key: String,
    pub finding_type: String,
    pub title: String,
    pub files: Vec<String>,
    pub old_severity: Option<f64>,
    pub new_severity: Option<f64>,
}

impl FindingDelta {
    pub fn severity_delta(&self) -> f64 {
        self.new_severity.unwrap_or(0.0) - self.old_severity.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDelta {
    pub signal: String,
    pub old_value: f64,
    pub new_value: f64,
}

impl SignalDelta {
    pub fn delta(&self) -> f64 {
        self.new_value - self.old_value
    }
}

/// Signals that moved for a file present in both snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDelta {
    pub path: String,
    pub signals: Vec<SignalDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub old_id: i64,
    pub new_id: i64,
    pub new_findings: Vec<FindingDelta>,
    pub resolved_findings: Vec<FindingDelta>,
    pub persisting_findings: Vec<FindingDelta>,
    pub file_deltas: Vec<FileDelta>,
    pub added_files: Vec<String>,
    pub removed_files: Vec<String>,
    pub codebase_deltas: Vec<SignalDelta>,
}

/// One point of a signal's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub snapshot_id: i64,
    pub timestamp: String,
    pub value: f64,
}
