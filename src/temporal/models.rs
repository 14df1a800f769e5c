//! Git history and the series derived from it

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    /// Unix seconds
    pub timestamp: i64,
    pub author: String,
    pub subject: String,
    /// Paths relative to the analyzed root
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHistory {
    /// Newest first
    pub commits: Vec<Commit>,
    pub file_set: BTreeSet<String>,
    pub span_days: i64,
}

impl GitHistory {
    pub fn total_commits(&self) -> usize {
        self.commits.len()
    }

    /// Distinct commit authors, at least 1
    pub fn team_size(&self) -> usize {
        let authors: BTreeSet<&str> = self.commits.iter().map(|c| c.author.as_str()).collect();
        authors.len().max(1)
    }
}

/// Shape of a file's change activity over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trajectory {
    Dormant,
    Stabilizing,
    Stable,
    Churning,
    Spiking,
}

impl Trajectory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trajectory::Dormant => "DORMANT",
            Trajectory::Stabilizing => "STABILIZING",
            Trajectory::Stable => "STABLE",
            Trajectory::Churning => "CHURNING",
            Trajectory::Spiking => "SPIKING",
        }
    }

    /// Erratic trajectories weigh more in risk scores
    pub fn is_volatile(&self) -> bool {
        matches!(self, Trajectory::Churning | Trajectory::Spiking)
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file change history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnSeries {
    pub path: String,
    pub window_counts: Vec<usize>,
    pub total_changes: usize,
    pub trajectory: Trajectory,
    pub slope: f64,
    /// Coefficient of variation of the window counts
    pub cv: f64,
    /// 2^H of the author distribution
    pub bus_factor: f64,
    pub author_entropy: f64,
    pub fix_ratio: f64,
    pub refactor_ratio: f64,
    pub change_entropy: f64,
}

/// Two files that tend to change in the same commits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoChangePair {
    pub file_a: String,
    pub file_b: String,
    pub cochange_count: usize,
    pub total_a: usize,
    pub total_b: usize,
    /// P(b changes | a changes)
    pub confidence_a_b: f64,
    pub confidence_b_a: f64,
    /// Observed / expected under independence
    pub lift: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoChangeMatrix {
    /// Keyed by `(a, b)` with `a < b`
    pub pairs: BTreeMap<(String, String), CoChangePair>,
    pub total_commits: usize,
    pub file_change_counts: BTreeMap<String, usize>,
}
