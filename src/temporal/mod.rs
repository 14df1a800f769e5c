//! Git history analysis
//!
//! Modules:
//! - git: runs `git log` and parses commits
//! - churn: per-file change series and trajectories
//! - cochange: files that change together
//! - authors: author overlap between modules
//! - models: history data structures

pub mod authors;
pub mod churn;
pub mod cochange;
pub mod git;
pub mod models;

pub use authors::{module_author_distances, AuthorDistances};
pub use churn::build_churn_series;
pub use cochange::build_cochange_matrix;
pub use git::GitExtractor;
pub use models::{ChurnSeries, CoChangeMatrix, CoChangePair, Commit, GitHistory, Trajectory};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{info, warn};

use crate::config::AnalysisConfig;

/// Everything derived from version control
#[derive(Debug, Clone, Default)]
pub struct TemporalAnalysis {
    pub history: GitHistory,
    /// Empty when the history is shorter than `git_min_commits`
    pub churn: BTreeMap<String, ChurnSeries>,
    pub cochange: CoChangeMatrix,
}

impl TemporalAnalysis {
    /// Enough commits for per-file temporal signals
    pub fn has_churn(&self) -> bool {
        !self.churn.is_empty()
    }
}

/// History-derived data for `analyzed` files, or `None` outside a git repo
pub fn analyze_history(
    root: &Path,
    config: &AnalysisConfig,
    analyzed: &BTreeSet<String>,
) -> Option<TemporalAnalysis> {
    let extractor = GitExtractor::new(root, config.git_max_commits);
    if !extractor.is_git_repo() {
        info!("Not a git repository, skipping temporal analysis");
        return None;
    }

    let history = match extractor.extract() {
        Ok(Some(history)) => history,
        Ok(None) => return None,
        Err(e) => {
            warn!("Git history unavailable: {}", e);
            return None;
        }
    };

    let enough = history.total_commits() >= config.git_min_commits;
    if !enough {
        info!(
            "Only {} commits (need {}), skipping churn signals",
            history.total_commits(),
            config.git_min_commits
        );
    }
    let churn = if enough {
        build_churn_series(&history, analyzed)
    } else {
        BTreeMap::new()
    };
    let cochange = if enough {
        build_cochange_matrix(&history, analyzed)
    } else {
        CoChangeMatrix::default()
    };

    Some(TemporalAnalysis {
        history,
        churn,
        cochange,
    })
}
