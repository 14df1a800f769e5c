//! Blackboard shared by the analysis stages, fusion and the finders

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::database::PersistentFinding;
use crate::graph::{Architecture, ClonePair, DependencyGraph, GraphAnalysis};
use crate::scanning::FileSyntax;
use crate::semantics::{FileSemantics, Role};
use crate::signals::SignalField;
use crate::temporal::{AuthorDistances, TemporalAnalysis};

/// Inputs a finder may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    SignalField,
    Structural,
    Architecture,
    GitHistory,
    CoChange,
    ClonePairs,
    /// Module pair author distances, multi-author histories only
    AuthorDistances,
    /// Earlier recorded runs
    History,
}

/// Dependency graph with everything computed from it
#[derive(Debug, Clone, Default)]
pub struct StructuralAnalysis {
    pub graph: DependencyGraph,
    pub analysis: GraphAnalysis,
    pub architecture: Architecture,
}

/// What earlier recorded runs say about this codebase
#[derive(Debug, Clone, Default)]
pub struct HistoryContext {
    pub persistent: Vec<PersistentFinding>,
    /// `violation_rate` of each recorded run, oldest first
    pub violation_rates: Vec<f64>,
}

/// Counts shown alongside the findings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub total_files: usize,
    pub total_modules: usize,
    pub commits_analyzed: usize,
    pub git_available: bool,
    pub tier: String,
    pub signals_available: Vec<String>,
}

#[derive(Debug, Default)]
pub struct AnalysisStore {
    pub root: PathBuf,
    pub files: Vec<FileSyntax>,
    pub roles: HashMap<String, Role>,
    pub semantics: BTreeMap<String, FileSemantics>,
    /// zlib compression ratio per file
    pub compression: BTreeMap<String, f64>,
    pub structural: Option<StructuralAnalysis>,
    pub temporal: Option<TemporalAnalysis>,
    pub clone_pairs: Option<Vec<ClonePair>>,
    pub author_distances: Option<AuthorDistances>,
    pub history: Option<HistoryContext>,
    pub signal_field: Option<SignalField>,
    /// Reasons each file is a statistical outlier
    pub outliers: BTreeMap<String, Vec<String>>,
}

impl AnalysisStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn has(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::SignalField => self.signal_field.is_some(),
            Requirement::Structural => self.structural.is_some(),
            Requirement::Architecture => self
                .structural
                .as_ref()
                .is_some_and(|s| !s.architecture.modules.is_empty()),
            Requirement::GitHistory => self
                .temporal
                .as_ref()
                .is_some_and(|t| t.history.total_commits() > 0),
            Requirement::CoChange => self.temporal.as_ref().is_some_and(|t| t.has_churn()),
            Requirement::ClonePairs => self.clone_pairs.is_some(),
            Requirement::AuthorDistances => {
                self.author_distances.as_ref().is_some_and(|d| !d.is_empty())
            }
            Requirement::History => self.history.is_some(),
        }
    }

    pub fn graph(&self) -> Option<&DependencyGraph> {
        self.structural.as_ref().map(|s| &s.graph)
    }

    pub fn architecture(&self) -> Option<&Architecture> {
        self.structural.as_ref().map(|s| &s.architecture)
    }

    pub fn summary(&self) -> StoreSummary {
        let available = [
            (Requirement::Structural, "structural"),
            (Requirement::Architecture, "architecture"),
            (Requirement::GitHistory, "git_history"),
            (Requirement::CoChange, "cochange"),
            (Requirement::ClonePairs, "clone_pairs"),
            (Requirement::AuthorDistances, "author_distances"),
            (Requirement::History, "history"),
            (Requirement::SignalField, "signal_field"),
        ];
        StoreSummary {
            total_files: self.files.len(),
            total_modules: self.architecture().map(|a| a.modules.len()).unwrap_or(0),
            commits_analyzed: self
                .temporal
                .as_ref()
                .map(|t| t.history.total_commits())
                .unwrap_or(0),
            git_available: self.temporal.is_some(),
            tier: self
                .signal_field
                .as_ref()
                .map(|f| f.tier.to_string())
                .unwrap_or_default(),
            signals_available: available
                .iter()
                .filter(|(req, _)| self.has(*req))
                .map(|(_, name)| name.to_string())
                .collect(),
        }
    }
}
