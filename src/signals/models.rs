//! Fused signal model: per file, per directory, per module, global

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::semantics::Role;
use crate::temporal::Trajectory;

/// How much statistics the codebase size supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalizationTier {
    /// Fewer than 15 files: absolute thresholds only
    Absolute,
    /// 15 to 50 files
    Bayesian,
    Full,
}

impl NormalizationTier {
    pub fn from_file_count(count: usize) -> Self {
        if count < 15 {
            NormalizationTier::Absolute
        } else if count <= 50 {
            NormalizationTier::Bayesian
        } else {
            NormalizationTier::Full
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizationTier::Absolute => "ABSOLUTE",
            NormalizationTier::Bayesian => "BAYESIAN",
            NormalizationTier::Full => "FULL",
        }
    }
}

impl fmt::Display for NormalizationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSignals {
    pub path: String,

    // Location
    pub parent_dir: String,
    pub module_path: String,
    pub dir_depth: usize,
    pub siblings_count: usize,

    // Syntax
    pub lines: usize,
    pub function_count: usize,
    pub class_count: usize,
    pub max_nesting: usize,
    pub impl_gini: f64,
    pub stub_ratio: f64,
    pub import_count: usize,

    // Semantics
    pub role: Role,
    pub concept_count: usize,
    pub concept_entropy: f64,
    pub naming_drift: f64,
    pub todo_density: f64,
    pub docstring_coverage: Option<f64>,

    // Graph
    pub pagerank: f64,
    pub betweenness: f64,
    pub in_degree: usize,
    pub out_degree: usize,
    pub blast_radius_size: usize,
    /// -1 when unreachable from any entry point
    pub depth: i64,
    pub is_orphan: bool,
    pub phantom_import_count: usize,
    pub community: Option<usize>,
    pub compression_ratio: f64,
    pub semantic_coherence: f64,
    pub cognitive_load: f64,

    // Temporal
    pub total_changes: usize,
    pub churn_trajectory: Trajectory,
    pub churn_slope: f64,
    pub churn_cv: f64,
    pub bus_factor: f64,
    pub author_entropy: f64,
    pub fix_ratio: f64,
    pub refactor_ratio: f64,
    pub change_entropy: f64,

    // Composites
    /// Max-normalized risk, computed before percentiles
    pub raw_risk: f64,
    pub risk_score: f64,
    pub wiring_quality: f64,
    pub file_health_score: f64,

    pub percentiles: BTreeMap<String, f64>,
}

impl FileSignals {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parent_dir: String::new(),
            module_path: String::new(),
            dir_depth: 0,
            siblings_count: 0,
            lines: 0,
            function_count: 0,
            class_count: 0,
            max_nesting: 0,
            impl_gini: 0.0,
            stub_ratio: 0.0,
            import_count: 0,
            role: Role::Unknown,
            concept_count: 1,
            concept_entropy: 0.0,
            naming_drift: 0.0,
            todo_density: 0.0,
            docstring_coverage: None,
            pagerank: 0.0,
            betweenness: 0.0,
            in_degree: 0,
            out_degree: 0,
            blast_radius_size: 0,
            depth: -1,
            is_orphan: false,
            phantom_import_count: 0,
            community: None,
            compression_ratio: 0.0,
            semantic_coherence: 0.0,
            cognitive_load: 0.0,
            total_changes: 0,
            churn_trajectory: Trajectory::Dormant,
            churn_slope: 0.0,
            churn_cv: 0.0,
            bus_factor: 1.0,
            author_entropy: 0.0,
            fix_ratio: 0.0,
            refactor_ratio: 0.0,
            change_entropy: 0.0,
            raw_risk: 0.0,
            risk_score: 0.0,
            wiring_quality: 1.0,
            file_health_score: 1.0,
            percentiles: BTreeMap::new(),
        }
    }

    /// Every numeric signal by name, as stored in snapshots
    pub fn numeric_signals(&self) -> Vec<(&'static str, f64)> {
        let mut signals = vec![
            ("lines", self.lines as f64),
            ("function_count", self.function_count as f64),
            ("class_count", self.class_count as f64),
            ("max_nesting", self.max_nesting as f64),
            ("impl_gini", self.impl_gini),
            ("stub_ratio", self.stub_ratio),
            ("import_count", self.import_count as f64),
            ("concept_count", self.concept_count as f64),
            ("concept_entropy", self.concept_entropy),
            ("naming_drift", self.naming_drift),
            ("todo_density", self.todo_density),
            ("pagerank", self.pagerank),
            ("betweenness", self.betweenness),
            ("in_degree", self.in_degree as f64),
            ("out_degree", self.out_degree as f64),
            ("blast_radius_size", self.blast_radius_size as f64),
            ("depth", self.depth as f64),
            ("is_orphan", if self.is_orphan { 1.0 } else { 0.0 }),
            ("phantom_import_count", self.phantom_import_count as f64),
            ("compression_ratio", self.compression_ratio),
            ("semantic_coherence", self.semantic_coherence),
            ("cognitive_load", self.cognitive_load),
            ("total_changes", self.total_changes as f64),
            ("churn_slope", self.churn_slope),
            ("churn_cv", self.churn_cv),
            ("bus_factor", self.bus_factor),
            ("author_entropy", self.author_entropy),
            ("fix_ratio", self.fix_ratio),
            ("refactor_ratio", self.refactor_ratio),
            ("change_entropy", self.change_entropy),
            ("raw_risk", self.raw_risk),
            ("risk_score", self.risk_score),
            ("wiring_quality", self.wiring_quality),
            ("file_health_score", self.file_health_score),
        ];
        if let Some(coverage) = self.docstring_coverage {
            signals.push(("docstring_coverage", coverage));
        }
        if let Some(community) = self.community {
            signals.push(("community", community as f64));
        }
        signals
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.numeric_signals()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn percentile(&self, name: &str) -> f64 {
        self.percentiles.get(name).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSignals {
    pub path: String,
    pub cohesion: f64,
    pub coupling: f64,
    pub instability: Option<f64>,
    pub abstractness: f64,
    pub main_seq_distance: f64,
    pub boundary_alignment: f64,
    pub layer_violation_count: usize,
    pub role_consistency: f64,
    /// Commits per week touching the module
    pub velocity: f64,
    /// Distinct authors / commits touching the module
    pub coordination_cost: f64,
    /// Gini of per-author commit counts
    pub knowledge_gini: f64,
    pub module_bus_factor: f64,
    pub mean_cognitive_load: f64,
    pub file_count: usize,
    pub health_score: f64,
}

impl ModuleSignals {
    pub fn numeric_signals(&self) -> Vec<(&'static str, f64)> {
        let mut signals = vec![
            ("cohesion", self.cohesion),
            ("coupling", self.coupling),
            ("abstractness", self.abstractness),
            ("main_seq_distance", self.main_seq_distance),
            ("boundary_alignment", self.boundary_alignment),
            ("layer_violation_count", self.layer_violation_count as f64),
            ("role_consistency", self.role_consistency),
            ("velocity", self.velocity),
            ("coordination_cost", self.coordination_cost),
            ("knowledge_gini", self.knowledge_gini),
            ("module_bus_factor", self.module_bus_factor),
            ("mean_cognitive_load", self.mean_cognitive_load),
            ("file_count", self.file_count as f64),
            ("health_score", self.health_score),
        ];
        if let Some(instability) = self.instability {
            signals.push(("instability", instability));
        }
        signals
    }
}

/// Aggregates over the files of one directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorySignals {
    pub path: String,
    pub file_count: usize,
    pub total_lines: usize,
    pub total_functions: usize,
    pub avg_complexity: f64,
    pub avg_churn: f64,
    pub avg_risk: f64,
    pub dominant_role: String,
    pub dominant_trajectory: String,
    /// Files changed more than the codebase median
    pub hotspot_file_count: usize,
    pub high_risk_file_count: usize,
    pub module_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSignals {
    pub modularity: f64,
    pub cycle_count: usize,
    pub centrality_gini: f64,
    pub orphan_ratio: f64,
    pub phantom_ratio: f64,
    pub glue_deficit: f64,
    pub clone_ratio: f64,
    pub violation_rate: f64,
    pub conway_alignment: f64,
    pub team_size: usize,
    pub wiring_score: f64,
    pub architecture_health: f64,
    pub team_risk: f64,
    pub codebase_health: f64,
}

impl Default for GlobalSignals {
    fn default() -> Self {
        Self {
            modularity: 0.0,
            cycle_count: 0,
            centrality_gini: 0.0,
            orphan_ratio: 0.0,
            phantom_ratio: 0.0,
            glue_deficit: 0.0,
            clone_ratio: 0.0,
            violation_rate: 0.0,
            conway_alignment: 1.0,
            team_size: 1,
            wiring_score: 0.0,
            architecture_health: 0.0,
            team_risk: 0.0,
            codebase_health: 0.0,
        }
    }
}

impl GlobalSignals {
    pub fn numeric_signals(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("modularity", self.modularity),
            ("cycle_count", self.cycle_count as f64),
            ("centrality_gini", self.centrality_gini),
            ("orphan_ratio", self.orphan_ratio),
            ("phantom_ratio", self.phantom_ratio),
            ("glue_deficit", self.glue_deficit),
            ("clone_ratio", self.clone_ratio),
            ("violation_rate", self.violation_rate),
            ("conway_alignment", self.conway_alignment),
            ("team_size", self.team_size as f64),
            ("wiring_score", self.wiring_score),
            ("architecture_health", self.architecture_health),
            ("team_risk", self.team_risk),
            ("codebase_health", self.codebase_health),
        ]
    }
}

/// Every signal of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalField {
    pub tier: NormalizationTier,
    pub per_file: BTreeMap<String, FileSignals>,
    pub per_directory: BTreeMap<String, DirectorySignals>,
    pub per_module: BTreeMap<String, ModuleSignals>,
    pub global: GlobalSignals,
    /// raw_risk minus the mean raw_risk of graph neighbours
    pub delta_h: BTreeMap<String, f64>,
}

impl SignalField {
    pub fn new(tier: NormalizationTier) -> Self {
        Self {
            tier,
            per_file: BTreeMap::new(),
            per_directory: BTreeMap::new(),
            per_module: BTreeMap::new(),
            global: GlobalSignals::default(),
            delta_h: BTreeMap::new(),
        }
    }

    pub fn file(&self, path: &str) -> Option<&FileSignals> {
        self.per_file.get(path)
    }

    /// Highest risk first
    pub fn top_files_by_risk(&self, n: usize) -> Vec<(&str, f64)> {
        let mut files: Vec<(&str, f64)> = self
            .per_file
            .values()
            .map(|f| (f.path.as_str(), f.risk_score))
            .collect();
        files.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        files.truncate(n);
        files
    }

    /// Lower median of non-zero change counts over non-test files
    pub fn hotspot_median(&self) -> usize {
        let mut changes: Vec<usize> = self
            .per_file
            .values()
            .filter(|f| f.role != Role::Test && f.total_changes > 0)
            .map(|f| f.total_changes)
            .collect();
        if changes.is_empty() {
            return 0;
        }
        changes.sort_unstable();
        changes[(changes.len() - 1) / 2]
    }
}
