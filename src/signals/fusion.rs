//! Signal fusion as a typestate chain
//!
//! `collect -> raw_risk -> normalize -> module_temporal -> composites ->
//! laplacian -> build`. Each stage consumes the previous one, so raw risk
//! is always computed before percentiles exist and composites always see
//! module temporal signals.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use super::composites::{cognitive_load, compute_composites, compute_raw_risks};
use super::laplacian::health_laplacian;
use super::models::{
    DirectorySignals, FileSignals, GlobalSignals, ModuleSignals, NormalizationTier, SignalField,
};
use super::normalization::normalize;
use crate::graph::{clone_ratio, modules::file_modules, Architecture};
use crate::insights::AnalysisStore;
use crate::math::gini::gini_or_zero;
use crate::scanning::models::parent_dir;
use crate::semantics::Role;
use crate::temporal::AuthorDistances;

/// Files with a pagerank percentile above this count as critical
const CRITICAL_PAGERANK_PCTL: f64 = 0.75;
const HIGH_RISK: f64 = 0.7;

pub struct FusionPipeline<'a> {
    store: &'a AnalysisStore,
    field: SignalField,
}

pub struct Collected<'a> {
    store: &'a AnalysisStore,
    field: SignalField,
}

pub struct RawRisked<'a> {
    store: &'a AnalysisStore,
    field: SignalField,
}

pub struct Normalized<'a> {
    store: &'a AnalysisStore,
    field: SignalField,
}

pub struct ModuleTemporal<'a> {
    store: &'a AnalysisStore,
    field: SignalField,
}

pub struct Composited<'a> {
    store: &'a AnalysisStore,
    field: SignalField,
}

pub struct Fused {
    field: SignalField,
}

impl<'a> FusionPipeline<'a> {
    pub fn new(store: &'a AnalysisStore) -> Self {
        let tier = NormalizationTier::from_file_count(store.file_count());
        Self {
            store,
            field: SignalField::new(tier),
        }
    }

    /// Gather raw per-file, per-module and global signals from the store
    pub fn collect(mut self) -> Collected<'a> {
        let modules = file_modules(&self.store.files);
        let mut dir_sizes: HashMap<&str, usize> = HashMap::new();
        for syntax in &self.store.files {
            *dir_sizes.entry(syntax.parent_dir()).or_default() += 1;
        }

        for syntax in &self.store.files {
            let path = syntax.path.as_str();
            let mut file = FileSignals::new(path);

            file.parent_dir = syntax.parent_dir().to_string();
            file.module_path = modules
                .get(path)
                .cloned()
                .unwrap_or_else(|| file.parent_dir.clone());
            file.dir_depth = path.matches('/').count();
            file.siblings_count = dir_sizes[syntax.parent_dir()].saturating_sub(1);

            file.lines = syntax.lines;
            file.function_count = syntax.function_count();
            file.class_count = syntax.class_count();
            file.max_nesting = syntax.max_nesting();
            file.impl_gini = syntax.impl_gini();
            file.stub_ratio = syntax.stub_ratio();
            file.import_count = syntax.import_count();
            file.cognitive_load = cognitive_load(syntax);
            file.compression_ratio = self.store.compression.get(path).copied().unwrap_or(0.0);

            self.fill_semantics(&mut file);
            self.fill_graph(&mut file);
            self.fill_temporal(&mut file);
            self.field.per_file.insert(file.path.clone(), file);
        }

        self.collect_modules();
        self.field.global = self.collect_global();

        Collected {
            store: self.store,
            field: self.field,
        }
    }

    fn fill_semantics(&self, file: &mut FileSignals) {
        if let Some(role) = self.store.roles.get(&file.path) {
            file.role = *role;
        }
        let Some(semantics) = self.store.semantics.get(&file.path) else {
            return;
        };
        file.role = semantics.role;
        file.concept_count = semantics.concept_count();
        file.concept_entropy = semantics.concept_entropy;
        file.semantic_coherence = semantics.semantic_coherence();
        file.naming_drift = semantics.naming_drift;
        file.todo_density = semantics.todo_density;
        file.docstring_coverage = semantics.docstring_coverage;
    }

    fn fill_graph(&self, file: &mut FileSignals) {
        let Some(structural) = &self.store.structural else {
            return;
        };
        let analysis = &structural.analysis;
        let path = file.path.as_str();

        file.pagerank = analysis.pagerank.get(path).copied().unwrap_or(0.0);
        file.betweenness = analysis.betweenness.get(path).copied().unwrap_or(0.0);
        file.in_degree = analysis.in_degree.get(path).copied().unwrap_or(0);
        file.out_degree = analysis.out_degree.get(path).copied().unwrap_or(0);
        file.blast_radius_size = analysis.blast_radius_size(path);
        file.depth = analysis.depth.get(path).copied().unwrap_or(-1);
        // Unimported helper modules are usually loaded by convention
        file.is_orphan = analysis.is_orphan.get(path).copied().unwrap_or(false)
            && file.role != Role::Utility;
        file.community = analysis.node_community.get(path).copied();
        file.phantom_import_count = structural.graph.phantom_count(path);
    }

    fn fill_temporal(&self, file: &mut FileSignals) {
        let Some(series) = self
            .store
            .temporal
            .as_ref()
            .and_then(|t| t.churn.get(&file.path))
        else {
            return;
        };
        file.total_changes = series.total_changes;
        file.churn_trajectory = series.trajectory;
        file.churn_slope = series.slope;
        file.churn_cv = series.cv;
        file.bus_factor = series.bus_factor;
        file.author_entropy = series.author_entropy;
        file.fix_ratio = series.fix_ratio;
        file.refactor_ratio = series.refactor_ratio;
        file.change_entropy = series.change_entropy;
    }

    fn collect_modules(&mut self) {
        let store = self.store;
        let Some(architecture) = store.architecture() else {
            return;
        };
        for (path, module) in &architecture.modules {
            let loads: Vec<f64> = module
                .files
                .iter()
                .filter_map(|f| self.field.per_file.get(f))
                .map(|f| f.cognitive_load)
                .collect();
            let signals = ModuleSignals {
                path: path.clone(),
                cohesion: module.cohesion,
                coupling: module.coupling,
                instability: module.instability,
                abstractness: module.abstractness,
                main_seq_distance: module.main_seq_distance,
                boundary_alignment: module.boundary_alignment,
                role_consistency: module.role_consistency,
                layer_violation_count: architecture
                    .violations
                    .iter()
                    .filter(|v| &v.source_module == path)
                    .count(),
                mean_cognitive_load: crate::math::stats::mean(&loads),
                file_count: module.file_count(),
                module_bus_factor: 1.0,
                ..ModuleSignals::default()
            };
            self.field.per_module.insert(path.clone(), signals);
        }
    }

    fn collect_global(&self) -> GlobalSignals {
        let mut global = GlobalSignals::default();
        let files = &self.field.per_file;

        if let Some(structural) = &self.store.structural {
            global.modularity = structural.analysis.modularity;
            global.cycle_count = structural.analysis.cycles.len();
            global.centrality_gini = structural.analysis.centrality_gini;
            global.violation_rate = structural.architecture.violation_rate;
            if let Some(distances) = &self.store.author_distances {
                global.conway_alignment = conway_alignment(distances, &structural.architecture);
            }
        }

        if !files.is_empty() {
            let total = files.len() as f64;
            global.orphan_ratio = files.values().filter(|f| f.is_orphan).count() as f64 / total;
            global.phantom_ratio =
                files.values().filter(|f| f.phantom_import_count > 0).count() as f64 / total;
        }

        global.glue_deficit = glue_deficit(files, self.field.per_module.len());
        if let Some(pairs) = &self.store.clone_pairs {
            global.clone_ratio = clone_ratio(pairs, files.len());
        }
        if let Some(temporal) = &self.store.temporal {
            global.team_size = temporal.history.team_size();
        }
        global
    }
}

/// 1 - mean author distance over module pairs that import each other
fn conway_alignment(distances: &AuthorDistances, architecture: &Architecture) -> f64 {
    let coupled: Vec<f64> = architecture
        .coupled_pairs()
        .iter()
        .filter_map(|pair| distances.get(pair).copied())
        .collect();
    if coupled.is_empty() {
        return 1.0;
    }
    (1.0 - coupled.iter().sum::<f64>() / coupled.len() as f64).max(0.0)
}

/// Middle element of the sorted values (upper median for even lengths)
fn middle(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    values[values.len() / 2]
}

/// Shortfall of bridge files against `sqrt(modules)` expected ones.
///
/// A bridge file is above the median on both betweenness and out-degree.
pub fn glue_deficit(files: &BTreeMap<String, FileSignals>, module_count: usize) -> f64 {
    if files.is_empty() {
        return 0.0;
    }
    let median_betweenness = middle(files.values().map(|f| f.betweenness).collect());
    let median_out = middle(files.values().map(|f| f.out_degree as f64).collect());
    let glue = files
        .values()
        .filter(|f| f.betweenness > median_betweenness && f.out_degree as f64 > median_out)
        .count();
    let expected = (module_count.max(1) as f64).sqrt();
    (1.0 - glue as f64 / expected.max(1.0)).clamp(0.0, 1.0)
}

impl<'a> Collected<'a> {
    pub fn raw_risk(mut self) -> RawRisked<'a> {
        compute_raw_risks(&mut self.field);
        RawRisked {
            store: self.store,
            field: self.field,
        }
    }
}

impl<'a> RawRisked<'a> {
    pub fn normalize(mut self) -> Normalized<'a> {
        normalize(&mut self.field);
        Normalized {
            store: self.store,
            field: self.field,
        }
    }
}

impl<'a> Normalized<'a> {
    /// Module velocity, coordination cost, knowledge gini and bus factor.
    /// Reads pagerank percentiles, so it runs after normalization.
    pub fn module_temporal(mut self) -> ModuleTemporal<'a> {
        let history = self
            .store
            .temporal
            .as_ref()
            .map(|t| &t.history)
            .filter(|h| h.total_commits() > 0);

        let store = self.store;
        if let (Some(history), Some(architecture)) = (history, store.architecture()) {
            let weeks = (history.span_days as f64 / 7.0).max(1.0);
            for (path, module) in &architecture.modules {
                let Some(signals) = self.field.per_module.get_mut(path) else {
                    continue;
                };
                let members: BTreeSet<&str> = module.files.iter().map(String::as_str).collect();
                let mut author_commits: BTreeMap<&str, usize> = BTreeMap::new();
                let mut commits = 0usize;
                for commit in &history.commits {
                    if commit.files.iter().any(|f| members.contains(f.as_str())) {
                        commits += 1;
                        *author_commits.entry(commit.author.as_str()).or_default() += 1;
                    }
                }

                signals.velocity = commits as f64 / weeks;
                if commits > 0 {
                    signals.coordination_cost = author_commits.len() as f64 / commits as f64;
                }
                if author_commits.len() > 1 {
                    let counts: Vec<f64> = author_commits.values().map(|c| *c as f64).collect();
                    signals.knowledge_gini = gini_or_zero(&counts, false);
                }

                let member_files: Vec<&FileSignals> = module
                    .files
                    .iter()
                    .filter_map(|f| self.field.per_file.get(f))
                    .collect();
                let critical = member_files
                    .iter()
                    .filter(|f| f.percentile("pagerank") > CRITICAL_PAGERANK_PCTL)
                    .map(|f| f.bus_factor)
                    .reduce(f64::min);
                signals.module_bus_factor = match critical {
                    Some(min) => min,
                    None if !member_files.is_empty() => {
                        member_files.iter().map(|f| f.bus_factor).sum::<f64>()
                            / member_files.len() as f64
                    }
                    None => 1.0,
                };
            }
        }

        ModuleTemporal {
            store: self.store,
            field: self.field,
        }
    }
}

impl<'a> ModuleTemporal<'a> {
    pub fn composites(mut self) -> Composited<'a> {
        compute_composites(&mut self.field);
        Composited {
            store: self.store,
            field: self.field,
        }
    }
}

impl Composited<'_> {
    pub fn laplacian(mut self) -> Fused {
        if let Some(graph) = self.store.graph() {
            self.field.delta_h = health_laplacian(&self.field, graph);
        }
        Fused { field: self.field }
    }
}

impl Fused {
    /// Aggregate directories from the finished file signals
    pub fn build(mut self) -> SignalField {
        self.field.per_directory = collect_directories(&self.field.per_file);
        debug!(
            "Signal field: {} files, {} modules, {} directories, tier {}",
            self.field.per_file.len(),
            self.field.per_module.len(),
            self.field.per_directory.len(),
            self.field.tier
        );
        self.field
    }
}

fn most_common<'s>(values: impl Iterator<Item = &'s str>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    // Ties resolve to the alphabetically first value
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(v, _)| v.to_string())
        .unwrap_or_default()
}

fn collect_directories(files: &BTreeMap<String, FileSignals>) -> BTreeMap<String, DirectorySignals> {
    let median_changes = middle(files.values().map(|f| f.total_changes as f64).collect());

    let mut by_dir: BTreeMap<&str, Vec<&FileSignals>> = BTreeMap::new();
    for file in files.values() {
        by_dir.entry(parent_dir(&file.path)).or_default().push(file);
    }

    by_dir
        .into_iter()
        .map(|(dir, members)| {
            let n = members.len() as f64;
            let signals = DirectorySignals {
                path: dir.to_string(),
                file_count: members.len(),
                total_lines: members.iter().map(|f| f.lines).sum(),
                total_functions: members.iter().map(|f| f.function_count).sum(),
                avg_complexity: members.iter().map(|f| f.cognitive_load).sum::<f64>() / n,
                avg_churn: members.iter().map(|f| f.total_changes as f64).sum::<f64>() / n,
                avg_risk: members.iter().map(|f| f.risk_score).sum::<f64>() / n,
                dominant_role: most_common(members.iter().map(|f| f.role.as_str())),
                dominant_trajectory: most_common(
                    members.iter().map(|f| f.churn_trajectory.as_str()),
                ),
                hotspot_file_count: members
                    .iter()
                    .filter(|f| f.total_changes as f64 > median_changes)
                    .count(),
                high_risk_file_count: members.iter().filter(|f| f.risk_score > HIGH_RISK).count(),
                module_path: most_common(members.iter().map(|f| f.module_path.as_str())),
            };
            (dir.to_string(), signals)
        })
        .collect()
}

/// Run the whole fusion chain over a populated store
pub fn build_signal_field(store: &AnalysisStore) -> SignalField {
    FusionPipeline::new(store)
        .collect()
        .raw_risk()
        .normalize()
        .module_temporal()
        .composites()
        .laplacian()
        .build()
}
