//! Dependency graph and the structures derived from it

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::layers::ModuleGraph;

/// File-level import graph. `adjacency[a]` contains `b` when `a` imports `b`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: BTreeSet<String>,
    pub adjacency: BTreeMap<String, Vec<String>>,
    pub reverse: BTreeMap<String, Vec<String>>,
    pub edge_count: usize,
    /// Imports that look internal but match no scanned file
    pub unresolved_imports: BTreeMap<String, Vec<String>>,
    pub external_import_count: usize,
}

impl DependencyGraph {
    pub fn dependencies(&self, path: &str) -> &[String] {
        self.adjacency.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents(&self, path: &str) -> &[String] {
        self.reverse.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.dependencies(from).iter().any(|t| t == to)
    }

    /// Every `(source, target)` edge in sorted order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.adjacency
            .iter()
            .flat_map(|(src, targets)| targets.iter().map(move |t| (src.as_str(), t.as_str())))
    }

    pub fn phantom_count(&self, path: &str) -> usize {
        self.unresolved_imports.get(path).map(Vec::len).unwrap_or(0)
    }
}

/// A strongly connected component with more than one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleGroup {
    pub nodes: BTreeSet<String>,
    pub internal_edge_count: usize,
}

/// Files grouped by modularity optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: usize,
    pub members: BTreeSet<String>,
}

/// Results of the graph algorithms, keyed by file path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphAnalysis {
    pub pagerank: BTreeMap<String, f64>,
    pub betweenness: BTreeMap<String, f64>,
    pub in_degree: BTreeMap<String, usize>,
    pub out_degree: BTreeMap<String, usize>,
    /// Files transitively affected by a change to the key
    pub blast_radius: BTreeMap<String, BTreeSet<String>>,
    pub cycles: Vec<CycleGroup>,
    pub communities: Vec<Community>,
    pub node_community: BTreeMap<String, usize>,
    pub modularity: f64,
    /// Hops from the nearest entry point, -1 when unreachable
    pub depth: BTreeMap<String, i64>,
    pub is_orphan: BTreeMap<String, bool>,
    pub centrality_gini: f64,
}

impl GraphAnalysis {
    pub fn in_cycle(&self, path: &str) -> bool {
        self.cycles.iter().any(|c| c.nodes.contains(path))
    }

    pub fn blast_radius_size(&self, path: &str) -> usize {
        self.blast_radius.get(path).map(BTreeSet::len).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// A lower layer imports a higher one
    Backward,
    /// An import jumps over at least one intermediate layer
    Skip,
}

/// A module edge that breaks the inferred layering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerViolation {
    pub source_module: String,
    pub target_module: String,
    pub source_layer: usize,
    pub target_layer: usize,
    pub kind: ViolationKind,
    /// File-level edges behind the module edge
    pub edge_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub depth: usize,
    pub modules: Vec<String>,
    pub label: String,
}

/// Per-directory measurements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleAnalysis {
    pub path: String,
    pub files: Vec<String>,
    pub internal_edges: usize,
    pub external_edges_out: usize,
    pub external_edges_in: usize,
    pub cohesion: f64,
    pub coupling: f64,
    pub community_ids: BTreeSet<usize>,
    pub boundary_alignment: f64,
    /// Ca: edges from other modules into this one
    pub afferent_coupling: usize,
    /// Ce: edges from this module to other modules
    pub efferent_coupling: usize,
    /// Ce / (Ca + Ce); `None` for isolated modules
    pub instability: Option<f64>,
    pub abstractness: f64,
    pub main_seq_distance: f64,
    pub role_consistency: f64,
    pub dominant_role: String,
    pub layer: Option<usize>,
}

impl ModuleAnalysis {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Module whose files are spread over several communities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryMismatch {
    pub module_path: String,
    pub file_count: usize,
    pub alignment: f64,
    pub community_distribution: BTreeMap<usize, usize>,
    /// `(file, suggested module)`
    pub misplaced_files: Vec<(String, String)>,
}

/// Two files whose normalized compression distance marks them as copies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClonePair {
    pub file_a: String,
    pub file_b: String,
    pub ncd: f64,
    pub size_a: usize,
    pub size_b: usize,
}

/// Module-level structure: layers and their violations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Architecture {
    pub modules: BTreeMap<String, ModuleAnalysis>,
    pub layers: Vec<Layer>,
    pub violations: Vec<LayerViolation>,
    /// Violating module edges / cross-module edges
    pub violation_rate: f64,
    pub boundary_mismatches: Vec<BoundaryMismatch>,
    /// Cross-module file edges
    pub module_graph: ModuleGraph,
}

impl Architecture {
    pub fn max_depth(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }

    pub fn has_layering(&self) -> bool {
        self.layers.len() >= 2
    }

    fn edges_between(&self, from: &str, to: &str) -> usize {
        self.module_graph
            .get(from)
            .and_then(|targets| targets.get(to))
            .copied()
            .unwrap_or(0)
    }

    fn outgoing(&self, module: &str) -> usize {
        self.module_graph
            .get(module)
            .map(|targets| targets.values().sum())
            .unwrap_or(0)
    }

    /// Share of both modules' outgoing cross-module edges that run between them
    pub fn pair_coupling(&self, a: &str, b: &str) -> f64 {
        let total = self.outgoing(a) + self.outgoing(b);
        if total == 0 {
            return 0.0;
        }
        (self.edges_between(a, b) + self.edges_between(b, a)) as f64 / total as f64
    }

    /// Unordered module pairs with at least one edge between them, `(a, b)` with `a < b`
    pub fn coupled_pairs(&self) -> BTreeSet<(String, String)> {
        self.module_graph
            .iter()
            .flat_map(|(src, targets)| {
                targets.keys().map(move |tgt| {
                    if src < tgt {
                        (src.clone(), tgt.clone())
                    } else {
                        (tgt.clone(), src.clone())
                    }
                })
            })
            .collect()
    }
}
