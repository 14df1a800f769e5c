//! Dependency graph construction and structural analysis
//!
//! Modules:
//! - resolver: per-language import resolution against the scanned file set
//! - builder: turns resolved imports into a [`DependencyGraph`]
//! - algorithms: PageRank, betweenness, SCCs, blast radius, DAG depth, orphans
//! - louvain: community detection
//! - modules: per-directory cohesion, coupling and Martin metrics
//! - layers: module layering and violations
//! - clones: copy-paste detection via compression distance
//! - outliers: robust z-score outliers among files
//! - models: shared graph data structures

pub mod algorithms;
pub mod builder;
pub mod clones;
pub mod layers;
pub mod louvain;
pub mod models;
pub mod modules;
pub mod outliers;
pub mod resolver;

pub use algorithms::run_graph_algorithms;
pub use builder::build_dependency_graph;
pub use clones::{clone_ratio, detect_clones};
pub use models::{
    Architecture, BoundaryMismatch, ClonePair, Community, CycleGroup, DependencyGraph,
    GraphAnalysis, Layer, LayerViolation, ModuleAnalysis, ViolationKind,
};
pub use outliers::{detect_outliers, OutlierInput};
pub use resolver::{ImportResolver, Resolution};

use std::collections::HashMap;
use tracing::debug;

use crate::scanning::FileSyntax;
use crate::semantics::Role;

/// Module metrics, layering and boundary mismatches in one pass
pub fn analyze_architecture(
    files: &[FileSyntax],
    graph: &DependencyGraph,
    analysis: &GraphAnalysis,
    roles: &HashMap<String, Role>,
) -> Architecture {
    let mut modules = modules::measure_modules(files, graph, analysis, roles);
    let file_modules = modules::file_modules(files);
    let module_graph = layers::build_module_graph(&file_modules, graph);
    let (layers, violations) = layers::infer_layers(&mut modules, &module_graph);
    let violation_rate = layers::violation_rate(&violations, &module_graph);
    let boundary_mismatches = modules::boundary_mismatches(&modules, analysis);

    debug!(
        "Architecture: {} modules, {} layers, {} violations",
        modules.len(),
        layers.len(),
        violations.len()
    );

    Architecture {
        modules,
        layers,
        violations,
        violation_rate,
        boundary_mismatches,
        module_graph,
    }
}
