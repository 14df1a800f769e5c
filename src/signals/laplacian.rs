//! Health Laplacian: how much worse a file is than its neighbourhood

use std::collections::{BTreeMap, BTreeSet};

use super::models::SignalField;
use crate::graph::DependencyGraph;

/// `raw_risk(f) - mean(raw_risk(neighbours))` over the undirected graph.
///
/// Uses raw risk rather than percentiles, which are uniform by construction.
/// Files without neighbours get 0.
pub fn health_laplacian(field: &SignalField, graph: &DependencyGraph) -> BTreeMap<String, f64> {
    field
        .per_file
        .iter()
        .map(|(path, file)| {
            let neighbours: BTreeSet<&String> = graph
                .dependencies(path)
                .iter()
                .chain(graph.dependents(path))
                .filter(|n| field.per_file.contains_key(*n))
                .collect();
            let delta = if neighbours.is_empty() {
                0.0
            } else {
                let total: f64 = neighbours.iter().map(|n| field.per_file[*n].raw_risk).sum();
                file.raw_risk - total / neighbours.len() as f64
            };
            (path.clone(), delta)
        })
        .collect()
}
