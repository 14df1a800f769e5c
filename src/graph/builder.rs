//! Dependency graph construction

use std::collections::BTreeSet;
use tracing::debug;

use super::models::DependencyGraph;
use super::resolver::{ImportResolver, Resolution};
use crate::scanning::models::FileSyntax;

/// Build the import graph and record `resolved_path` on every import.
///
/// Self-imports are dropped and repeated imports of the same file count as
/// one edge.
pub fn build_dependency_graph(files: &mut [FileSyntax]) -> DependencyGraph {
    let resolver = ImportResolver::new(files.iter().map(|f| f.path.as_str()));
    let mut graph = DependencyGraph::default();

    for file in files.iter() {
        graph.nodes.insert(file.path.clone());
        graph.adjacency.entry(file.path.clone()).or_default();
        graph.reverse.entry(file.path.clone()).or_default();
    }

    for file in files.iter_mut() {
        let mut targets = BTreeSet::new();
        for import in file.imports.iter_mut() {
            match resolver.resolve(&file.path, &file.language, import) {
                Resolution::Internal(target) => {
                    import.resolved_path = Some(target.clone());
                    if target != file.path {
                        targets.insert(target);
                    }
                }
                Resolution::External => graph.external_import_count += 1,
                Resolution::Phantom => graph
                    .unresolved_imports
                    .entry(file.path.clone())
                    .or_default()
                    .push(import.source.clone()),
            }
        }

        for target in targets {
            graph
                .reverse
                .entry(target.clone())
                .or_default()
                .push(file.path.clone());
            graph
                .adjacency
                .entry(file.path.clone())
                .or_default()
                .push(target);
            graph.edge_count += 1;
        }
    }

    for sources in graph.reverse.values_mut() {
        sources.sort();
    }

    debug!(
        "Dependency graph: {} nodes, {} edges, {} external imports, {} phantom imports",
        graph.nodes.len(),
        graph.edge_count,
        graph.external_import_count,
        graph.unresolved_imports.values().map(Vec::len).sum::<usize>()
    );
    graph
}
