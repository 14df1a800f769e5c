//! Per-directory module measurements and boundary analysis

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::models::{BoundaryMismatch, DependencyGraph, GraphAnalysis, ModuleAnalysis};
use crate::scanning::models::{parent_dir, FileSyntax};
use crate::semantics::Role;

/// Modules below this alignment with more than two files are reported
const MISMATCH_ALIGNMENT: f64 = 0.7;
const MISMATCH_MIN_FILES: usize = 2;

/// Module (directory) of every file
pub fn file_modules(files: &[FileSyntax]) -> BTreeMap<String, String> {
    files
        .iter()
        .map(|f| (f.path.clone(), parent_dir(&f.path).to_string()))
        .collect()
}

/// Cohesion, coupling, Martin metrics and role make-up for every module
pub fn measure_modules(
    files: &[FileSyntax],
    graph: &DependencyGraph,
    analysis: &GraphAnalysis,
    roles: &HashMap<String, Role>,
) -> BTreeMap<String, ModuleAnalysis> {
    let mut grouped: BTreeMap<String, Vec<&FileSyntax>> = BTreeMap::new();
    for file in files {
        grouped
            .entry(parent_dir(&file.path).to_string())
            .or_default()
            .push(file);
    }

    grouped
        .into_iter()
        .map(|(path, members)| {
            let module = measure_module(&path, &members, graph, analysis, roles);
            (path, module)
        })
        .collect()
}

fn measure_module(
    path: &str,
    members: &[&FileSyntax],
    graph: &DependencyGraph,
    analysis: &GraphAnalysis,
    roles: &HashMap<String, Role>,
) -> ModuleAnalysis {
    let file_set: BTreeSet<&str> = members.iter().map(|f| f.path.as_str()).collect();
    let mut module = ModuleAnalysis {
        path: path.to_string(),
        files: members.iter().map(|f| f.path.clone()).collect(),
        ..ModuleAnalysis::default()
    };

    for file in members {
        for dep in graph.dependencies(&file.path) {
            if file_set.contains(dep.as_str()) {
                module.internal_edges += 1;
            } else {
                module.external_edges_out += 1;
            }
        }
        module.external_edges_in += graph
            .dependents(&file.path)
            .iter()
            .filter(|src| !file_set.contains(src.as_str()))
            .count();
    }

    let n = members.len();
    let possible = if n > 1 { n * (n - 1) } else { 1 };
    module.cohesion = module.internal_edges as f64 / possible as f64;

    let external = module.external_edges_out + module.external_edges_in;
    let total = module.internal_edges + external;
    module.coupling = if total > 0 {
        external as f64 / total as f64
    } else {
        0.0
    };

    // Every file belongs to exactly one module, so cross-module edges are
    // exactly the external ones
    module.afferent_coupling = module.external_edges_in;
    module.efferent_coupling = module.external_edges_out;
    module.instability = if external > 0 {
        Some(module.efferent_coupling as f64 / external as f64)
    } else {
        None
    };

    let classes: usize = members.iter().map(|f| f.classes.len()).sum();
    let abstract_classes: usize = members
        .iter()
        .map(|f| f.classes.iter().filter(|c| c.is_abstract).count())
        .sum();
    module.abstractness = if classes == 0 {
        0.0
    } else {
        (abstract_classes as f64 / classes as f64).min(1.0)
    };
    module.main_seq_distance = match module.instability {
        Some(i) => (module.abstractness + i - 1.0).abs(),
        None => 0.0,
    };

    let mut role_counts: BTreeMap<Role, usize> = BTreeMap::new();
    for file in members {
        let role = roles.get(&file.path).copied().unwrap_or(Role::Unknown);
        *role_counts.entry(role).or_insert(0) += 1;
    }
    // Ties go to the role listed first
    let (dominant, count) = role_counts
        .iter()
        .fold((Role::Unknown, 0), |best, (role, count)| {
            if *count > best.1 {
                (*role, *count)
            } else {
                best
            }
        });
    module.dominant_role = dominant.as_str().to_string();
    module.role_consistency = if n > 0 { count as f64 / n as f64 } else { 0.0 };

    let mut community_counts: BTreeMap<usize, usize> = BTreeMap::new();
    for file in members {
        if let Some(&cid) = analysis.node_community.get(&file.path) {
            module.community_ids.insert(cid);
            *community_counts.entry(cid).or_insert(0) += 1;
        }
    }
    module.boundary_alignment = match community_counts.values().max() {
        Some(&dominant_count) if n > 0 => dominant_count as f64 / n as f64,
        _ => 1.0,
    };

    module
}

/// Modules whose declared boundary disagrees with the discovered communities
pub fn boundary_mismatches(
    modules: &BTreeMap<String, ModuleAnalysis>,
    analysis: &GraphAnalysis,
) -> Vec<BoundaryMismatch> {
    let community_of = |f: &str| analysis.node_community.get(f).copied();

    let mut mismatches = Vec::new();
    for (path, module) in modules {
        if module.boundary_alignment >= MISMATCH_ALIGNMENT || module.file_count() <= MISMATCH_MIN_FILES {
            continue;
        }

        let mut distribution: BTreeMap<usize, usize> = BTreeMap::new();
        for file in &module.files {
            if let Some(cid) = community_of(file) {
                *distribution.entry(cid).or_insert(0) += 1;
            }
        }
        let Some(dominant) = distribution
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(cid, _)| *cid)
        else {
            continue;
        };

        let misplaced = module
            .files
            .iter()
            .filter_map(|file| {
                let cid = community_of(file)?;
                if cid == dominant {
                    return None;
                }
                Some((file.clone(), suggest_module(cid, modules, analysis)))
            })
            .collect();

        mismatches.push(BoundaryMismatch {
            module_path: path.clone(),
            file_count: module.file_count(),
            alignment: module.boundary_alignment,
            community_distribution: distribution,
            misplaced_files: misplaced,
        });
    }
    mismatches
}

/// Module holding the most files of `community`
fn suggest_module(
    community: usize,
    modules: &BTreeMap<String, ModuleAnalysis>,
    analysis: &GraphAnalysis,
) -> String {
    modules
        .iter()
        .map(|(path, module)| {
            let count = module
                .files
                .iter()
                .filter(|f| analysis.node_community.get(*f) == Some(&community))
                .count();
            (path, count)
        })
        .filter(|(_, count)| *count > 0)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(path, _)| path.clone())
        .unwrap_or_else(|| "unknown".to_string())
}
