//! Layer inference on the module graph

use std::collections::BTreeMap;

use super::algorithms::scc_labels;
use super::models::{Layer, LayerViolation, ModuleAnalysis, ViolationKind};
use super::DependencyGraph;

/// `module_graph[src][tgt]` = number of file edges from `src` to `tgt`
pub type ModuleGraph = BTreeMap<String, BTreeMap<String, usize>>;

/// Contract file edges into weighted module edges (self-edges dropped)
pub fn build_module_graph(file_modules: &BTreeMap<String, String>, graph: &DependencyGraph) -> ModuleGraph {
    let mut module_graph = ModuleGraph::new();
    for (src, tgt) in graph.edges() {
        let (Some(src_mod), Some(tgt_mod)) = (file_modules.get(src), file_modules.get(tgt)) else {
            continue;
        };
        if src_mod != tgt_mod {
            *module_graph
                .entry(src_mod.clone())
                .or_default()
                .entry(tgt_mod.clone())
                .or_insert(0) += 1;
        }
    }
    module_graph
}

fn layer_label(depth: usize, max_depth: usize) -> &'static str {
    if depth == 0 {
        "foundation"
    } else if depth == max_depth {
        "entry"
    } else if depth + 1 == max_depth {
        "service"
    } else {
        "logic"
    }
}

/// Longest-path layering: modules without outgoing module edges sit at
/// layer 0, everything else one above its highest dependency. Modules in a
/// dependency cycle share a layer. Assigns `layer` on every module.
pub fn infer_layers(
    modules: &mut BTreeMap<String, ModuleAnalysis>,
    module_graph: &ModuleGraph,
) -> (Vec<Layer>, Vec<LayerViolation>) {
    if modules.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let names: Vec<String> = modules.keys().cloned().collect();
    let index: BTreeMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
    let mut out = vec![Vec::new(); names.len()];
    for (src, targets) in module_graph {
        let Some(&i) = index.get(src.as_str()) else { continue };
        for tgt in targets.keys() {
            if let Some(&j) = index.get(tgt.as_str()) {
                out[i].push(j);
            }
        }
    }

    // Tarjan emits components in reverse topological order, so every
    // dependency component is labelled before its dependents
    let labels = scc_labels(&out);
    let component_count = labels.iter().copied().max().map(|m| m + 1).unwrap_or(0);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); component_count];
    for (node, &label) in labels.iter().enumerate() {
        members[label].push(node);
    }

    let mut component_layer = vec![0usize; component_count];
    for label in 0..component_count {
        let mut layer = 0;
        for &node in &members[label] {
            for &dep in &out[node] {
                let dep_label = labels[dep];
                if dep_label != label {
                    layer = layer.max(component_layer[dep_label] + 1);
                }
            }
        }
        component_layer[label] = layer;
    }

    let mut max_depth = 0;
    for (i, name) in names.iter().enumerate() {
        let layer = component_layer[labels[i]];
        max_depth = max_depth.max(layer);
        if let Some(module) = modules.get_mut(name) {
            module.layer = Some(layer);
        }
    }

    let mut by_depth: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for (name, module) in modules.iter() {
        by_depth.entry(module.layer.unwrap_or(0)).or_default().push(name.clone());
    }
    let layers = (0..=max_depth)
        .map(|depth| Layer {
            depth,
            modules: by_depth.remove(&depth).unwrap_or_default(),
            label: layer_label(depth, max_depth).to_string(),
        })
        .collect();

    (layers, detect_violations(modules, module_graph))
}

/// BACKWARD: source layer below target layer. SKIP: jumps more than one layer down.
pub fn detect_violations(
    modules: &BTreeMap<String, ModuleAnalysis>,
    module_graph: &ModuleGraph,
) -> Vec<LayerViolation> {
    let mut violations = Vec::new();
    for (src, targets) in module_graph {
        let Some(src_layer) = modules.get(src).and_then(|m| m.layer) else {
            continue;
        };
        for (tgt, &edge_count) in targets {
            let Some(tgt_layer) = modules.get(tgt).and_then(|m| m.layer) else {
                continue;
            };
            let kind = if src_layer < tgt_layer {
                ViolationKind::Backward
            } else if src_layer - tgt_layer > 1 {
                ViolationKind::Skip
            } else {
                continue;
            };
            violations.push(LayerViolation {
                source_module: src.clone(),
                target_module: tgt.clone(),
                source_layer: src_layer,
                target_layer: tgt_layer,
                kind,
                edge_count,
            });
        }
    }
    violations
}

/// Violating file edges / all cross-module file edges
pub fn violation_rate(violations: &[LayerViolation], module_graph: &ModuleGraph) -> f64 {
    let cross: usize = module_graph.values().flat_map(|t| t.values()).sum();
    if cross == 0 {
        return 0.0;
    }
    let violating: usize = violations.iter().map(|v| v.edge_count).sum();
    violating as f64 / cross as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(names: &[&str]) -> BTreeMap<String, ModuleAnalysis> {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    ModuleAnalysis {
                        path: n.to_string(),
                        ..ModuleAnalysis::default()
                    },
                )
            })
            .collect()
    }

    fn module_graph(edges: &[(&str, &str, usize)]) -> ModuleGraph {
        let mut g = ModuleGraph::new();
        for (a, b, w) in edges {
            g.entry(a.to_string()).or_default().insert(b.to_string(), *w);
        }
        g
    }

    #[test]
    fn test_longest_path_layers_and_skip_violation() {
        let mut mods = modules(&["api", "core", "db", "util"]);
        let g = module_graph(&[
            ("api", "core", 3),
            ("core", "db", 2),
            ("db", "util", 1),
            ("api", "util", 1),
        ]);
        let (layers, violations) = infer_layers(&mut mods, &g);
        assert_eq!(mods["util"].layer, Some(0));
        assert_eq!(mods["db"].layer, Some(1));
        assert_eq!(mods["api"].layer, Some(3));
        assert_eq!(layers.len(), 4);
        assert_eq!(layers[0].label, "foundation");
        assert_eq!(layers[3].label, "entry");

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Skip);
        assert_eq!(violations[0].target_module, "util");
        assert!((violation_rate(&violations, &g) - 1.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_cycle_members_share_a_layer() {
        let mut mods = modules(&["a", "b", "c"]);
        let g = module_graph(&[("a", "b", 1), ("b", "a", 1), ("a", "c", 1)]);
        let (_, violations) = infer_layers(&mut mods, &g);
        assert_eq!(mods["a"].layer, mods["b"].layer);
        assert_eq!(mods["c"].layer, Some(0));
        assert!(violations.is_empty());
    }
}
