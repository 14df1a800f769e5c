//! Louvain community detection
//!
//! Phase 1 moves single nodes to the neighbouring community with the best
//! modularity gain; phase 2 collapses every community into a super-node and
//! the two phases repeat on the coarser graph. Edges are treated as
//! undirected with weight = number of import edges between the pair.

use std::collections::{BTreeMap, BTreeSet};

use super::models::{Community, DependencyGraph};

const MAX_PASSES: usize = 20;
const MAX_LEVELS: usize = 10;

type EdgeWeights = BTreeMap<(usize, usize), f64>;

#[derive(Debug, Clone, Default)]
pub struct LouvainResult {
    pub communities: Vec<Community>,
    pub node_community: BTreeMap<String, usize>,
    pub modularity: f64,
}

fn canonical(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Greedy local moving; returns the community of every node and whether any
/// node moved.
fn local_moving(n: usize, edges: &EdgeWeights, degree: &[f64], m: f64) -> (Vec<usize>, bool) {
    let two_m = 2.0 * m;
    let two_m_sq = two_m * two_m;
    let mut node_comm: Vec<usize> = (0..n).collect();
    let mut sigma_tot: Vec<f64> = degree.to_vec();

    let mut neighbors: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
    for (&(a, b), &w) in edges {
        *neighbors[a].entry(b).or_insert(0.0) += w;
        *neighbors[b].entry(a).or_insert(0.0) += w;
    }

    let mut any_moved = false;
    for _ in 0..MAX_PASSES {
        let mut moved = false;
        for node in 0..n {
            let current = node_comm[node];
            let ki = degree[node];

            let mut comm_weights: BTreeMap<usize, f64> = BTreeMap::new();
            for (&neighbor, &w) in &neighbors[node] {
                *comm_weights.entry(node_comm[neighbor]).or_insert(0.0) += w;
            }

            let ki_in_current = comm_weights.get(&current).copied().unwrap_or(0.0);
            let sigma_current = sigma_tot[current] - ki;
            let remove_cost = ki_in_current / two_m - (sigma_current * ki) / two_m_sq;

            let mut best = current;
            let mut best_gain = 0.0;
            for (&comm, &ki_in_target) in &comm_weights {
                if comm == current {
                    continue;
                }
                let add_gain = ki_in_target / two_m - (sigma_tot[comm] * ki) / two_m_sq;
                let net_gain = add_gain - remove_cost;
                if net_gain > best_gain {
                    best_gain = net_gain;
                    best = comm;
                }
            }

            if best != current {
                sigma_tot[current] -= ki;
                sigma_tot[best] += ki;
                node_comm[node] = best;
                moved = true;
                any_moved = true;
            }
        }
        if !moved {
            break;
        }
    }
    (node_comm, any_moved)
}

/// Collapse communities into super-nodes ordered by community id.
/// Intra-community weight survives as a self-loop.
fn coarsen(edges: &EdgeWeights, degree: &[f64], node_comm: &[usize]) -> (EdgeWeights, Vec<f64>, Vec<Vec<usize>>) {
    let ids: BTreeSet<usize> = node_comm.iter().copied().collect();
    let renumber: BTreeMap<usize, usize> = ids.iter().enumerate().map(|(new, &old)| (old, new)).collect();

    let mut members = vec![Vec::new(); ids.len()];
    let mut new_degree = vec![0.0; ids.len()];
    for (node, comm) in node_comm.iter().enumerate() {
        let super_node = renumber[comm];
        members[super_node].push(node);
        new_degree[super_node] += degree[node];
    }

    let mut new_edges = EdgeWeights::new();
    for (&(a, b), &w) in edges {
        let key = canonical(renumber[&node_comm[a]], renumber[&node_comm[b]]);
        *new_edges.entry(key).or_insert(0.0) += w;
    }
    (new_edges, new_degree, members)
}

/// `Q = Σ_c [e_in/m − (σ_c/2m)²]` over undirected weighted edges
pub fn modularity(edges: &EdgeWeights, degree: &[f64], node_comm: &[usize], m: f64) -> f64 {
    if m == 0.0 {
        return 0.0;
    }
    let e_in: f64 = edges
        .iter()
        .filter(|((a, b), _)| node_comm[*a] == node_comm[*b])
        .map(|(_, w)| w)
        .sum();
    let mut sigma: BTreeMap<usize, f64> = BTreeMap::new();
    for (node, deg) in degree.iter().enumerate() {
        *sigma.entry(node_comm[node]).or_insert(0.0) += deg;
    }
    let null_term: f64 = sigma.values().map(|s| s * s).sum::<f64>() / (4.0 * m * m);
    e_in / m - null_term
}

pub fn louvain(graph: &DependencyGraph) -> LouvainResult {
    let names: Vec<&str> = graph.nodes.iter().map(String::as_str).collect();
    let n = names.len();
    if n == 0 {
        return LouvainResult::default();
    }
    let index: BTreeMap<&str, usize> = names.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    let mut edges = EdgeWeights::new();
    let mut degree = vec![0.0; n];
    for (src, tgt) in graph.edges() {
        let (Some(&i), Some(&j)) = (index.get(src), index.get(tgt)) else {
            continue;
        };
        *edges.entry(canonical(i, j)).or_insert(0.0) += 1.0;
        degree[i] += 1.0;
        degree[j] += 1.0;
    }
    let original_edges = edges.clone();
    let original_degree = degree.clone();
    let m: f64 = edges.values().sum();

    if m == 0.0 {
        return LouvainResult {
            communities: names
                .iter()
                .enumerate()
                .map(|(id, name)| Community {
                    id,
                    members: BTreeSet::from([name.to_string()]),
                })
                .collect(),
            node_community: names.iter().enumerate().map(|(i, s)| (s.to_string(), i)).collect(),
            modularity: 0.0,
        };
    }

    // Level node → original nodes it stands for
    let mut original_members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    let mut level_size = n;
    let mut node_comm: Vec<usize> = (0..n).collect();

    for _ in 0..MAX_LEVELS {
        let (assignment, improved) = local_moving(level_size, &edges, &degree, m);
        node_comm = assignment;
        if !improved {
            break;
        }
        let distinct: BTreeSet<usize> = node_comm.iter().copied().collect();
        if distinct.len() == level_size {
            break;
        }

        let (new_edges, new_degree, members) = coarsen(&edges, &degree, &node_comm);
        original_members = members
            .iter()
            .map(|level_nodes| {
                level_nodes
                    .iter()
                    .flat_map(|&ln| original_members[ln].iter().copied())
                    .collect()
            })
            .collect();
        edges = new_edges;
        degree = new_degree;
        level_size = members.len();
        node_comm = (0..level_size).collect();
    }

    let mut grouped: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for (level_node, comm) in node_comm.iter().enumerate() {
        grouped
            .entry(*comm)
            .or_default()
            .extend(original_members[level_node].iter().copied());
    }

    let mut assignment = vec![0usize; n];
    let mut communities = Vec::with_capacity(grouped.len());
    for (id, members) in grouped.values().enumerate() {
        for &node in members {
            assignment[node] = id;
        }
        communities.push(Community {
            id,
            members: members.iter().map(|&i| names[i].to_string()).collect(),
        });
    }

    LouvainResult {
        modularity: modularity(&original_edges, &original_degree, &assignment, m),
        node_community: names
            .iter()
            .enumerate()
            .map(|(i, s)| (s.to_string(), assignment[i]))
            .collect(),
        communities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)], isolated: &[&str]) -> DependencyGraph {
        let mut g = DependencyGraph::default();
        for (a, b) in edges {
            g.nodes.insert(a.to_string());
            g.nodes.insert(b.to_string());
            g.adjacency.entry(a.to_string()).or_default().push(b.to_string());
            g.reverse.entry(b.to_string()).or_default().push(a.to_string());
            g.edge_count += 1;
        }
        for n in isolated {
            g.nodes.insert(n.to_string());
        }
        g
    }

    #[test]
    fn test_two_triangles_split_into_two_communities() {
        let g = graph(
            &[
                ("a1", "a2"),
                ("a2", "a3"),
                ("a3", "a1"),
                ("b1", "b2"),
                ("b2", "b3"),
                ("b3", "b1"),
                ("a1", "b1"),
            ],
            &[],
        );
        let result = louvain(&g);
        assert_eq!(result.communities.len(), 2);
        assert_eq!(result.node_community["a1"], result.node_community["a3"]);
        assert_eq!(result.node_community["b1"], result.node_community["b2"]);
        assert_ne!(result.node_community["a1"], result.node_community["b1"]);
        // 6/7 - 2 * (7/14)^2
        assert!((result.modularity - (6.0 / 7.0 - 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_edgeless_graph_gives_singletons() {
        let g = graph(&[], &["x", "y", "z"]);
        let result = louvain(&g);
        assert_eq!(result.communities.len(), 3);
        assert_eq!(result.modularity, 0.0);
        assert_eq!(result.node_community["y"], 1);
    }

    #[test]
    fn test_empty_graph() {
        let result = louvain(&DependencyGraph::default());
        assert!(result.communities.is_empty());
        assert_eq!(result.modularity, 0.0);
    }
}
