//! Graph algorithms: centrality, cycles, blast radius, depth, orphans

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::debug;

use super::louvain::louvain;
use super::models::{CycleGroup, DependencyGraph, GraphAnalysis};
use crate::config::AnalysisConfig;
use crate::math::gini::gini_or_zero;
use crate::semantics::Role;

const UNVISITED: usize = usize::MAX;

/// Roles that are legitimately never imported
const NON_ORPHAN_ROLES: &[Role] = &[
    Role::EntryPoint,
    Role::Test,
    Role::Config,
    Role::Interface,
    Role::Exception,
];

/// Dense index view of a [`DependencyGraph`]
struct IndexedGraph<'g> {
    names: Vec<&'g str>,
    out: Vec<Vec<usize>>,
    inc: Vec<Vec<usize>>,
}

impl<'g> IndexedGraph<'g> {
    fn new(graph: &'g DependencyGraph) -> Self {
        let names: Vec<&str> = graph.nodes.iter().map(String::as_str).collect();
        let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let mut out = vec![Vec::new(); names.len()];
        let mut inc = vec![Vec::new(); names.len()];
        for (src, tgt) in graph.edges() {
            if let (Some(&i), Some(&j)) = (index.get(src), index.get(tgt)) {
                out[i].push(j);
                inc[j].push(i);
            }
        }
        Self { names, out, inc }
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn to_map<T: Clone>(&self, values: &[T]) -> BTreeMap<String, T> {
        self.names
            .iter()
            .zip(values)
            .map(|(n, v)| (n.to_string(), v.clone()))
            .collect()
    }
}

/// Power-iteration PageRank with uniform teleport and dangling-mass
/// redistribution. Ranks sum to 1.
pub fn pagerank(
    graph: &DependencyGraph,
    damping: f64,
    iterations: usize,
    tolerance: f64,
) -> BTreeMap<String, f64> {
    let g = IndexedGraph::new(graph);
    let n = g.len();
    if n == 0 {
        return BTreeMap::new();
    }
    let nf = n as f64;
    let mut rank = vec![1.0 / nf; n];
    let dangling: Vec<usize> = (0..n).filter(|&i| g.out[i].is_empty()).collect();

    for _ in 0..iterations {
        let dangling_sum: f64 = dangling.iter().map(|&i| rank[i]).sum();
        let base = (1.0 - damping) / nf + damping * dangling_sum / nf;
        let mut next = vec![base; n];
        let mut max_diff: f64 = 0.0;
        for node in 0..n {
            for &src in &g.inc[node] {
                next[node] += damping * rank[src] / g.out[src].len() as f64;
            }
            max_diff = max_diff.max((next[node] - rank[node]).abs());
        }
        rank = next;
        if max_diff < tolerance {
            break;
        }
    }
    g.to_map(&rank)
}

/// Brandes betweenness on directed edges, normalized by `(n−1)(n−2)`
pub fn betweenness(graph: &DependencyGraph) -> BTreeMap<String, f64> {
    let g = IndexedGraph::new(graph);
    let n = g.len();
    let mut centrality = vec![0.0; n];

    for s in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![-1i64; n];
        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = VecDeque::from([s]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &g.out[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        for c in centrality.iter_mut() {
            *c *= scale;
        }
    }
    g.to_map(&centrality)
}

/// Iterative Tarjan over index adjacency lists
fn tarjan_indices(out: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = out.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut counter = 0;
    let mut components = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = counter;
        lowlink[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;

        // (node, next neighbour position)
        let mut calls: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(frame) = calls.last_mut() {
            let v = frame.0;
            if frame.1 < out[v].len() {
                let w = out[v][frame.1];
                frame.1 += 1;
                if index[w] == UNVISITED {
                    index[w] = counter;
                    lowlink[w] = counter;
                    counter += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    calls.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            calls.pop();
            if let Some(&(caller, _)) = calls.last() {
                lowlink[caller] = lowlink[caller].min(lowlink[v]);
            }
            if lowlink[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }
    components
}

/// Strongly connected components of the file graph, singletons included
pub fn tarjan_scc(graph: &DependencyGraph) -> Vec<BTreeSet<String>> {
    let g = IndexedGraph::new(graph);
    tarjan_indices(&g.out)
        .into_iter()
        .map(|c| c.into_iter().map(|i| g.names[i].to_string()).collect())
        .collect()
}

/// SCCs with more than one member, largest first
pub fn find_cycles(graph: &DependencyGraph) -> Vec<CycleGroup> {
    let mut cycles: Vec<CycleGroup> = tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|nodes| {
            let internal_edge_count = nodes
                .iter()
                .map(|n| graph.dependencies(n).iter().filter(|t| nodes.contains(*t)).count())
                .sum();
            CycleGroup {
                nodes,
                internal_edge_count,
            }
        })
        .collect();
    cycles.sort_by(|a, b| b.nodes.len().cmp(&a.nodes.len()).then(a.nodes.cmp(&b.nodes)));
    cycles
}

/// Component labels of the module-level condensation, used for layering
pub(crate) fn scc_labels(out: &[Vec<usize>]) -> Vec<usize> {
    let mut labels = vec![0; out.len()];
    for (label, component) in tarjan_indices(out).into_iter().enumerate() {
        for node in component {
            labels[node] = label;
        }
    }
    labels
}

/// Files that transitively import each file (BFS over reverse edges)
pub fn blast_radius(graph: &DependencyGraph) -> BTreeMap<String, BTreeSet<String>> {
    let g = IndexedGraph::new(graph);
    let n = g.len();
    let mut result = BTreeMap::new();
    for start in 0..n {
        let mut seen = vec![false; n];
        let mut queue: VecDeque<usize> = g.inc[start].iter().copied().collect();
        let mut affected = BTreeSet::new();
        while let Some(node) = queue.pop_front() {
            if seen[node] {
                continue;
            }
            seen[node] = true;
            if node != start {
                affected.insert(g.names[node].to_string());
            }
            queue.extend(g.inc[node].iter().copied().filter(|&p| !seen[p]));
        }
        result.insert(g.names[start].to_string(), affected);
    }
    result
}

/// BFS hop count from the nearest entry point; -1 when unreachable
pub fn dag_depth(graph: &DependencyGraph, entry_points: &BTreeSet<String>) -> BTreeMap<String, i64> {
    let mut depth: BTreeMap<String, i64> = graph.nodes.iter().map(|n| (n.clone(), -1)).collect();
    let mut queue = VecDeque::new();
    for entry in entry_points {
        if let Some(d) = depth.get_mut(entry) {
            *d = 0;
            queue.push_back((entry.clone(), 0i64));
        }
    }
    while let Some((node, d)) = queue.pop_front() {
        for next in graph.dependencies(&node) {
            if let Some(slot) = depth.get_mut(next) {
                if *slot == -1 {
                    *slot = d + 1;
                    queue.push_back((next.clone(), d + 1));
                }
            }
        }
    }
    depth
}

/// Never-imported files whose role does not explain it
pub fn orphans(
    in_degree: &BTreeMap<String, usize>,
    roles: &HashMap<String, Role>,
) -> BTreeMap<String, bool> {
    in_degree
        .iter()
        .map(|(path, &degree)| {
            let role = roles.get(path).copied().unwrap_or(Role::Unknown);
            (path.clone(), degree == 0 && !NON_ORPHAN_ROLES.contains(&role))
        })
        .collect()
}

/// Gini of the PageRank distribution; 0 for trivial graphs
pub fn centrality_gini(pagerank: &BTreeMap<String, f64>) -> f64 {
    if pagerank.len() <= 1 {
        return 0.0;
    }
    let values: Vec<f64> = pagerank.values().copied().collect();
    if values.iter().all(|v| *v == 0.0) {
        return 0.0;
    }
    gini_or_zero(&values, false)
}

/// Run every file-level graph algorithm
pub fn run_graph_algorithms(
    graph: &DependencyGraph,
    config: &AnalysisConfig,
    roles: &HashMap<String, Role>,
) -> GraphAnalysis {
    let mut analysis = GraphAnalysis {
        pagerank: pagerank(
            graph,
            config.pagerank_damping,
            config.pagerank_iterations,
            config.pagerank_tolerance,
        ),
        betweenness: betweenness(graph),
        ..GraphAnalysis::default()
    };

    for node in &graph.nodes {
        analysis
            .out_degree
            .insert(node.clone(), graph.dependencies(node).len());
        analysis
            .in_degree
            .insert(node.clone(), graph.dependents(node).len());
    }

    analysis.cycles = find_cycles(graph);
    analysis.blast_radius = blast_radius(graph);

    let communities = louvain(graph);
    analysis.communities = communities.communities;
    analysis.node_community = communities.node_community;
    analysis.modularity = communities.modularity;

    let entry_points: BTreeSet<String> = graph
        .nodes
        .iter()
        .filter(|n| {
            let structural = analysis.in_degree[*n] == 0 && analysis.out_degree[*n] > 0;
            structural || roles.get(*n) == Some(&Role::EntryPoint)
        })
        .cloned()
        .collect();
    analysis.depth = dag_depth(graph, &entry_points);
    analysis.is_orphan = orphans(&analysis.in_degree, roles);
    analysis.centrality_gini = centrality_gini(&analysis.pagerank);

    debug!(
        "Graph analysis: {} cycles, {} communities, modularity {:.3}",
        analysis.cycles.len(),
        analysis.communities.len(),
        analysis.modularity
    );
    analysis
}
