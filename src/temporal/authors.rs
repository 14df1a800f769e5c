//! Author overlap between modules

use std::collections::{BTreeMap, BTreeSet};

use super::models::GitHistory;

/// Module pair `(a, b)` with `a < b` -> author distance in [0, 1]
pub type AuthorDistances = BTreeMap<(String, String), f64>;

/// Weighted Jaccard distance between the author distributions of each module pair
///
/// A module's distribution is the share of its commits made by each author,
/// counting a commit once per module it touches. Empty for solo histories.
pub fn module_author_distances(
    history: &GitHistory,
    file_modules: &BTreeMap<String, String>,
) -> AuthorDistances {
    if history.team_size() < 2 {
        return AuthorDistances::new();
    }

    let mut counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    for commit in &history.commits {
        let touched: BTreeSet<&str> = commit
            .files
            .iter()
            .filter_map(|f| file_modules.get(f).map(String::as_str))
            .collect();
        for module in touched {
            *counts
                .entry(module)
                .or_default()
                .entry(commit.author.as_str())
                .or_insert(0) += 1;
        }
    }

    let weights: BTreeMap<&str, BTreeMap<&str, f64>> = counts
        .into_iter()
        .map(|(module, authors)| {
            let total: usize = authors.values().sum();
            let shares = authors
                .into_iter()
                .map(|(author, n)| (author, n as f64 / total as f64))
                .collect();
            (module, shares)
        })
        .collect();

    let modules: Vec<&str> = weights.keys().copied().collect();
    let mut distances = AuthorDistances::new();
    for (i, a) in modules.iter().enumerate() {
        for b in &modules[i + 1..] {
            distances.insert(
                (a.to_string(), b.to_string()),
                weighted_jaccard_distance(&weights[a], &weights[b]),
            );
        }
    }
    distances
}

fn weighted_jaccard_distance(a: &BTreeMap<&str, f64>, b: &BTreeMap<&str, f64>) -> f64 {
    let authors: BTreeSet<&str> = a.keys().chain(b.keys()).copied().collect();
    let (mut low, mut high) = (0.0, 0.0);
    for author in authors {
        let wa = a.get(author).copied().unwrap_or(0.0);
        let wb = b.get(author).copied().unwrap_or(0.0);
        low += wa.min(wb);
        high += wa.max(wb);
    }
    if high == 0.0 { 1.0 } else { 1.0 - low / high }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::models::Commit;

    fn commit(author: &str, files: &[&str]) -> Commit {
        Commit {
            hash: String::new(),
            timestamp: 0,
            author: author.to_string(),
            subject: "change".to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn modules() -> BTreeMap<String, String> {
        [("api/a.py", "api"), ("api/b.py", "api"), ("db/c.py", "db"), ("ui/d.py", "ui")]
            .into_iter()
            .map(|(f, m)| (f.to_string(), m.to_string()))
            .collect()
    }

    #[test]
    fn test_disjoint_and_shared_authors() {
        let history = GitHistory {
            commits: vec![
                commit("alice", &["api/a.py", "api/b.py"]),
                commit("alice", &["ui/d.py"]),
                commit("bob", &["db/c.py"]),
            ],
            ..GitHistory::default()
        };
        let distances = module_author_distances(&history, &modules());

        // A commit touching two files of one module counts once
        assert_eq!(distances[&("api".to_string(), "ui".to_string())], 0.0);
        assert_eq!(distances[&("api".to_string(), "db".to_string())], 1.0);
        assert_eq!(distances.len(), 3);
    }

    #[test]
    fn test_partial_overlap() {
        let history = GitHistory {
            commits: vec![
                commit("alice", &["api/a.py"]),
                commit("bob", &["api/b.py"]),
                commit("alice", &["db/c.py"]),
            ],
            ..GitHistory::default()
        };
        let distances = module_author_distances(&history, &modules());
        // api = {alice .5, bob .5}, db = {alice 1}: 1 - 0.5 / 1.5
        let d = distances[&("api".to_string(), "db".to_string())];
        assert!((d - (1.0 - 0.5 / 1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_solo_history_has_no_distances() {
        let history = GitHistory {
            commits: vec![commit("alice", &["api/a.py"]), commit("alice", &["db/c.py"])],
            ..GitHistory::default()
        };
        assert!(module_author_distances(&history, &modules()).is_empty());
    }
}
