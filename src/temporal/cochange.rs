//! Co-change matrix

use std::collections::{BTreeMap, BTreeSet};

use super::models::{CoChangeMatrix, CoChangePair, GitHistory};

/// Commits touching more files than this are bulk edits and are ignored
pub const MAX_FILES_PER_COMMIT: usize = 50;
pub const MIN_COCHANGES: usize = 2;

/// Pairwise co-change statistics over analyzed files
pub fn build_cochange_matrix(history: &GitHistory, analyzed: &BTreeSet<String>) -> CoChangeMatrix {
    let mut file_change_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut pair_counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();

    for commit in &history.commits {
        let relevant: BTreeSet<&str> = commit
            .files
            .iter()
            .filter(|f| analyzed.contains(*f))
            .map(String::as_str)
            .collect();
        if relevant.is_empty() || relevant.len() > MAX_FILES_PER_COMMIT {
            continue;
        }
        for file in &relevant {
            *file_change_counts.entry(file.to_string()).or_insert(0) += 1;
        }
        let files: Vec<&str> = relevant.into_iter().collect();
        for (i, a) in files.iter().enumerate() {
            for b in &files[i + 1..] {
                *pair_counts.entry((*a, *b)).or_insert(0) += 1;
            }
        }
    }

    let total_commits = history.total_commits();
    let pairs = pair_counts
        .into_iter()
        .filter(|(_, count)| *count >= MIN_COCHANGES)
        .map(|((a, b), count)| {
            let total_a = file_change_counts.get(a).copied().unwrap_or(0);
            let total_b = file_change_counts.get(b).copied().unwrap_or(0);
            let confidence = |total: usize| if total > 0 { count as f64 / total as f64 } else { 0.0 };
            let expected = if total_commits > 0 {
                (total_a * total_b) as f64 / total_commits as f64
            } else {
                0.0
            };
            let pair = CoChangePair {
                file_a: a.to_string(),
                file_b: b.to_string(),
                cochange_count: count,
                total_a,
                total_b,
                confidence_a_b: confidence(total_a),
                confidence_b_a: confidence(total_b),
                lift: if expected > 0.0 { count as f64 / expected } else { 0.0 },
            };
            ((a.to_string(), b.to_string()), pair)
        })
        .collect();

    CoChangeMatrix {
        pairs,
        total_commits,
        file_change_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::models::Commit;

    fn commit(i: i64, files: &[&str]) -> Commit {
        Commit {
            hash: format!("{:040x}", i),
            timestamp: i,
            author: "dev".to_string(),
            subject: String::new(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_pairs_below_two_cochanges_are_dropped() {
        let history = GitHistory {
            commits: vec![
                commit(3, &["a.py", "b.py"]),
                commit(2, &["a.py", "b.py", "c.py"]),
                commit(1, &["a.py"]),
                commit(0, &["c.py", "d.py"]),
            ],
            ..GitHistory::default()
        };
        let analyzed: BTreeSet<String> = ["a.py", "b.py", "c.py", "d.py"].iter().map(|s| s.to_string()).collect();
        let matrix = build_cochange_matrix(&history, &analyzed);

        assert_eq!(matrix.pairs.len(), 1);
        let pair = &matrix.pairs[&("a.py".to_string(), "b.py".to_string())];
        assert_eq!(pair.cochange_count, 2);
        assert!((pair.confidence_a_b - 2.0 / 3.0).abs() < 1e-12);
        assert!((pair.confidence_b_a - 1.0).abs() < 1e-12);
        // expected = 3 * 2 / 4
        assert!((pair.lift - 2.0 / 1.5).abs() < 1e-12);
        assert_eq!(matrix.file_change_counts["a.py"], 3);
    }
}
