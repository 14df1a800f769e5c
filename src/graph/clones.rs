//! Copy-paste detection with normalized compression distance

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::models::ClonePair;
use crate::math::compression::ncd;
use crate::semantics::Role;

/// NCD below this marks a pair as clones
pub const CLONE_THRESHOLD: f64 = 0.3;
/// Files shorter than this many lines are ignored
pub const MIN_CLONE_LINES: usize = 10;
/// Pairs whose sizes differ more than this factor cannot be clones
const MIN_SIZE_RATIO: f64 = 0.5;

fn skip_pair(roles: &HashMap<String, Role>, a: &str, b: &str) -> bool {
    let generated = |p: &str| matches!(roles.get(p), Some(Role::Test) | Some(Role::Migration));
    generated(a) && generated(b)
}

/// All clone pairs among `contents`, sorted by NCD.
///
/// Pairs where both sides are tests or migrations are skipped; those are
/// expected to look alike.
pub fn detect_clones(
    contents: &BTreeMap<String, String>,
    roles: &HashMap<String, Role>,
) -> Vec<ClonePair> {
    let candidates: Vec<(&str, &[u8])> = contents
        .iter()
        .filter(|(_, content)| content.lines().filter(|l| !l.trim().is_empty()).count() >= MIN_CLONE_LINES)
        .map(|(path, content)| (path.as_str(), content.as_bytes()))
        .collect();
    if candidates.len() < 2 {
        return Vec::new();
    }

    let mut pairs: Vec<ClonePair> = (0..candidates.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let (path_a, bytes_a) = candidates[i];
            candidates[i + 1..]
                .iter()
                .filter_map(move |&(path_b, bytes_b)| {
                    let (small, large) = if bytes_a.len() < bytes_b.len() {
                        (bytes_a.len(), bytes_b.len())
                    } else {
                        (bytes_b.len(), bytes_a.len())
                    };
                    if (small as f64) < MIN_SIZE_RATIO * large as f64 {
                        return None;
                    }
                    if skip_pair(roles, path_a, path_b) {
                        return None;
                    }
                    let distance = ncd(bytes_a, bytes_b);
                    (distance < CLONE_THRESHOLD).then(|| ClonePair {
                        file_a: path_a.to_string(),
                        file_b: path_b.to_string(),
                        ncd: distance,
                        size_a: bytes_a.len(),
                        size_b: bytes_b.len(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();

    pairs.sort_by(|a, b| {
        a.ncd
            .total_cmp(&b.ncd)
            .then_with(|| a.file_a.cmp(&b.file_a))
            .then_with(|| a.file_b.cmp(&b.file_b))
    });
    pairs
}

/// Share of files that take part in at least one clone pair
pub fn clone_ratio(pairs: &[ClonePair], total_files: usize) -> f64 {
    if total_files == 0 {
        return 0.0;
    }
    let involved: BTreeSet<&str> = pairs
        .iter()
        .flat_map(|p| [p.file_a.as_str(), p.file_b.as_str()])
        .collect();
    involved.len() as f64 / total_files as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(seed: &str) -> String {
        (0..40)
            .map(|i| format!("def handler_{i}(request):\n    return process(request, '{seed}', {i})\n"))
            .collect()
    }

    #[test]
    fn test_identical_files_are_clones() {
        let contents = BTreeMap::from([
            ("a.py".to_string(), body("x")),
            ("b.py".to_string(), body("x")),
            ("tiny.py".to_string(), "x = 1\n".to_string()),
        ]);
        let pairs = detect_clones(&contents, &HashMap::new());
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].file_a, "a.py");
        assert!(pairs[0].ncd < CLONE_THRESHOLD);
        assert!((clone_ratio(&pairs, 3) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_test_pairs_are_skipped() {
        let contents = BTreeMap::from([
            ("tests/test_a.py".to_string(), body("x")),
            ("tests/test_b.py".to_string(), body("x")),
        ]);
        let roles = HashMap::from([
            ("tests/test_a.py".to_string(), Role::Test),
            ("tests/test_b.py".to_string(), Role::Test),
        ]);
        assert!(detect_clones(&contents, &roles).is_empty());
    }
}
