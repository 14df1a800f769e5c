// Stable finding identity across snapshots

use sha2::{Digest, Sha256};

const SINGLE_FILE_TYPES: &[&str] = &[
    "high_risk_hub",
    "god_file",
    "unstable_file",
    "orphan_code",
    "hollow_code",
    "phantom_imports",
    "naming_drift",
    "knowledge_silo",
    "weak_link",
    "truck_factor",
    "bug_attractor",
    "bug_magnet",
    "thrashing_code",
    "review_blindspot",
    "incomplete_implementation",
];

const PAIR_TYPES: &[&str] = &[
    "hidden_coupling",
    "dead_dependency",
    "copy_paste_clone",
    "layer_violation",
    "accidental_coupling",
    "duplicate_incomplete",
    "conway_violation",
];

const PRIMARY_FILE_TYPES: &[&str] = &["boundary_mismatch", "zone_of_pain", "directory_hotspot"];

const CODEBASE_TYPES: &[&str] = &["flat_architecture", "architecture_erosion"];

/// First 16 hex chars of SHA-256 over `finding_type|parts...`
///
/// Parts depend on the type: single-file and module findings key on the
/// first file, pair findings on the sorted first two, anything else on all
/// files sorted. Title and severity never participate, so rewording a
/// finding does not change its identity.
pub fn compute_identity_key(finding_type: &str, files: &[String]) -> String {
    let parts: Vec<&str> = if SINGLE_FILE_TYPES.contains(&finding_type)
        || PRIMARY_FILE_TYPES.contains(&finding_type)
    {
        files.first().map(String::as_str).into_iter().collect()
    } else if PAIR_TYPES.contains(&finding_type) {
        let mut pair: Vec<&str> = files.iter().take(2).map(String::as_str).collect();
        pair.sort_unstable();
        pair
    } else if CODEBASE_TYPES.contains(&finding_type) {
        vec!["codebase"]
    } else {
        let mut all: Vec<&str> = files.iter().map(String::as_str).collect();
        all.sort_unstable();
        all
    };

    let mut key = String::from(finding_type);
    for part in parts {
        key.push('|');
        key.push_str(part);
    }
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(digest)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pair_keys_ignore_order() {
        let forward = compute_identity_key("hidden_coupling", &files(&["a.py", "b.py"]));
        let backward = compute_identity_key("hidden_coupling", &files(&["b.py", "a.py"]));
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 16);
    }

    #[test]
    fn test_single_file_keys_use_first_file_only() {
        let one = compute_identity_key("god_file", &files(&["core.py"]));
        let more = compute_identity_key("god_file", &files(&["core.py", "other.py"]));
        assert_eq!(one, more);
        assert_ne!(one, compute_identity_key("orphan_code", &files(&["core.py"])));
    }

    #[test]
    fn test_unknown_types_key_on_all_sorted_files() {
        let a = compute_identity_key("custom", &files(&["z.py", "a.py", "m.py"]));
        let b = compute_identity_key("custom", &files(&["m.py", "z.py", "a.py"]));
        assert_eq!(a, b);
        assert_ne!(a, compute_identity_key("custom", &files(&["a.py", "m.py"])));
    }

    #[test]
    fn test_codebase_keys_ignore_files() {
        let empty = compute_identity_key("flat_architecture", &[]);
        assert_eq!(empty, compute_identity_key("flat_architecture", &files(&["main.py"])));
        assert_ne!(empty, compute_identity_key("architecture_erosion", &[]));
    }
}
