/// Test helper for creating unique temporary directories
///
/// Prevents parallel test conflicts by ensuring each test gets a unique temp directory
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Create a uniquely named temporary directory for parallel test execution
///
/// Each invocation gets a unique counter-based directory name, so two tests
/// analyzing "the same" project never share a `.shannon/` history.
pub fn unique_temp_dir(test_name: &str) -> TempDir {
    let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_name = format!("shannon_test_{}_{}", test_name, counter);

    tempfile::Builder::new()
        .prefix(&unique_name)
        .tempdir()
        .expect("Failed to create unique temp directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_unique_temp_dirs_are_different() {
        let dirs: Vec<TempDir> = (0..3).map(|_| unique_temp_dir("test")).collect();
        let paths: HashSet<_> = dirs.iter().map(|d| d.path().to_path_buf()).collect();
        assert_eq!(paths.len(), 3, "All temp dirs should be unique");
    }

    #[test]
    fn test_unique_temp_dir_names_contain_test_name() {
        let dir = unique_temp_dir("my_awesome_test");
        let path_str = dir.path().to_string_lossy();
        assert!(path_str.contains("shannon_test_my_awesome_test_"));
    }
}
