pub mod project;
pub mod tempdir;

// Re-export the unique_temp_dir function for easy access
pub use project::{commit_all, fixture_path, git_available, init_repo, write_file};
pub use tempdir::unique_temp_dir;
