//! Building throwaway projects (and git histories) on disk

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// `fixtures/samples/<name>` in the crate root
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("samples")
        .join(name)
}

/// Write `content` to `root/rel`, creating parent directories
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, content).expect("Failed to write test file");
}

/// Tests that need a history skip themselves when git is missing
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn git(root: &Path, args: &[&str], envs: &[(&str, String)]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .envs(envs.iter().map(|(k, v)| (*k, v.as_str())))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("Failed to run git");
    assert!(status.success(), "git {:?} failed", args);
}

pub fn init_repo(root: &Path) {
    git(root, &["init", "-q"], &[]);
    git(root, &["config", "user.name", "Test"], &[]);
    git(root, &["config", "user.email", "test@example.com"], &[]);
    git(root, &["config", "commit.gpgsign", "false"], &[]);
}

/// Stage everything and commit as `author` at `timestamp` (unix seconds)
pub fn commit_all(root: &Path, message: &str, author: &str, timestamp: i64) {
    let date = format!("{timestamp} +0000");
    let envs = [
        ("GIT_AUTHOR_NAME", author.to_string()),
        ("GIT_AUTHOR_EMAIL", format!("{author}@example.com")),
        ("GIT_AUTHOR_DATE", date.clone()),
        ("GIT_COMMITTER_DATE", date),
    ];
    git(root, &["add", "-A"], &[]);
    git(root, &["commit", "-q", "--allow-empty", "-m", message], &envs);
}
