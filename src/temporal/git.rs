//! Git log extraction

use anyhow::{anyhow, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::models::{Commit, GitHistory};
use crate::error::ShannonError;

/// Output beyond this is dropped and the log is parsed as far as it got
const MAX_OUTPUT_BYTES: u64 = 50 * 1024 * 1024;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}\|\d+\|[^|]+\|.*$").unwrap());

pub struct GitExtractor {
    repo: PathBuf,
    max_commits: usize,
}

impl GitExtractor {
    pub fn new(repo: impl AsRef<Path>, max_commits: usize) -> Self {
        let repo = repo.as_ref();
        let repo = repo.canonicalize().unwrap_or_else(|_| repo.to_path_buf());
        Self { repo, max_commits }
    }

    pub fn is_git_repo(&self) -> bool {
        Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(["rev-parse", "--git-dir"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// SHA of HEAD, `None` outside a repository or before the first commit
    pub fn head_commit(&self) -> Option<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(["rev-parse", "HEAD"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!sha.is_empty()).then_some(sha)
    }

    /// History of the repository, paths relative to the extractor's root.
    ///
    /// Returns `Ok(None)` when the log has no commits touching files.
    pub fn extract(&self) -> Result<Option<GitHistory>> {
        if !self.is_git_repo() {
            return Err(ShannonError::NotGitRepository(self.repo.display().to_string()).into());
        }

        let raw = self.run_git_log()?;
        let commits = parse_log(&raw);
        if commits.is_empty() {
            return Ok(None);
        }

        let file_set: BTreeSet<String> = commits
            .iter()
            .flat_map(|c| c.files.iter().cloned())
            .collect();

        let span_days = if commits.len() >= 2 {
            let newest = commits[0].timestamp;
            let oldest = commits[commits.len() - 1].timestamp;
            ((newest - oldest) / 86_400).max(1)
        } else {
            0
        };

        debug!(
            "Parsed {} commits touching {} files over {} days",
            commits.len(),
            file_set.len(),
            span_days
        );
        Ok(Some(GitHistory {
            commits,
            file_set,
            span_days,
        }))
    }

    fn run_git_log(&self) -> Result<String> {
        let limit = format!("-n{}", self.max_commits);
        let mut child = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args([
                "log",
                "--format=%H|%at|%ae|%s",
                "--name-only",
                "--relative",
                limit.as_str(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ShannonError::GitCommand(format!("failed to run git: {}", e)))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("git log stdout was not captured"))?;
        let mut buffer = Vec::new();
        (&mut stdout)
            .take(MAX_OUTPUT_BYTES + 1)
            .read_to_end(&mut buffer)?;

        let truncated = buffer.len() as u64 > MAX_OUTPUT_BYTES;
        if truncated {
            warn!(
                "git log output exceeded {}MB, truncating",
                MAX_OUTPUT_BYTES / (1024 * 1024)
            );
            buffer.truncate(MAX_OUTPUT_BYTES as usize);
            let _ = child.kill();
        }
        drop(stdout);

        let output = child.wait_with_output()?;
        if !truncated && !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ShannonError::GitCommand(stderr.trim().to_string()).into());
        }
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Parse `%H|%at|%ae|%s` headers, each followed by changed file names.
///
/// Headers are recognised by shape, so merge commits without files and
/// missing blank lines are handled. Commits with no files are dropped.
pub fn parse_log(raw: &str) -> Vec<Commit> {
    let mut commits = Vec::new();
    let mut current: Option<Commit> = None;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if HEADER_RE.is_match(line) {
            if let Some(commit) = current.take() {
                if !commit.files.is_empty() {
                    commits.push(commit);
                }
            }
            let parts: Vec<&str> = line.splitn(4, '|').collect();
            let Ok(timestamp) = parts[1].parse::<i64>() else {
                continue;
            };
            current = Some(Commit {
                hash: parts[0].to_string(),
                timestamp,
                author: parts[2].to_string(),
                subject: parts.get(3).map(|s| s.to_string()).unwrap_or_default(),
                files: Vec::new(),
            });
        } else if let Some(commit) = current.as_mut() {
            commit.files.push(line.to_string());
        }
    }
    if let Some(commit) = current {
        if !commit.files.is_empty() {
            commits.push(commit);
        }
    }
    commits
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const HASH_M: &str = "cccccccccccccccccccccccccccccccccccccccc";

    #[test]
    fn test_parse_log_handles_merges_and_pipes_in_subjects() {
        let raw = format!(
            "{HASH_A}|1700000000|dev@example.com|fix auth | update deps\n\nsrc/auth.py\nsrc/deps.py\n\
             {HASH_M}|1699990000|dev@example.com|Merge branch 'x'\n\
             {HASH_B}|1699900000|ops@example.com|initial\n\nREADME.md\n"
        );
        let commits = parse_log(&raw);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].subject, "fix auth | update deps");
        assert_eq!(commits[0].files, vec!["src/auth.py", "src/deps.py"]);
        assert_eq!(commits[1].author, "ops@example.com");
    }

    #[test]
    fn test_lines_before_first_header_are_ignored() {
        let raw = format!("stray.txt\n{HASH_A}|1|a@b.c|msg\nfile.rs\n");
        let commits = parse_log(&raw);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].files, vec!["file.rs"]);
    }
}
