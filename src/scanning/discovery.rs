//! Candidate file discovery

use anyhow::{anyhow, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::AnalysisConfig;
use crate::language::detect_language;

/// Compile exclude patterns; an invalid glob is skipped with a warning
pub fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(&pattern.replace('\\', "/")) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!("Invalid exclude pattern '{}': {}", pattern, e),
        }
    }
    builder
        .build()
        .map_err(|e| anyhow!("Failed to compile exclude patterns: {}", e))
}

/// Repository-relative path with forward slashes
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Walk `root` and return every analyzable source file, sorted.
///
/// Honours hidden-file and symlink settings, exclude globs, supported
/// extensions and the size limit. Truncates to `max_files`.
pub fn discover_files(root: &Path, config: &AnalysisConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(anyhow!("Not a directory: {}", root.display()));
    }

    let excludes = build_exclude_set(&config.exclude_patterns)?;
    let max_size = config.max_file_size_bytes();
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(config.follow_symlinks)
        .into_iter()
        .filter_entry(|e| {
            if !config.allow_hidden_files && is_hidden(e) {
                return false;
            }
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            // Prune directories whose contents would all be excluded
            let probe = format!("{}/_", relative_path(root, e.path()));
            !excludes.is_match(&probe)
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if detect_language(path).is_none() {
            continue;
        }
        if excludes.is_match(relative_path(root, path)) {
            continue;
        }

        match entry.metadata() {
            Ok(meta) if meta.len() > max_size => {
                debug!(
                    "Skipping {} ({} bytes over limit)",
                    path.display(),
                    meta.len() - max_size
                );
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    if files.len() > config.max_files {
        warn!(
            "Found {} files, analyzing only the first {} (max_files)",
            files.len(),
            config.max_files
        );
        files.truncate(config.max_files);
    }

    debug!("Discovered {} source files under {}", files.len(), root.display());
    Ok(files)
}
