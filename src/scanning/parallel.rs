/// Parallel scanning of a discovered file list
///
/// Uses Rayon with a dedicated pool so repeated analyses (and tests) do not
/// fight over the global pool. Each file goes through tree-sitter first and
/// drops to the regex scanner when tree-sitter cannot produce a result.
use anyhow::{anyhow, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use super::discovery::relative_path;
use super::fallback::FallbackScanner;
use super::models::{FileSyntax, ScanStats};
use super::treesitter::TreeSitterScanner;
use crate::language::detect_language;

/// Fallback share above which the scan is reported as degraded
const FALLBACK_WARN_RATE: f64 = 0.2;

/// Configuration for parallel scanning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Number of worker threads (defaults to CPU count)
    pub num_threads: usize,

    /// Files handed to the pool per chunk; progress is reported per chunk
    pub batch_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            batch_size: 64,
        }
    }
}

/// Output of a scan: syntax per file, raw contents for byte-level metrics
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Sorted by path
    pub files: Vec<FileSyntax>,
    /// Path → content, for compression and clone detection
    pub contents: BTreeMap<String, String>,
    pub stats: ScanStats,
}

enum FileOutcome {
    Parsed(FileSyntax, String),
    Failed,
}

pub struct ParallelScanner {
    config: ScanConfig,
    tree_sitter: TreeSitterScanner,
    fallback: FallbackScanner,
}

impl ParallelScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            tree_sitter: TreeSitterScanner::new(),
            fallback: FallbackScanner::new(),
        }
    }

    pub fn scan_files(&self, root: &Path, files: &[PathBuf]) -> Result<ScanResult> {
        self.scan_files_with_progress(root, files, |_, _| {})
    }

    /// Scan `files` (absolute paths under `root`), reporting `(done, total)`
    /// after each chunk.
    pub fn scan_files_with_progress<F>(
        &self,
        root: &Path,
        files: &[PathBuf],
        on_progress: F,
    ) -> Result<ScanResult>
    where
        F: Fn(usize, usize) + Sync,
    {
        if files.is_empty() {
            return Ok(ScanResult::default());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads.max(1))
            .build()
            .map_err(|e| anyhow!("Failed to build thread pool: {}", e))?;

        let outcomes = Arc::new(Mutex::new(Vec::with_capacity(files.len())));
        let processed = Arc::new(Mutex::new(0usize));
        let total_files = files.len();
        let batch_size = self.config.batch_size.max(1);

        pool.install(|| {
            files.par_chunks(batch_size).for_each(|batch| {
                let batch_outcomes: Vec<FileOutcome> =
                    batch.par_iter().map(|file| self.scan_file(root, file)).collect();

                if let Ok(mut all) = outcomes.lock() {
                    all.extend(batch_outcomes);
                }

                if let Ok(mut done) = processed.lock() {
                    *done += batch.len();
                    on_progress(*done, total_files);
                }
            });
        });

        let outcomes = Arc::try_unwrap(outcomes)
            .map_err(|_| anyhow!("Failed to unwrap scan results"))?
            .into_inner()
            .map_err(|e| anyhow!("Lock error: {:?}", e))?;

        let mut result = ScanResult::default();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Parsed(syntax, content) => {
                    result.stats.scanned += 1;
                    if syntax.parsed_with_fallback {
                        result.stats.fallback += 1;
                    }
                    result.contents.insert(syntax.path.clone(), content);
                    result.files.push(syntax);
                }
                FileOutcome::Failed => result.stats.failed += 1,
            }
        }
        result.files.sort_by(|a, b| a.path.cmp(&b.path));

        if result.stats.fallback_rate() > FALLBACK_WARN_RATE {
            warn!(
                "{} of {} files needed the regex fallback; structural signals are approximate",
                result.stats.fallback, result.stats.scanned
            );
        }

        Ok(result)
    }

    fn scan_file(&self, root: &Path, file: &Path) -> FileOutcome {
        let Some(language) = detect_language(file) else {
            return FileOutcome::Failed;
        };

        let bytes = match std::fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Skipping unreadable file {}: {}", file.display(), e);
                return FileOutcome::Failed;
            }
        };
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let path = relative_path(root, file);

        let syntax = match self.tree_sitter.scan(&path, &content, language) {
            Ok(syntax) => syntax,
            Err(e) => {
                debug!("tree-sitter failed for {} ({}), using regex fallback", path, e);
                self.fallback.scan(&path, &content, language)
            }
        };
        FileOutcome::Parsed(syntax, content)
    }
}
