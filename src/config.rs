//! Analysis configuration
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `shannon-insight.toml` in the analyzed root, or an explicit file
//! 3. `SHANNON_*` environment variables
//! 4. CLI flags (applied by the binary)

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ShannonError;

/// File name looked up in the analyzed root
pub const CONFIG_FILE_NAME: &str = "shannon-insight.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    // Graph
    pub pagerank_damping: f64,
    pub pagerank_iterations: usize,
    pub pagerank_tolerance: f64,

    // File filtering
    pub exclude_patterns: Vec<String>,
    pub max_file_size_mb: f64,
    pub max_files: usize,
    pub allow_hidden_files: bool,
    pub follow_symlinks: bool,

    // Performance
    pub parallel_workers: Option<usize>,

    // Temporal
    pub git_max_commits: usize,
    pub git_min_commits: usize,

    // Insights
    pub insights_max_findings: usize,

    // History
    pub enable_history: bool,
    pub history_max_snapshots: usize,

    // Logging
    pub verbose: bool,
    pub quiet: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pagerank_damping: 0.85,
            pagerank_iterations: 20,
            pagerank_tolerance: 1e-6,
            exclude_patterns: default_exclude_patterns(),
            max_file_size_mb: 10.0,
            max_files: 10_000,
            allow_hidden_files: false,
            follow_symlinks: false,
            parallel_workers: None,
            git_max_commits: 5000,
            git_min_commits: 10,
            insights_max_findings: 50,
            enable_history: true,
            history_max_snapshots: 100,
            verbose: false,
            quiet: false,
            log_file: None,
        }
    }
}

fn default_exclude_patterns() -> Vec<String> {
    [
        "**/*_test.go",
        "**/*_test.ts",
        "**/*.test.ts",
        "**/*.spec.ts",
        "**/vendor/**",
        "**/node_modules/**",
        "**/dist/**",
        "**/build/**",
        "**/target/**",
        "**/.git/**",
        "**/venv/**",
        "**/.venv/**",
        "**/__pycache__/**",
        "**/.tox/**",
        "**/.mypy_cache/**",
        "**/.pytest_cache/**",
        "**/.ruff_cache/**",
        "**/htmlcov/**",
        "**/coverage/**",
        "**/*.egg-info/**",
        "**/*.min.js",
        "**/*.bundle.js",
        "**/*.generated.*",
        "**/.shannon/**",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl AnalysisConfig {
    /// Load configuration for an analysis root.
    ///
    /// `explicit` takes precedence over `<root>/shannon-insight.toml`.
    /// A missing file is not an error; a malformed one is.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let candidate = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("Config file not found: {}", path.display()));
                }
                Some(path.to_path_buf())
            }
            None => {
                let local = root.join(CONFIG_FILE_NAME);
                local.exists().then_some(local)
            }
        };

        let mut config = match candidate {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: AnalysisConfig = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;
        debug!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Apply `SHANNON_<FIELD>` overrides.
    ///
    /// The lookup is injected so tests do not have to mutate the process
    /// environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
            raw.trim()
                .parse::<T>()
                .map_err(|_| anyhow!("Invalid value for {}: {:?}", key, raw))
        }

        fn parse_bool(key: &str, raw: &str) -> Result<bool> {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(anyhow!("Invalid boolean for {}: {:?}", key, raw)),
            }
        }

        if let Some(v) = lookup("SHANNON_PAGERANK_DAMPING") {
            self.pagerank_damping = parse("SHANNON_PAGERANK_DAMPING", &v)?;
        }
        if let Some(v) = lookup("SHANNON_PAGERANK_ITERATIONS") {
            self.pagerank_iterations = parse("SHANNON_PAGERANK_ITERATIONS", &v)?;
        }
        if let Some(v) = lookup("SHANNON_PAGERANK_TOLERANCE") {
            self.pagerank_tolerance = parse("SHANNON_PAGERANK_TOLERANCE", &v)?;
        }
        if let Some(v) = lookup("SHANNON_EXCLUDE_PATTERNS") {
            self.exclude_patterns = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("SHANNON_MAX_FILE_SIZE_MB") {
            self.max_file_size_mb = parse("SHANNON_MAX_FILE_SIZE_MB", &v)?;
        }
        if let Some(v) = lookup("SHANNON_MAX_FILES") {
            self.max_files = parse("SHANNON_MAX_FILES", &v)?;
        }
        if let Some(v) = lookup("SHANNON_ALLOW_HIDDEN_FILES") {
            self.allow_hidden_files = parse_bool("SHANNON_ALLOW_HIDDEN_FILES", &v)?;
        }
        if let Some(v) = lookup("SHANNON_FOLLOW_SYMLINKS") {
            self.follow_symlinks = parse_bool("SHANNON_FOLLOW_SYMLINKS", &v)?;
        }
        if let Some(v) = lookup("SHANNON_PARALLEL_WORKERS") {
            self.parallel_workers = Some(parse("SHANNON_PARALLEL_WORKERS", &v)?);
        }
        if let Some(v) = lookup("SHANNON_GIT_MAX_COMMITS") {
            self.git_max_commits = parse("SHANNON_GIT_MAX_COMMITS", &v)?;
        }
        if let Some(v) = lookup("SHANNON_GIT_MIN_COMMITS") {
            self.git_min_commits = parse("SHANNON_GIT_MIN_COMMITS", &v)?;
        }
        if let Some(v) = lookup("SHANNON_INSIGHTS_MAX_FINDINGS") {
            self.insights_max_findings = parse("SHANNON_INSIGHTS_MAX_FINDINGS", &v)?;
        }
        if let Some(v) = lookup("SHANNON_ENABLE_HISTORY") {
            self.enable_history = parse_bool("SHANNON_ENABLE_HISTORY", &v)?;
        }
        if let Some(v) = lookup("SHANNON_HISTORY_MAX_SNAPSHOTS") {
            self.history_max_snapshots = parse("SHANNON_HISTORY_MAX_SNAPSHOTS", &v)?;
        }
        if let Some(v) = lookup("SHANNON_VERBOSE") {
            self.verbose = parse_bool("SHANNON_VERBOSE", &v)?;
        }
        if let Some(v) = lookup("SHANNON_QUIET") {
            self.quiet = parse_bool("SHANNON_QUIET", &v)?;
        }
        if let Some(v) = lookup("SHANNON_LOG_FILE") {
            self.log_file = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Reject values the analysis cannot work with
    pub fn validate(&self) -> std::result::Result<(), ShannonError> {
        if !(self.pagerank_damping > 0.0 && self.pagerank_damping < 1.0) {
            return Err(ShannonError::InvalidConfig {
                field: "pagerank_damping",
                value: self.pagerank_damping.to_string(),
                reason: "must be in (0, 1)",
            });
        }
        if self.pagerank_iterations == 0 {
            return Err(ShannonError::InvalidConfig {
                field: "pagerank_iterations",
                value: "0".into(),
                reason: "must be positive",
            });
        }
        if self.pagerank_tolerance <= 0.0 {
            return Err(ShannonError::InvalidConfig {
                field: "pagerank_tolerance",
                value: self.pagerank_tolerance.to_string(),
                reason: "must be positive",
            });
        }
        if self.max_file_size_mb <= 0.0 {
            return Err(ShannonError::InvalidConfig {
                field: "max_file_size_mb",
                value: self.max_file_size_mb.to_string(),
                reason: "must be positive",
            });
        }
        if self.max_files == 0 {
            return Err(ShannonError::InvalidConfig {
                field: "max_files",
                value: "0".into(),
                reason: "must be positive",
            });
        }
        if self.insights_max_findings == 0 {
            return Err(ShannonError::InvalidConfig {
                field: "insights_max_findings",
                value: "0".into(),
                reason: "must be positive",
            });
        }
        if self.verbose && self.quiet {
            warn!("Both verbose and quiet requested; quiet wins");
        }
        Ok(())
    }

    /// Worker count for the scanning pool
    pub fn workers(&self) -> usize {
        self.parallel_workers
            .filter(|&n| n > 0)
            .unwrap_or_else(num_cpus::get)
    }

    /// Maximum file size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        (self.max_file_size_mb * 1024.0 * 1024.0) as u64
    }

    /// Stable fingerprint of the settings that influence results.
    ///
    /// Logging options are excluded so `--verbose` does not change it.
    pub fn config_hash(&self) -> String {
        let mut hashed = self.clone();
        hashed.verbose = false;
        hashed.quiet = false;
        hashed.log_file = None;
        let serialized = serde_json::to_string(&hashed).unwrap_or_default();
        let digest = Sha256::digest(serialized.as_bytes());
        hex::encode(digest)[..16].to_string()
    }
}
