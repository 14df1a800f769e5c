use thiserror::Error;

/// Domain failures that callers may want to match on.
///
/// Everything else travels as `anyhow::Error`.
#[derive(Debug, Error)]
pub enum ShannonError {
    #[error("Invalid configuration: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Not a git repository: {0}")]
    NotGitRepository(String),

    #[error("Git command failed: {0}")]
    GitCommand(String),

    #[error("Cannot compute {0} of an empty sequence")]
    EmptyInput(&'static str),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(i64),

    #[error("History is disabled (enable_history = false)")]
    HistoryDisabled,

    #[error("No baseline snapshot has been set")]
    NoBaseline,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShannonError>;
