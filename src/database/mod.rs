//! Snapshot history - SQLite store under `.shannon/`
//!
//! Split by concern:
//! - schema / migrations: table layout and versioning
//! - snapshots: save, load, list, series, prune
//! - baseline: the pinned comparison point
//! - diff: comparing two snapshots
//! - identity: stable finding keys

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod baseline;
mod diff;
pub mod identity;
mod migrations;
mod schema;
mod snapshots;
pub mod types;

pub use diff::diff_snapshots;
pub use identity::compute_identity_key;
pub use migrations::LATEST_SCHEMA_VERSION;
pub use types::*;

/// Directory created in the analyzed root
pub const HISTORY_DIR: &str = ".shannon";
pub const HISTORY_DB_FILE: &str = "history.db";

pub struct HistoryDatabase {
    pub(crate) conn: Connection,
    pub(crate) file_path: PathBuf,
}

impl HistoryDatabase {
    /// Open (or create) `<root>/.shannon/history.db`
    ///
    /// The directory gets a `.gitignore` of `*` so history never ends up
    /// in the analyzed repository.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let dir = root.as_ref().join(HISTORY_DIR);
        fs::create_dir_all(&dir)
            .map_err(|e| anyhow!("Failed to create {}: {}", dir.display(), e))?;

        let gitignore = dir.join(".gitignore");
        if !gitignore.exists() {
            fs::write(&gitignore, "*\n")?;
            debug!("Wrote {}", gitignore.display());
        }
        Self::new(dir.join(HISTORY_DB_FILE))
    }

    /// Create a new database connection and initialize schema
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let file_path = db_path.as_ref().to_path_buf();
        debug!("Opening history database at: {}", file_path.display());

        let conn =
            Connection::open(&file_path).map_err(|e| anyhow!("Failed to open database: {}", e))?;

        // Another run may be writing; wait for the lock instead of failing
        conn.busy_timeout(std::time::Duration::from_millis(5000))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let mut db = Self { conn, file_path };
        db.run_migrations()?;
        db.initialize_schema()?;

        info!("History database ready");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_gitignored_directory() {
        let root = TempDir::new().unwrap();
        let db = HistoryDatabase::open(root.path()).unwrap();

        let dir = root.path().join(HISTORY_DIR);
        assert_eq!(fs::read_to_string(dir.join(".gitignore")).unwrap(), "*\n");
        assert!(db.path().ends_with("history.db"));
        assert_eq!(db.get_schema_version().unwrap(), LATEST_SCHEMA_VERSION);
    }
}
