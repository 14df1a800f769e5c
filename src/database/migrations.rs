// Schema migration system for history database versioning

use super::*;
use anyhow::{anyhow, Result};
use rusqlite::params;
use tracing::{debug, info, warn};

/// Current schema version - increment when adding migrations
pub const LATEST_SCHEMA_VERSION: i32 = 2;

impl HistoryDatabase {
    // ============================================================
    // SCHEMA MIGRATION SYSTEM
    // ============================================================

    /// Run all pending schema migrations
    pub(super) fn run_migrations(&mut self) -> Result<()> {
        self.create_schema_version_table()?;

        let current_version = self.get_schema_version()?;
        let target_version = LATEST_SCHEMA_VERSION;

        if current_version >= target_version {
            debug!(
                "History schema is up-to-date at version {}",
                current_version
            );
            return Ok(());
        }

        info!(
            "Running history migrations: version {} -> {}",
            current_version, target_version
        );

        for version in (current_version + 1)..=target_version {
            debug!("Applying migration to version {}", version);
            self.apply_migration(version)?;
            self.record_migration(version)?;
        }

        Ok(())
    }

    fn create_schema_version_table(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL,
                description TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Get the current schema version
    pub fn get_schema_version(&self) -> Result<i32> {
        let table_exists = self.table_exists("schema_version")?;
        if !table_exists {
            return Ok(0);
        }

        let version: Result<i32, rusqlite::Error> = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        Ok(version.unwrap_or(0))
    }

    fn apply_migration(&mut self, version: i32) -> Result<()> {
        match version {
            1 => self.migration_001_initial_schema()?,
            2 => self.migration_002_add_finding_scope()?,
            _ => return Err(anyhow!("Unknown migration version: {}", version)),
        }
        Ok(())
    }

    fn record_migration(&self, version: i32) -> Result<()> {
        let description = match version {
            1 => "Initial schema",
            2 => "Add scope column to findings",
            _ => "Unknown migration",
        };

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version, applied_at, description)
             VALUES (?, ?, ?)",
            params![version, chrono::Utc::now().timestamp(), description],
        )?;

        Ok(())
    }

    pub(super) fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Helper: Check if a column exists in a table
    pub fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", table))?;

        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(columns.iter().any(|c| c == column))
    }

    // ============================================================
    // INDIVIDUAL MIGRATIONS
    // ============================================================

    /// Migration 001: Initial schema, created by initialize_schema
    fn migration_001_initial_schema(&self) -> Result<()> {
        Ok(())
    }

    /// Migration 002: findings gained a scope so module-level findings
    /// can be told apart from file findings on reload
    fn migration_002_add_finding_scope(&mut self) -> Result<()> {
        if !self.table_exists("findings")? {
            debug!("Findings table doesn't exist yet (fresh database), skipping migration");
            return Ok(());
        }
        if self.has_column("findings", "scope")? {
            warn!("scope column already exists in findings, skipping migration");
            return Ok(());
        }

        self.conn.execute(
            "ALTER TABLE findings ADD COLUMN scope TEXT NOT NULL DEFAULT 'FILE'",
            [],
        )?;
        info!("✅ scope column added to findings table");
        Ok(())
    }
}
