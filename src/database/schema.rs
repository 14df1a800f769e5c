// History schema initialization and table creation

use super::*;
use anyhow::Result;
use tracing::debug;

impl HistoryDatabase {
    /// Initialize the complete database schema
    pub(super) fn initialize_schema(&mut self) -> Result<()> {
        debug!("Creating history schema");

        // Signal rows cascade away with their snapshot
        self.conn.execute("PRAGMA foreign_keys = ON", [])?;

        self.create_snapshots_table()?;
        self.create_signal_tables()?;
        self.create_findings_table()?;
        self.create_dependency_edges_table()?;
        self.create_baseline_table()?;

        debug!("History schema created successfully");
        Ok(())
    }

    fn create_snapshots_table(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                schema_version INTEGER NOT NULL,
                tool_version TEXT NOT NULL,
                commit_sha TEXT,
                timestamp TEXT NOT NULL,
                analyzed_path TEXT NOT NULL,
                file_count INTEGER NOT NULL DEFAULT 0,
                module_count INTEGER NOT NULL DEFAULT 0,
                commits_analyzed INTEGER NOT NULL DEFAULT 0,
                analyzers_ran TEXT NOT NULL DEFAULT '[]',
                config_hash TEXT NOT NULL DEFAULT ''
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_snapshots_timestamp ON snapshots(timestamp)",
            [],
        )?;

        debug!("Created snapshots table and indexes");
        Ok(())
    }

    fn create_signal_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS file_signals (
                snapshot_id INTEGER NOT NULL REFERENCES snapshots(id) ON DELETE CASCADE,
                file_path TEXT NOT NULL,
                signal_name TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (snapshot_id, file_path, signal_name)
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_file_signals_path ON file_signals(file_path, signal_name)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS module_signals (
                snapshot_id INTEGER NOT NULL REFERENCES snapshots(id) ON DELETE CASCADE,
                module_path TEXT NOT NULL,
                signal_name TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (snapshot_id, module_path, signal_name)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS codebase_signals (
                snapshot_id INTEGER NOT NULL REFERENCES snapshots(id) ON DELETE CASCADE,
                signal_name TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (snapshot_id, signal_name)
            )",
            [],
        )?;

        debug!("Created signal tables");
        Ok(())
    }

    fn create_findings_table(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS findings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snapshot_id INTEGER NOT NULL REFERENCES snapshots(id) ON DELETE CASCADE,
                finding_type TEXT NOT NULL,
                identity_key TEXT NOT NULL,
                severity REAL NOT NULL,
                title TEXT NOT NULL,
                files TEXT NOT NULL,
                evidence TEXT NOT NULL,
                suggestion TEXT NOT NULL,
                confidence REAL NOT NULL DEFAULT 1.0,
                effort TEXT NOT NULL DEFAULT 'MEDIUM',
                scope TEXT NOT NULL DEFAULT 'FILE'
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_findings_snapshot ON findings(snapshot_id)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_findings_identity ON findings(identity_key)",
            [],
        )?;

        debug!("Created findings table and indexes");
        Ok(())
    }

    fn create_dependency_edges_table(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS dependency_edges (
                snapshot_id INTEGER NOT NULL REFERENCES snapshots(id) ON DELETE CASCADE,
                src TEXT NOT NULL,
                dst TEXT NOT NULL,
                PRIMARY KEY (snapshot_id, src, dst)
            )",
            [],
        )?;
        Ok(())
    }

    fn create_baseline_table(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS baseline (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                snapshot_id INTEGER NOT NULL REFERENCES snapshots(id) ON DELETE CASCADE
            )",
            [],
        )?;
        Ok(())
    }
}
