// The baseline: one pinned snapshot that diffs compare against

use super::*;
use anyhow::Result;
use rusqlite::{params, OptionalExtension};

use crate::error::ShannonError;

impl HistoryDatabase {
    /// Pin `snapshot_id` as the baseline, replacing any previous one
    pub fn set_baseline(&mut self, snapshot_id: i64) -> Result<()> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) FROM snapshots WHERE id = ?1",
            params![snapshot_id],
            |row| row.get::<_, i64>(0).map(|n| n > 0),
        )?;
        if !exists {
            return Err(ShannonError::SnapshotNotFound(snapshot_id).into());
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO baseline (id, snapshot_id) VALUES (1, ?1)",
            params![snapshot_id],
        )?;
        info!("📌 Baseline set to snapshot #{}", snapshot_id);
        Ok(())
    }

    pub fn get_baseline(&self) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT snapshot_id FROM baseline WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(id)
    }
}
