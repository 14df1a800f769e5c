// Snapshot persistence: save, load, list, series, prune

use super::*;
use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ShannonError;
use crate::insights::{Effort, Evidence, Finding, Scope};

const SNAPSHOT_COLUMNS: &str = "id, schema_version, tool_version, commit_sha, timestamp, \
     analyzed_path, file_count, module_count, commits_analyzed, analyzers_ran, config_hash";

fn row_to_meta(row: &Row) -> rusqlite::Result<SnapshotMeta> {
    let analyzers: String = row.get(9)?;
    Ok(SnapshotMeta {
        id: row.get(0)?,
        schema_version: row.get(1)?,
        tool_version: row.get(2)?,
        commit_sha: row.get(3)?,
        timestamp: row.get(4)?,
        analyzed_path: row.get(5)?,
        file_count: row.get::<_, i64>(6)? as usize,
        module_count: row.get::<_, i64>(7)? as usize,
        commits_analyzed: row.get::<_, i64>(8)? as usize,
        analyzers_ran: serde_json::from_str(&analyzers).unwrap_or_default(),
        config_hash: row.get(10)?,
    })
}

impl HistoryDatabase {
    /// Persist a snapshot in one transaction, returning its new id
    pub fn save_snapshot(&mut self, snapshot: &Snapshot) -> Result<i64> {
        let meta = &snapshot.meta;
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO snapshots (schema_version, tool_version, commit_sha, timestamp,
                analyzed_path, file_count, module_count, commits_analyzed, analyzers_ran, config_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                meta.schema_version,
                meta.tool_version,
                meta.commit_sha,
                meta.timestamp,
                meta.analyzed_path,
                meta.file_count as i64,
                meta.module_count as i64,
                meta.commits_analyzed as i64,
                serde_json::to_string(&meta.analyzers_ran)?,
                meta.config_hash,
            ],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO file_signals (snapshot_id, file_path, signal_name, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (path, signals) in &snapshot.file_signals {
                for (name, value) in signals {
                    stmt.execute(params![id, path, name, value])?;
                }
            }

            let mut stmt = tx.prepare(
                "INSERT INTO module_signals (snapshot_id, module_path, signal_name, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (path, signals) in &snapshot.module_signals {
                for (name, value) in signals {
                    stmt.execute(params![id, path, name, value])?;
                }
            }

            let mut stmt = tx.prepare(
                "INSERT INTO codebase_signals (snapshot_id, signal_name, value) VALUES (?1, ?2, ?3)",
            )?;
            for (name, value) in &snapshot.codebase_signals {
                stmt.execute(params![id, name, value])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO findings (snapshot_id, finding_type, identity_key, severity, title,
                    files, evidence, suggestion, confidence, effort, scope)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for finding in &snapshot.findings {
                stmt.execute(params![
                    id,
                    finding.finding_type,
                    finding.identity_key(),
                    finding.severity,
                    finding.title,
                    serde_json::to_string(&finding.files)?,
                    serde_json::to_string(&finding.evidence)?,
                    finding.suggestion,
                    finding.confidence,
                    finding.effort.as_str(),
                    finding.scope.as_str(),
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO dependency_edges (snapshot_id, src, dst) VALUES (?1, ?2, ?3)",
            )?;
            for (src, dst) in &snapshot.dependency_edges {
                stmt.execute(params![id, src, dst])?;
            }
        }

        tx.commit()?;
        info!(
            "💾 Saved snapshot #{} ({} files, {} findings)",
            id,
            snapshot.file_signals.len(),
            snapshot.findings.len()
        );
        Ok(id)
    }

    /// Newest first
    pub fn list_snapshots(&self, limit: usize) -> Result<Vec<SnapshotMeta>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM snapshots ORDER BY id DESC LIMIT ?1"
        ))?;
        let metas = stmt
            .query_map(params![limit as i64], row_to_meta)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(metas)
    }

    pub fn latest_snapshot_id(&self) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT MAX(id) FROM snapshots", [], |row| {
                row.get::<_, Option<i64>>(0)
            })?;
        Ok(id)
    }

    pub fn load_snapshot(&self, id: i64) -> Result<Snapshot> {
        let meta = self
            .conn
            .query_row(
                &format!("SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE id = ?1"),
                params![id],
                row_to_meta,
            )
            .optional()?
            .ok_or(ShannonError::SnapshotNotFound(id))?;

        let file_signals = self.load_keyed_signals(
            "SELECT file_path, signal_name, value FROM file_signals WHERE snapshot_id = ?1",
            id,
        )?;
        let module_signals = self.load_keyed_signals(
            "SELECT module_path, signal_name, value FROM module_signals WHERE snapshot_id = ?1",
            id,
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT signal_name, value FROM codebase_signals WHERE snapshot_id = ?1")?;
        let codebase_signals = stmt
            .query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<BTreeMap<String, f64>, _>>()?;

        let findings = self.load_findings(id)?;

        let mut stmt = self.conn.prepare(
            "SELECT src, dst FROM dependency_edges WHERE snapshot_id = ?1 ORDER BY src, dst",
        )?;
        let dependency_edges = stmt
            .query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, String)>, _>>()?;

        Ok(Snapshot {
            meta,
            file_signals,
            module_signals,
            codebase_signals,
            findings,
            dependency_edges,
        })
    }

    fn load_keyed_signals(&self, sql: &str, id: i64) -> Result<BTreeMap<String, SignalMap>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut out: BTreeMap<String, SignalMap> = BTreeMap::new();
        for row in rows {
            let (key, name, value) = row?;
            out.entry(key).or_default().insert(name, value);
        }
        Ok(out)
    }

    fn load_findings(&self, id: i64) -> Result<Vec<Finding>> {
        let mut stmt = self.conn.prepare(
            "SELECT finding_type, severity, title, files, evidence, suggestion,
                    confidence, effort, scope
             FROM findings WHERE snapshot_id = ?1 ORDER BY severity DESC, title",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut findings = Vec::new();
        for row in rows {
            let (finding_type, severity, title, files, evidence, suggestion, confidence, effort, scope) =
                row?;
            let files: Vec<String> = serde_json::from_str(&files)?;
            let evidence: Vec<Evidence> = serde_json::from_str(&evidence)?;
            findings.push(Finding {
                finding_type,
                severity,
                title,
                files,
                evidence,
                suggestion,
                confidence,
                effort: Effort::parse(&effort).unwrap_or(Effort::Medium),
                scope: Scope::parse(&scope).unwrap_or(Scope::File),
            });
        }
        Ok(findings)
    }

    /// Findings of the latest snapshot, longest-running first
    pub fn persistent_findings(&self) -> Result<Vec<PersistentFinding>> {
        let mut stmt = self.conn.prepare("SELECT id FROM snapshots ORDER BY id DESC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let Some((&latest, older)) = ids.split_first() else {
            return Ok(Vec::new());
        };

        let mut persistent: BTreeMap<String, PersistentFinding> = self
            .load_findings(latest)?
            .into_iter()
            .map(|f| {
                let key = f.identity_key();
                let entry = PersistentFinding {
                    identity_key: key.clone(),
                    finding_type: f.finding_type,
                    title: f.title,
                    files: f.files,
                    consecutive_runs: 1,
                };
                (key, entry)
            })
            .collect();

        let mut running: BTreeSet<String> = persistent.keys().cloned().collect();
        for &id in older {
            if running.is_empty() {
                break;
            }
            let keys = self.identity_keys(id)?;
            running.retain(|key| keys.contains(key));
            for key in &running {
                if let Some(entry) = persistent.get_mut(key) {
                    entry.consecutive_runs += 1;
                }
            }
        }

        let mut out: Vec<PersistentFinding> = persistent.into_values().collect();
        out.sort_by(|a, b| {
            b.consecutive_runs
                .cmp(&a.consecutive_runs)
                .then_with(|| a.identity_key.cmp(&b.identity_key))
        });
        Ok(out)
    }

    fn identity_keys(&self, id: i64) -> Result<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT identity_key FROM findings WHERE snapshot_id = ?1")?;
        let keys = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(keys)
    }

    /// Oldest first
    pub fn file_signal_series(&self, file_path: &str, signal: &str) -> Result<Vec<SeriesPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.timestamp, f.value
             FROM file_signals f JOIN snapshots s ON s.id = f.snapshot_id
             WHERE f.file_path = ?1 AND f.signal_name = ?2
             ORDER BY s.id",
        )?;
        let points = stmt
            .query_map(params![file_path, signal], row_to_point)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// Oldest first
    pub fn codebase_signal_series(&self, signal: &str) -> Result<Vec<SeriesPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.timestamp, c.value
             FROM codebase_signals c JOIN snapshots s ON s.id = c.snapshot_id
             WHERE c.signal_name = ?1
             ORDER BY s.id",
        )?;
        let points = stmt
            .query_map(params![signal], row_to_point)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// Keep the newest `max_snapshots`, plus the baseline wherever it falls.
    /// Returns how many snapshots were deleted.
    pub fn prune(&mut self, max_snapshots: usize) -> Result<usize> {
        let baseline = self.get_baseline()?;
        let deleted = self.conn.execute(
            "DELETE FROM snapshots
             WHERE id NOT IN (SELECT id FROM snapshots ORDER BY id DESC LIMIT ?1)
               AND id IS NOT ?2",
            params![max_snapshots as i64, baseline],
        )?;
        if deleted > 0 {
            debug!("Pruned {} old snapshots", deleted);
        }
        Ok(deleted)
    }
}

fn row_to_point(row: &Row) -> rusqlite::Result<SeriesPoint> {
    Ok(SeriesPoint {
        snapshot_id: row.get(0)?,
        timestamp: row.get(1)?,
        value: row.get(2)?,
    })
}
