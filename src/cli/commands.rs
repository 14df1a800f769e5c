/// Command implementations behind the `shannon-insight` binary
///
/// Each command takes a [`CommandContext`] and an [`OutputWriter`], so tests
/// can drive them against a temp directory and capture the report.
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use super::output::OutputWriter;
use super::progress::ProgressReporter;
use super::report::{self, FileExplanation, HealthReport, TrendReport};
use crate::analysis::{InsightAnalyzer, InsightResult};
use crate::config::AnalysisConfig;
use crate::database::HistoryDatabase;
use crate::error::ShannonError;

/// Files listed in the health report
const RISKIEST_FILES: usize = 10;
const HOTTEST_DIRECTORIES: usize = 8;

pub struct CommandContext {
    pub root: PathBuf,
    pub config: AnalysisConfig,
    pub quiet: bool,
}

impl CommandContext {
    pub fn new(root: impl Into<PathBuf>, config: AnalysisConfig) -> Self {
        let quiet = config.quiet;
        Self {
            root: root.into(),
            config,
            quiet,
        }
    }

    fn run_analysis(&self) -> Result<InsightResult> {
        let progress = Mutex::new(ProgressReporter::new(self.quiet));
        if let Ok(p) = progress.lock() {
            p.stage(&format!("Analyzing {}", self.root.display()));
        }

        let analyzer = InsightAnalyzer::new(self.root.clone(), self.config.clone());
        let result = analyzer.analyze_with_progress(|done, total| {
            if let Ok(mut p) = progress.lock() {
                p.report(done, total);
            }
        })?;

        if let Ok(p) = progress.lock() {
            p.complete(result.store_summary.total_files, result.findings.len());
        }
        Ok(result)
    }

    fn open_history(&self) -> Result<HistoryDatabase> {
        if !self.config.enable_history {
            return Err(ShannonError::HistoryDisabled.into());
        }
        HistoryDatabase::open(&self.root)
    }
}

/// Analyze, print findings, and record a snapshot unless told not to
pub fn analyze(
    ctx: &CommandContext,
    out: &mut OutputWriter,
    max_findings: Option<usize>,
    no_save: bool,
) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(max) = max_findings {
        config.insights_max_findings = max;
    }
    let ctx = CommandContext {
        root: ctx.root.clone(),
        config,
        quiet: ctx.quiet,
    };
    let result = ctx.run_analysis()?;

    if !no_save && ctx.config.enable_history {
        let mut db = ctx.open_history()?;
        let snapshot = result.to_snapshot(&ctx.root, &ctx.config.config_hash());
        let id = db.save_snapshot(&snapshot)?;
        let pruned = db.prune(ctx.config.history_max_snapshots)?;
        debug!("Snapshot #{} saved, {} pruned", id, pruned);
    }

    out.emit(&result, report::render_findings)
}

/// Normalize a user-supplied path to the analyzer's relative form
fn relative_to_root(root: &Path, file: &str) -> String {
    let root_abs = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    for candidate in [root.join(file), PathBuf::from(file)] {
        if let Ok(abs) = candidate.canonicalize() {
            if let Ok(rel) = abs.strip_prefix(&root_abs) {
                return rel.to_string_lossy().replace('\\', "/");
            }
        }
    }
    file.trim_start_matches("./").replace('\\', "/")
}

/// Signals, percentiles and findings for one file
pub fn explain(ctx: &CommandContext, out: &mut OutputWriter, file: &str) -> Result<()> {
    let result = ctx.run_analysis()?;
    let path = relative_to_root(&ctx.root, file);
    let signals = result
        .file_signals
        .get(&path)
        .cloned()
        .ok_or_else(|| anyhow!("File not found in analysis: {}", path))?;

    let explanation = FileExplanation {
        findings: result
            .findings
            .iter()
            .filter(|f| f.files.iter().any(|p| *p == path))
            .cloned()
            .collect(),
        outlier_reasons: result.outliers.get(&path).cloned().unwrap_or_default(),
        path,
        signals,
    };
    out.emit(&explanation, report::render_explanation)
}

pub fn health(ctx: &CommandContext, out: &mut OutputWriter) -> Result<()> {
    let result = ctx.run_analysis()?;

    let mut modules: Vec<_> = result.module_signals.values().cloned().collect();
    modules.sort_by(|a, b| {
        a.health_score
            .total_cmp(&b.health_score)
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut riskiest: Vec<(String, f64)> = result
        .file_signals
        .iter()
        .map(|(path, fs)| (path.clone(), fs.risk_score))
        .filter(|(_, risk)| *risk > 0.0)
        .collect();
    riskiest.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    riskiest.truncate(RISKIEST_FILES);

    let mut directories: Vec<_> = result
        .directory_signals
        .values()
        .filter(|d| d.file_count > 0)
        .cloned()
        .collect();
    directories.sort_by(|a, b| {
        b.avg_risk
            .total_cmp(&a.avg_risk)
            .then_with(|| b.hotspot_file_count.cmp(&a.hotspot_file_count))
            .then_with(|| a.path.cmp(&b.path))
    });
    directories.truncate(HOTTEST_DIRECTORIES);

    let health_report = HealthReport {
        tier: result.store_summary.tier.clone(),
        global: result.global_signals.clone(),
        modules,
        directories,
        riskiest_files: riskiest,
    };
    out.emit(&health_report, report::render_health)
}

pub fn history(ctx: &CommandContext, out: &mut OutputWriter, limit: usize) -> Result<()> {
    let db = ctx.open_history()?;
    let snapshots = db.list_snapshots(limit)?;
    out.emit(&snapshots, |s| report::render_history(s))
}

/// Compare two snapshots: explicit ids, baseline vs latest, or the latest two
pub fn diff(
    ctx: &CommandContext,
    out: &mut OutputWriter,
    against_baseline: bool,
    ids: Option<(i64, i64)>,
) -> Result<()> {
    let db = ctx.open_history()?;
    let (old_id, new_id) = match ids {
        Some(pair) => pair,
        None if against_baseline => {
            let baseline = db.get_baseline()?.ok_or(ShannonError::NoBaseline)?;
            let latest = db
                .latest_snapshot_id()?
                .ok_or_else(|| anyhow!("No snapshots recorded yet"))?;
            (baseline, latest)
        }
        None => {
            let recent = db.list_snapshots(2)?;
            match recent.as_slice() {
                [newest, previous] => (previous.id, newest.id),
                _ => return Err(anyhow!("Need at least two snapshots to diff")),
            }
        }
    };

    let diff = db.diff(old_id, new_id)?;
    out.emit(&diff, report::render_diff)
}

pub fn trend(
    ctx: &CommandContext,
    out: &mut OutputWriter,
    signal: &str,
    file: Option<&str>,
) -> Result<()> {
    let db = ctx.open_history()?;
    let file = file.map(|f| relative_to_root(&ctx.root, f));
    let points = match &file {
        Some(path) => db.file_signal_series(path, signal)?,
        None => db.codebase_signal_series(signal)?,
    };
    let trend_report = TrendReport {
        signal: signal.to_string(),
        file,
        points,
    };
    out.emit(&trend_report, report::render_trend)
}

/// Pin a snapshot (the latest by default) as the diff baseline
pub fn baseline_set(ctx: &CommandContext, out: &mut OutputWriter, id: Option<i64>) -> Result<()> {
    let mut db = ctx.open_history()?;
    let id = match id {
        Some(id) => id,
        None => db
            .latest_snapshot_id()?
            .ok_or_else(|| anyhow!("No snapshots recorded yet"))?,
    };
    db.set_baseline(id)?;
    info!("Baseline is now snapshot #{}", id);
    out.emit(&serde_json::json!({ "baseline": id }), |_| {
        format!("Baseline set to snapshot #{id}")
    })
}
