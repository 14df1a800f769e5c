//! End-to-end analysis: files on disk in, ranked findings out
//!
//! Stages run in a fixed order, each writing into the [`AnalysisStore`]:
//! discover, scan, roles, graph, architecture, semantics, temporal, author
//! distances, clones, compression, fusion, outliers, recorded history and
//! finally the finders.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::database::{
    HistoryDatabase, Snapshot, SnapshotMeta, HISTORY_DB_FILE, HISTORY_DIR, LATEST_SCHEMA_VERSION,
};
use crate::graph::{self, OutlierInput};
use crate::insights::{
    AnalysisStore, Finding, HistoryContext, InsightEngine, StoreSummary, StructuralAnalysis,
};
use crate::math::compression_ratio;
use crate::scanning::{discover_files, ParallelScanner, ScanConfig, ScanStats};
use crate::semantics;
use crate::signals::{
    build_signal_field, DirectorySignals, FileSignals, GlobalSignals, ModuleSignals,
};
use crate::temporal::{self, GitExtractor};

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run counters and timings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub files_discovered: usize,
    pub scan: ScanStats,
    pub finders_run: Vec<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightResult {
    pub findings: Vec<Finding>,
    pub store_summary: StoreSummary,
    pub file_signals: BTreeMap<String, FileSignals>,
    pub module_signals: BTreeMap<String, ModuleSignals>,
    pub directory_signals: BTreeMap<String, DirectorySignals>,
    pub global_signals: GlobalSignals,
    /// Reasons a file is a statistical outlier
    pub outliers: BTreeMap<String, Vec<String>>,
    pub dependency_edges: Vec<(String, String)>,
    pub commit_sha: Option<String>,
    pub stats: AnalysisStats,
}

impl InsightResult {
    /// Everything a history snapshot keeps from this run
    pub fn to_snapshot(&self, analyzed_path: &Path, config_hash: &str) -> Snapshot {
        let file_signals = self
            .file_signals
            .iter()
            .map(|(path, fs)| {
                let mut signals: BTreeMap<String, f64> = fs
                    .numeric_signals()
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect();
                for (name, pctl) in &fs.percentiles {
                    signals.insert(format!("pctl_{name}"), *pctl);
                }
                (path.clone(), signals)
            })
            .collect();

        let module_signals = self
            .module_signals
            .iter()
            .map(|(path, ms)| {
                let signals = ms
                    .numeric_signals()
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect();
                (path.clone(), signals)
            })
            .collect();

        let codebase_signals = self
            .global_signals
            .numeric_signals()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        Snapshot {
            meta: SnapshotMeta {
                id: 0,
                schema_version: LATEST_SCHEMA_VERSION,
                tool_version: TOOL_VERSION.to_string(),
                commit_sha: self.commit_sha.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                analyzed_path: analyzed_path.display().to_string(),
                file_count: self.store_summary.total_files,
                module_count: self.store_summary.total_modules,
                commits_analyzed: self.store_summary.commits_analyzed,
                analyzers_ran: self.store_summary.signals_available.clone(),
                config_hash: config_hash.to_string(),
            },
            file_signals,
            module_signals,
            codebase_signals,
            findings: self.findings.clone(),
            dependency_edges: self.dependency_edges.clone(),
        }
    }
}

pub struct InsightAnalyzer {
    root: PathBuf,
    config: AnalysisConfig,
}

impl InsightAnalyzer {
    pub fn new(root: impl Into<PathBuf>, config: AnalysisConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self) -> Result<InsightResult> {
        self.analyze_with_progress(|_, _| {})
    }

    /// Full run; `on_scan(done, total)` is called as scan batches finish
    pub fn analyze_with_progress<F>(&self, on_scan: F) -> Result<InsightResult>
    where
        F: Fn(usize, usize) + Sync,
    {
        let started = Instant::now();
        let mut stats = AnalysisStats::default();

        let paths = discover_files(&self.root, &self.config)?;
        stats.files_discovered = paths.len();
        info!("🔍 Discovered {} source files in {}", paths.len(), self.root.display());

        let scanner = ParallelScanner::new(ScanConfig {
            num_threads: self.config.workers(),
            ..ScanConfig::default()
        });
        let scan = scanner.scan_files_with_progress(&self.root, &paths, on_scan)?;
        stats.scan = scan.stats.clone();

        let mut store = AnalysisStore::new(self.root.clone());
        store.files = scan.files;
        let contents = scan.contents;

        store.roles = semantics::classify_roles(&store.files);
        self.run_structural(&mut store);
        store.semantics = semantics::analyze_semantics(&store.files, &store.roles, &contents);

        let analyzed: BTreeSet<String> = store.files.iter().map(|f| f.path.clone()).collect();
        store.temporal = temporal::analyze_history(&self.root, &self.config, &analyzed);
        store.author_distances = store.temporal.as_ref().map(|t| {
            temporal::module_author_distances(&t.history, &graph::modules::file_modules(&store.files))
        });

        store.clone_pairs = Some(graph::detect_clones(&contents, &store.roles));
        store.compression = contents
            .iter()
            .map(|(path, content)| (path.clone(), compression_ratio(content.as_bytes())))
            .collect();

        store.signal_field = Some(build_signal_field(&store));
        store.outliers = outliers(&store);
        store.history = self.load_history();

        let engine = InsightEngine::new(self.config.insights_max_findings);
        let findings = engine.run(&store);
        stats.finders_run = engine
            .finder_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        stats.duration_ms = started.elapsed().as_millis() as u64;

        let commit_sha = store
            .temporal
            .as_ref()
            .and_then(|_| GitExtractor::new(&self.root, 1).head_commit());
        let dependency_edges = store
            .graph()
            .map(|g| g.edges().map(|(a, b)| (a.to_string(), b.to_string())).collect())
            .unwrap_or_default();
        let store_summary = store.summary();

        let field = store
            .signal_field
            .take()
            .ok_or_else(|| anyhow!("Signal fusion produced no field"))?;
        info!(
            "✅ Analysis complete: {} files, {} findings in {}ms",
            store_summary.total_files,
            findings.len(),
            stats.duration_ms
        );

        Ok(InsightResult {
            findings,
            store_summary,
            file_signals: field.per_file,
            module_signals: field.per_module,
            directory_signals: field.per_directory,
            global_signals: field.global,
            outliers: store.outliers,
            dependency_edges,
            commit_sha,
            stats,
        })
    }

    /// Earlier runs from an existing history database; never creates one
    fn load_history(&self) -> Option<HistoryContext> {
        if !self.config.enable_history {
            return None;
        }
        let path = self.root.join(HISTORY_DIR).join(HISTORY_DB_FILE);
        if !path.exists() {
            return None;
        }
        let loaded = HistoryDatabase::new(&path).and_then(|db| {
            Ok(HistoryContext {
                persistent: db.persistent_findings()?,
                violation_rates: db
                    .codebase_signal_series("violation_rate")?
                    .into_iter()
                    .map(|p| p.value)
                    .collect(),
            })
        });
        match loaded {
            Ok(history) => {
                debug!(
                    "History: {} persistent findings, {} recorded runs",
                    history.persistent.len(),
                    history.violation_rates.len()
                );
                Some(history)
            }
            Err(e) => {
                warn!("History unavailable, skipping history-based findings: {}", e);
                None
            }
        }
    }

    fn run_structural(&self, store: &mut AnalysisStore) {
        let dependency_graph = graph::build_dependency_graph(&mut store.files);
        let analysis = graph::run_graph_algorithms(&dependency_graph, &self.config, &store.roles);
        let architecture =
            graph::analyze_architecture(&store.files, &dependency_graph, &analysis, &store.roles);
        debug!(
            "Graph: {} nodes, {} edges, {} cycles",
            dependency_graph.nodes.len(),
            dependency_graph.edge_count,
            analysis.cycles.len()
        );
        store.structural = Some(StructuralAnalysis {
            graph: dependency_graph,
            analysis,
            architecture,
        });
    }
}

fn outliers(store: &AnalysisStore) -> BTreeMap<String, Vec<String>> {
    let (Some(field), Some(structural)) = (&store.signal_field, &store.structural) else {
        return BTreeMap::new();
    };
    let inputs: BTreeMap<String, OutlierInput> = field
        .per_file
        .iter()
        .map(|(path, fs)| {
            let input = OutlierInput {
                cognitive_load: fs.cognitive_load,
                compression_ratio: fs.compression_ratio,
                impl_gini: fs.impl_gini,
                blast_radius_size: fs.blast_radius_size as f64,
                in_cycle: structural.analysis.in_cycle(path),
            };
            (path.clone(), input)
        })
        .collect();
    graph::detect_outliers(&inputs)
}
