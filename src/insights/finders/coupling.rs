//! File pairs whose history and imports disagree, and copy-paste clones

use std::collections::{BTreeSet, HashMap};

use super::{by_severity, file_name, tiered_field};
use crate::graph::clones::CLONE_THRESHOLD;
use crate::insights::engine::Finder;
use crate::insights::models::{
    confidence_from_margins, Effort, Evidence, Finding, Polarity, Scope,
};
use crate::insights::store::{AnalysisStore, Requirement};
use crate::math::information::mutual_information;
use crate::math::stats::cosine_similarity;
use crate::scanning::models::{file_stem, parent_dir};
use crate::semantics::{FileSemantics, Role};
use crate::temporal::CoChangePair;

/// Files that change together with no import between them
pub struct HiddenCouplingFinder;

impl HiddenCouplingFinder {
    const SEVERITY: f64 = 0.9;
    const MIN_LIFT: f64 = 2.0;
    const MIN_CONFIDENCE: f64 = 0.5;
    /// Bits
    const MIN_MI: f64 = 0.05;
    const MIN_COCHANGE: usize = 3;
    const MAX_FINDINGS: usize = 20;

    fn describe(pair: &CoChangePair) -> String {
        let a = file_name(&pair.file_a);
        let b = file_name(&pair.file_b);
        if pair.confidence_a_b >= pair.confidence_b_a {
            format!(
                "when {a} changed, {b} also changed {} of {} times ({:.0}%)",
                pair.cochange_count,
                pair.total_a,
                pair.confidence_a_b * 100.0
            )
        } else {
            format!(
                "when {b} changed, {a} also changed {} of {} times ({:.0}%)",
                pair.cochange_count,
                pair.total_b,
                pair.confidence_b_a * 100.0
            )
        }
    }
}

impl Finder for HiddenCouplingFinder {
    fn name(&self) -> &'static str {
        "hidden_coupling"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::Structural, Requirement::CoChange]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let (Some(graph), Some(temporal)) = (store.graph(), store.temporal.as_ref()) else {
            return Vec::new();
        };
        let cochange = &temporal.cochange;
        let mut findings = Vec::new();

        for pair in cochange.pairs.values() {
            let (a, b) = (pair.file_a.as_str(), pair.file_b.as_str());
            if a.ends_with("__init__.py") || b.ends_with("__init__.py") {
                continue;
            }
            let max_conf = pair.confidence_a_b.max(pair.confidence_b_a);
            if pair.cochange_count < Self::MIN_COCHANGE
                || pair.lift < Self::MIN_LIFT
                || max_conf < Self::MIN_CONFIDENCE
            {
                continue;
            }

            let total_a = cochange.file_change_counts.get(a).copied().unwrap_or(0);
            let total_b = cochange.file_change_counts.get(b).copied().unwrap_or(0);
            let joint = pair.cochange_count;
            let neither = (cochange.total_commits + joint).saturating_sub(total_a + total_b);
            let mi = mutual_information(
                joint,
                total_a.saturating_sub(joint),
                total_b.saturating_sub(joint),
                neither,
            );
            if mi < Self::MIN_MI {
                continue;
            }
            if graph.has_edge(a, b) || graph.has_edge(b, a) {
                continue;
            }

            let strength = ((pair.lift / 10.0 + max_conf + mi) / 3.0).clamp(0.1, 1.0);
            let suggestion = if parent_dir(a) == parent_dir(b) {
                format!(
                    "{} and {} are in the same package and always change together, but neither imports the other. Make this explicit: add an import or extract shared logic.",
                    file_name(a),
                    file_name(b)
                )
            } else {
                "These files live in different packages but always change together. Find what ties them and make it explicit via import or shared module.".to_string()
            };

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY * strength,
                title: format!("{a} and {b} always change together"),
                files: vec![a.to_string(), b.to_string()],
                evidence: vec![
                    Evidence::new(
                        "cochange_count",
                        pair.cochange_count as f64,
                        0.0,
                        Self::describe(pair),
                    ),
                    Evidence::new(
                        "cochange_lift",
                        pair.lift,
                        0.0,
                        format!("{:.1}x more often than expected by chance", pair.lift),
                    ),
                    Evidence::new(
                        "mutual_information",
                        mi,
                        0.0,
                        format!("MI = {mi:.3} bits"),
                    ),
                    Evidence::new("no_import", 0.0, 0.0, "neither file imports the other"),
                ],
                suggestion,
                confidence: 0.8,
                effort: Effort::Low,
                scope: Scope::FilePair,
            });
        }

        let mut findings = by_severity(findings);
        findings.truncate(Self::MAX_FINDINGS);
        findings
    }
}

/// Import between two active files that never change in the same commit
pub struct DeadDependencyFinder;

impl DeadDependencyFinder {
    const SEVERITY: f64 = 0.4 * 0.7;
    const MIN_HISTORY_COMMITS: usize = 50;
}

impl Finder for DeadDependencyFinder {
    fn name(&self) -> &'static str {
        "dead_dependency"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[
            Requirement::Structural,
            Requirement::CoChange,
            Requirement::GitHistory,
        ]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let (Some(graph), Some(temporal)) = (store.graph(), store.temporal.as_ref()) else {
            return Vec::new();
        };
        let total_commits = temporal.history.total_commits();
        if total_commits < Self::MIN_HISTORY_COMMITS {
            return Vec::new();
        }
        let cochange = &temporal.cochange;
        let mut findings = Vec::new();

        for (src, tgt) in graph.edges() {
            let src_changes = cochange.file_change_counts.get(src).copied().unwrap_or(0);
            let tgt_changes = cochange.file_change_counts.get(tgt).copied().unwrap_or(0);
            if src_changes == 0 || tgt_changes == 0 {
                continue;
            }
            let key = if src < tgt {
                (src.to_string(), tgt.to_string())
            } else {
                (tgt.to_string(), src.to_string())
            };
            if cochange.pairs.contains_key(&key) {
                continue;
            }

            let (src_name, tgt_name) = (file_name(src), file_name(tgt));
            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY,
                title: format!("{src} imports {tgt} but they never change together"),
                files: vec![src.to_string(), tgt.to_string()],
                evidence: vec![
                    Evidence::new(
                        "structural_dep",
                        1.0,
                        0.0,
                        format!("{src_name} has an import statement for {tgt_name}"),
                    ),
                    Evidence::new(
                        "cochange_count",
                        0.0,
                        0.0,
                        format!(
                            "across {total_commits} commits, {src_name} changed {src_changes} times and {tgt_name} changed {tgt_changes} times, but never in the same commit"
                        ),
                    ),
                ],
                suggestion: format!(
                    "The import of {tgt_name} in {src_name} may be unused or vestigial. Check if it can be removed."
                ),
                confidence: 0.6,
                effort: Effort::Low,
                scope: Scope::FilePair,
            });
        }
        findings
    }
}

/// Files whose compressed content is nearly identical
pub struct CopyPasteCloneFinder;

impl CopyPasteCloneFinder {
    const SEVERITY: f64 = 0.50;
}

impl Finder for CopyPasteCloneFinder {
    fn name(&self) -> &'static str {
        "copy_paste_clone"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::ClonePairs]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(pairs) = &store.clone_pairs else {
            return Vec::new();
        };
        let findings = pairs
            .iter()
            .filter(|p| p.ncd < CLONE_THRESHOLD)
            .map(|pair| {
                let mut files = vec![pair.file_a.clone(), pair.file_b.clone()];
                files.sort();
                Finding {
                    finding_type: self.name().to_string(),
                    severity: Self::SEVERITY + (CLONE_THRESHOLD - pair.ncd) * 0.33,
                    title: format!("Copy-paste clone: {} <-> {}", files[0], files[1]),
                    files,
                    evidence: vec![Evidence::new(
                        "ncd_score",
                        pair.ncd,
                        0.0,
                        format!("NCD={:.2} (< {CLONE_THRESHOLD} = clone)", pair.ncd),
                    )],
                    suggestion: "Extract shared logic into a common module.".to_string(),
                    confidence: confidence_from_margins(&[(
                        pair.ncd,
                        CLONE_THRESHOLD,
                        Polarity::HighIsGood,
                    )]),
                    effort: Effort::Medium,
                    scope: Scope::FilePair,
                }
            })
            .collect();
        by_severity(findings)
    }
}

/// Import between files that share neither dependencies nor vocabulary
pub struct AccidentalCouplingFinder;

impl AccidentalCouplingFinder {
    const SEVERITY: f64 = 0.50;
    const MAX_SIMILARITY: f64 = 0.15;
    const MAX_FINDINGS: usize = 20;
    const FINGERPRINT_WEIGHT: f64 = 0.6;
    const CONCEPT_WEIGHT: f64 = 0.4;

    /// Stems of modules every layer is expected to import
    const INFRA_STEMS: &'static [&'static str] = &[
        "models", "model", "schemas", "schema", "types", "exceptions", "errors",
        "constants", "protocols", "interfaces", "logging", "logging_config", "logger",
        "log", "config", "settings", "utils", "util", "helpers", "helper", "common",
        "base", "core", "_common",
    ];
    const INFRA_ROLES: &'static [Role] = &[
        Role::Model,
        Role::Config,
        Role::Interface,
        Role::Exception,
        Role::Constant,
        Role::Utility,
    ];

    fn is_infrastructure(store: &AnalysisStore, path: &str) -> bool {
        if file_name(path) == "__init__.py" || Self::INFRA_STEMS.contains(&file_stem(path)) {
            return true;
        }
        store
            .roles
            .get(path)
            .is_some_and(|role| Self::INFRA_ROLES.contains(role))
    }

    /// Blend of import-fingerprint cosine and concept-topic Jaccard
    fn similarity(a: &FileSemantics, b: &FileSemantics) -> f64 {
        let fingerprint = |s: &FileSemantics| -> HashMap<String, f64> {
            s.import_fingerprint.iter().map(|(k, v)| (k.clone(), *v)).collect()
        };
        let cosine = cosine_similarity(&fingerprint(a), &fingerprint(b));

        let topics = |s: &FileSemantics| -> BTreeSet<String> {
            s.concepts.iter().map(|c| c.topic.clone()).collect()
        };
        let (ta, tb) = (topics(a), topics(b));
        let union = ta.union(&tb).count();
        let jaccard = if union == 0 {
            0.0
        } else {
            ta.intersection(&tb).count() as f64 / union as f64
        };

        Self::FINGERPRINT_WEIGHT * cosine + Self::CONCEPT_WEIGHT * jaccard
    }

    fn describable(s: &FileSemantics) -> bool {
        !s.concepts.is_empty() || !s.import_fingerprint.is_empty()
    }
}

impl Finder for AccidentalCouplingFinder {
    fn name(&self) -> &'static str {
        "accidental_coupling"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::Structural, Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(graph) = store.graph().filter(|_| tiered_field(store).is_some()) else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        let mut findings = Vec::new();

        for (src, tgt) in graph.edges() {
            if Self::is_infrastructure(store, src) || Self::is_infrastructure(store, tgt) {
                continue;
            }
            let (Some(a), Some(b)) = (store.semantics.get(src), store.semantics.get(tgt)) else {
                continue;
            };
            if !Self::describable(a) || !Self::describable(b) {
                continue;
            }
            let mut files = vec![src.to_string(), tgt.to_string()];
            files.sort();
            if !seen.insert(files.clone()) {
                continue;
            }

            let similarity = Self::similarity(a, b);
            if similarity >= Self::MAX_SIMILARITY {
                continue;
            }
            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY,
                title: format!("Accidental coupling: {} <-> {}", files[0], files[1]),
                evidence: vec![Evidence::new(
                    "concept_overlap",
                    similarity,
                    0.0,
                    format!(
                        "{} imports {} but they share {:.0}% of imports and vocabulary",
                        file_name(src),
                        file_name(tgt),
                        similarity * 100.0
                    ),
                )],
                files,
                suggestion: "These files are connected but unrelated. Check whether the import belongs in a shared module or can be removed.".to_string(),
                confidence: confidence_from_margins(&[(
                    similarity,
                    Self::MAX_SIMILARITY,
                    Polarity::HighIsGood,
                )]),
                effort: Effort::Medium,
                scope: Scope::FilePair,
            });
        }
        let mut findings = by_severity(findings);
        findings.truncate(Self::MAX_FINDINGS);
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClonePair, DependencyGraph};
    use crate::insights::store::StructuralAnalysis;
    use crate::semantics::Concept;
    use crate::signals::{NormalizationTier, SignalField};
    use crate::temporal::{CoChangeMatrix, Commit, GitHistory, TemporalAnalysis};
    use std::collections::BTreeMap;

    fn pair(a: &str, b: &str, count: usize, total_a: usize, total_b: usize, lift: f64) -> CoChangePair {
        CoChangePair {
            file_a: a.into(),
            file_b: b.into(),
            cochange_count: count,
            total_a,
            total_b,
            confidence_a_b: count as f64 / total_a as f64,
            confidence_b_a: count as f64 / total_b as f64,
            lift,
        }
    }

    fn store(graph: DependencyGraph, matrix: CoChangeMatrix) -> AnalysisStore {
        let mut store = AnalysisStore::new(".");
        store.structural = Some(StructuralAnalysis {
            graph,
            ..StructuralAnalysis::default()
        });
        store.temporal = Some(TemporalAnalysis {
            history: GitHistory::default(),
            churn: Default::default(),
            cochange: matrix,
        });
        store
    }

    #[test]
    fn test_hidden_coupling_ignores_pairs_with_imports() {
        let mut matrix = CoChangeMatrix {
            total_commits: 40,
            ..CoChangeMatrix::default()
        };
        for (a, b) in [("api/orders.py", "db/schema.py"), ("api/users.py", "db/users.py")] {
            matrix.pairs.insert((a.into(), b.into()), pair(a, b, 8, 10, 9, 3.5));
            matrix.file_change_counts.insert(a.into(), 10);
            matrix.file_change_counts.insert(b.into(), 9);
        }
        let mut graph = DependencyGraph::default();
        graph
            .adjacency
            .insert("api/users.py".into(), vec!["db/users.py".into()]);

        let findings = HiddenCouplingFinder.find(&store(graph, matrix));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].files, vec!["api/orders.py", "db/schema.py"]);
        assert_eq!(findings[0].scope, Scope::FilePair);
    }

    #[test]
    fn test_clone_findings_sort_files() {
        let mut store = AnalysisStore::new(".");
        store.clone_pairs = Some(vec![ClonePair {
            file_a: "b/copy.py".into(),
            file_b: "a/original.py".into(),
            ncd: 0.1,
            size_a: 900,
            size_b: 880,
        }]);
        let findings = CopyPasteCloneFinder.find(&store);
        assert_eq!(findings[0].title, "Copy-paste clone: a/original.py <-> b/copy.py");
        assert!((findings[0].severity - (0.5 + 0.2 * 0.33)).abs() < 1e-9);
    }

    fn history(commits: usize) -> GitHistory {
        GitHistory {
            commits: (0..commits)
                .map(|i| Commit {
                    hash: format!("{i:040x}"),
                    timestamp: i as i64,
                    author: "dev".into(),
                    subject: "update".into(),
                    files: Vec::new(),
                })
                .collect(),
            ..GitHistory::default()
        }
    }

    /// `api.py -> db.py` and `cli.py -> db.py`, each file changed 5 times
    fn dead_dependency_store(commits: usize, cochange_with_cli: bool) -> AnalysisStore {
        let mut graph = DependencyGraph::default();
        graph.adjacency.insert("api.py".into(), vec!["db.py".into()]);
        graph.adjacency.insert("cli.py".into(), vec!["db.py".into()]);
        let mut matrix = CoChangeMatrix {
            total_commits: commits,
            ..CoChangeMatrix::default()
        };
        for file in ["api.py", "cli.py", "db.py"] {
            matrix.file_change_counts.insert(file.into(), 5);
        }
        if cochange_with_cli {
            matrix
                .pairs
                .insert(("cli.py".into(), "db.py".into()), pair("cli.py", "db.py", 3, 5, 5, 1.2));
        }
        let mut store = store(graph, matrix);
        if let Some(temporal) = store.temporal.as_mut() {
            temporal.history = history(commits);
        }
        store
    }

    #[test]
    fn test_dead_dependency_needs_fifty_commits() {
        assert!(DeadDependencyFinder.find(&dead_dependency_store(49, false)).is_empty());
        assert_eq!(DeadDependencyFinder.find(&dead_dependency_store(50, false)).len(), 2);
    }

    #[test]
    fn test_dead_dependency_skips_pairs_that_change_together() {
        let findings = DeadDependencyFinder.find(&dead_dependency_store(60, true));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].files, vec!["api.py", "db.py"]);
        assert!(findings[0].evidence[1].description.contains("across 60 commits"));
    }

    fn semantics(path: &str, topics: &[&str], imports: &[&str]) -> FileSemantics {
        FileSemantics {
            path: path.into(),
            role: Role::Service,
            concepts: topics
                .iter()
                .map(|t| Concept {
                    topic: t.to_string(),
                    weight: 1.0 / topics.len() as f64,
                    keywords: vec![t.to_string()],
                })
                .collect(),
            concept_entropy: 0.0,
            tier: 1,
            naming_drift: 0.0,
            todo_density: 0.0,
            docstring_coverage: None,
            import_fingerprint: imports.iter().map(|i| (i.to_string(), 2.0)).collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_accidental_coupling_between_unrelated_files() {
        let mut graph = DependencyGraph::default();
        graph.adjacency.insert(
            "billing/invoice.py".into(),
            vec!["media/thumbnail.py".into(), "billing/tax.py".into(), "app/config.py".into()],
        );
        let mut store = store(graph, CoChangeMatrix::default());
        store.signal_field = Some(SignalField::new(NormalizationTier::Bayesian));
        for s in [
            semantics("billing/invoice.py", &["invoice", "tax"], &["decimal"]),
            semantics("media/thumbnail.py", &["image", "resize"], &["pillow"]),
            semantics("billing/tax.py", &["tax", "rate"], &["decimal"]),
            semantics("app/config.py", &["setting"], &["os"]),
        ] {
            store.semantics.insert(s.path.clone(), s);
        }

        let findings = AccidentalCouplingFinder.find(&store);
        // config.py is infrastructure; tax.py shares imports and a topic
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Accidental coupling: billing/invoice.py <-> media/thumbnail.py");
        assert_eq!(findings[0].evidence[0].value, 0.0);

        store.signal_field = Some(SignalField::new(NormalizationTier::Absolute));
        assert!(AccidentalCouplingFinder.find(&store).is_empty());
    }
}
