//! Stubs, dangling imports, unreferenced files and misleading names

use std::collections::BTreeSet;

use super::{by_severity, file_name};
use crate::insights::engine::Finder;
use crate::insights::models::{
    confidence_from_margins, Effort, Evidence, Finding, Polarity, Scope,
};
use crate::insights::store::{AnalysisStore, Requirement};
use crate::scanning::models::{file_stem, parent_dir};
use crate::semantics::GENERIC_FILENAMES;

const MAX_PER_FINDER: usize = 10;

/// Mostly stubs, with what is implemented concentrated in a few functions
pub struct HollowCodeFinder;

impl HollowCodeFinder {
    const SEVERITY: f64 = 0.71;
    const STUB: f64 = 0.5;
    const GINI: f64 = 0.6;
}

impl Finder for HollowCodeFinder {
    fn name(&self) -> &'static str {
        "hollow_code"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = &store.signal_field else {
            return Vec::new();
        };
        let findings = field
            .per_file
            .iter()
            .filter(|(_, fs)| {
                fs.function_count > 0 && fs.stub_ratio > Self::STUB && fs.impl_gini > Self::GINI
            })
            .map(|(path, fs)| Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY,
                title: format!(
                    "Hollow code: {path} ({:.0}% stubs)",
                    fs.stub_ratio * 100.0
                ),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new(
                        "stub_ratio",
                        fs.stub_ratio,
                        fs.percentile("stub_ratio"),
                        format!("{:.0}% of functions are stubs", fs.stub_ratio * 100.0),
                    ),
                    Evidence::new(
                        "impl_gini",
                        fs.impl_gini,
                        fs.percentile("impl_gini"),
                        format!("Gini={:.2} (very uneven implementation)", fs.impl_gini),
                    ),
                    Evidence::new(
                        "function_count",
                        fs.function_count as f64,
                        0.0,
                        format!("{} functions total", fs.function_count),
                    ),
                ],
                suggestion:
                    "Implement the stub functions. Priority: functions called by other files."
                        .to_string(),
                confidence: confidence_from_margins(&[
                    (fs.stub_ratio, Self::STUB, Polarity::HighIsBad),
                    (fs.impl_gini, Self::GINI, Polarity::HighIsBad),
                ]),
                effort: Effort::Medium,
                scope: Scope::File,
            })
            .collect();
        by_severity(findings)
    }
}

/// Imports that look internal but resolve to nothing
pub struct PhantomImportsFinder;

impl PhantomImportsFinder {
    const SEVERITY: f64 = 0.65;
}

impl Finder for PhantomImportsFinder {
    fn name(&self) -> &'static str {
        "phantom_imports"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = &store.signal_field else {
            return Vec::new();
        };
        let mut findings: Vec<Finding> = field
            .per_file
            .iter()
            .filter(|(_, fs)| fs.phantom_import_count > 0)
            .map(|(path, fs)| {
                let phantoms = fs.phantom_import_count;
                let ratio = phantoms as f64 / fs.import_count.max(1) as f64;
                Finding {
                    finding_type: self.name().to_string(),
                    severity: (Self::SEVERITY + 0.03 * (phantoms - 1) as f64).min(0.80),
                    title: format!("Phantom imports: {path} ({phantoms} unresolved)"),
                    files: vec![path.clone()],
                    evidence: vec![
                        Evidence::new(
                            "phantom_import_count",
                            phantoms as f64,
                            0.0,
                            format!("{phantoms} unresolved import(s)"),
                        ),
                        Evidence::new(
                            "import_count",
                            fs.import_count as f64,
                            0.0,
                            format!("{} total imports", fs.import_count),
                        ),
                        Evidence::new(
                            "phantom_ratio",
                            ratio,
                            0.0,
                            format!("{:.0}% of imports are phantom", ratio * 100.0),
                        ),
                    ],
                    suggestion: "Create missing module or replace with existing library."
                        .to_string(),
                    confidence: 1.0,
                    effort: Effort::Medium,
                    scope: Scope::File,
                }
            })
            .collect();
        findings = by_severity(findings);
        findings.truncate(MAX_PER_FINDER);
        findings
    }
}

/// Nothing imports the file and nothing marks it as an entry point
pub struct OrphanCodeFinder;

impl OrphanCodeFinder {
    const SEVERITY: f64 = 0.55;
    /// Directories whose files are usually loaded by registration, not import
    const DYNAMIC_DIRS: &'static [&'static str] =
        &["queries", "plugins", "scanners", "finders", "analyzers"];

    fn dynamically_loaded(path: &str, all: &BTreeSet<&str>) -> bool {
        let dir = parent_dir(path);
        let in_dynamic_dir = dir.split('/').any(|seg| Self::DYNAMIC_DIRS.contains(&seg));
        in_dynamic_dir && all.contains(format!("{dir}/__init__.py").as_str())
    }
}

impl Finder for OrphanCodeFinder {
    fn name(&self) -> &'static str {
        "orphan_code"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = &store.signal_field else {
            return Vec::new();
        };
        let all: BTreeSet<&str> = field.per_file.keys().map(String::as_str).collect();

        let mut findings: Vec<Finding> = field
            .per_file
            .iter()
            .filter(|(path, fs)| {
                fs.is_orphan
                    && !path.ends_with("__init__.py")
                    && !Self::dynamically_loaded(path, &all)
            })
            .map(|(path, fs)| {
                let mut evidence = vec![
                    Evidence::new("in_degree", fs.in_degree as f64, 0.0, "No files import this"),
                    Evidence::new("role", 0.0, 0.0, format!("Classified as {}", fs.role)),
                ];
                if fs.depth == -1 {
                    evidence.push(Evidence::new(
                        "depth",
                        -1.0,
                        0.0,
                        "Unreachable from entry points",
                    ));
                }
                Finding {
                    finding_type: self.name().to_string(),
                    severity: Self::SEVERITY,
                    title: format!("Orphan file: {path}"),
                    files: vec![path.clone()],
                    evidence,
                    suggestion: "Wire into dependency graph or remove if unused.".to_string(),
                    confidence: 1.0,
                    effort: Effort::Low,
                    scope: Scope::File,
                }
            })
            .collect();
        findings.truncate(MAX_PER_FINDER);
        findings
    }
}

/// File name says one thing, content says another
pub struct NamingDriftFinder;

impl NamingDriftFinder {
    const SEVERITY: f64 = 0.45;
    const DRIFT: f64 = 0.7;

    /// `utils.py` and friends promise nothing about their content
    fn generic_name(path: &str) -> bool {
        GENERIC_FILENAMES.contains(&file_stem(path).to_lowercase().as_str())
    }
}

impl Finder for NamingDriftFinder {
    fn name(&self) -> &'static str {
        "naming_drift"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = &store.signal_field else {
            return Vec::new();
        };
        field
            .per_file
            .iter()
            .filter(|(path, fs)| fs.naming_drift > Self::DRIFT && !Self::generic_name(path))
            .map(|(path, fs)| Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY,
                title: format!("Naming drift: {path} (content doesn't match name)"),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new(
                        "naming_drift",
                        fs.naming_drift,
                        fs.percentile("naming_drift"),
                        format!(
                            "Drift score = {:.2} ({} vs content mismatch)",
                            fs.naming_drift,
                            file_name(path)
                        ),
                    ),
                    Evidence::new(
                        "concept_count",
                        fs.concept_count as f64,
                        0.0,
                        format!("{} concepts in content", fs.concept_count),
                    ),
                ],
                suggestion:
                    "Rename file to match its actual content, or extract mismatched logic."
                        .to_string(),
                confidence: confidence_from_margins(&[(
                    fs.naming_drift,
                    Self::DRIFT,
                    Polarity::HighIsBad,
                )]),
                effort: Effort::Low,
                scope: Scope::File,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{FileSignals, NormalizationTier, SignalField};

    fn store_with(files: Vec<FileSignals>) -> AnalysisStore {
        let mut field = SignalField::new(NormalizationTier::Absolute);
        for file in files {
            field.per_file.insert(file.path.clone(), file);
        }
        let mut store = AnalysisStore::new(".");
        store.signal_field = Some(field);
        store
    }

    #[test]
    fn test_hollow_code_needs_both_stubs_and_uneven_sizes() {
        let mut hollow = FileSignals::new("api/handlers.py");
        hollow.function_count = 6;
        hollow.stub_ratio = 0.8;
        hollow.impl_gini = 0.7;
        let mut stubby_but_even = FileSignals::new("api/ports.py");
        stubby_but_even.function_count = 4;
        stubby_but_even.stub_ratio = 0.9;
        stubby_but_even.impl_gini = 0.1;

        let findings = HollowCodeFinder.find(&store_with(vec![hollow, stubby_but_even]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Hollow code: api/handlers.py (80% stubs)");
    }

    #[test]
    fn test_phantom_severity_grows_with_count() {
        let mut one = FileSignals::new("a.py");
        one.phantom_import_count = 1;
        let mut many = FileSignals::new("b.py");
        many.phantom_import_count = 20;
        let findings = PhantomImportsFinder.find(&store_with(vec![one, many]));
        assert_eq!(findings[0].files, vec!["b.py"]);
        assert!((findings[0].severity - 0.80).abs() < 1e-9);
        assert!((findings[1].severity - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_orphans_in_plugin_packages_are_skipped() {
        let mut plugin = FileSignals::new("app/plugins/extra.py");
        plugin.is_orphan = true;
        let init = FileSignals::new("app/plugins/__init__.py");
        let mut dead = FileSignals::new("app/legacy.py");
        dead.is_orphan = true;

        let findings = OrphanCodeFinder.find(&store_with(vec![plugin, init, dead]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Orphan file: app/legacy.py");
    }

    #[test]
    fn test_naming_drift_skips_generic_names() {
        let mut drifting = FileSignals::new("billing/payment.py");
        drifting.naming_drift = 0.9;
        drifting.concept_count = 2;
        let mut helpers = FileSignals::new("billing/Helpers.py");
        helpers.naming_drift = 0.95;
        let mut settled = FileSignals::new("billing/invoice.py");
        settled.naming_drift = 0.7;

        let findings = NamingDriftFinder.find(&store_with(vec![drifting, helpers, settled]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].files, vec!["billing/payment.py"]);
        assert_eq!(findings[0].evidence[0].description, "Drift score = 0.90 (payment.py vs content mismatch)");
    }
}
