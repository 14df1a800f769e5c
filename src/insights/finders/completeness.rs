//! Unfinished code: broken imports, stubs, and copies of both

use super::by_severity;
use crate::insights::engine::Finder;
use crate::insights::models::{Effort, Evidence, Finding, Scope};
use crate::insights::store::{AnalysisStore, Requirement};
use crate::signals::FileSignals;

/// File with broken imports or too many stubs to be finished
pub struct IncompleteImplementationFinder;

impl IncompleteImplementationFinder {
    const SEVERITY: f64 = 0.80;
    const STUB_RATIO: f64 = 0.6;
    const IMPL_GINI: f64 = 0.15;
    const MIN_ISSUES: usize = 2;

    /// `(signal, weight)` of each problem found; weights only order the evidence
    fn issues(fs: &FileSignals) -> Vec<(&'static str, f64)> {
        let mut issues = Vec::new();
        if fs.phantom_import_count > 0 {
            issues.push(("phantom_import_count", 0.3));
        }
        if fs.stub_ratio > Self::STUB_RATIO {
            issues.push(("stub_ratio", 0.2));
        }
        // Uniform sizes only count alongside real stubs
        if fs.impl_gini < Self::IMPL_GINI && fs.function_count > 5 && fs.stub_ratio > 0.3 {
            issues.push(("impl_gini", 0.1));
        }
        issues
    }
}

impl Finder for IncompleteImplementationFinder {
    fn name(&self) -> &'static str {
        "incomplete_implementation"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = &store.signal_field else {
            return Vec::new();
        };
        let mut findings = Vec::new();

        for (path, fs) in &field.per_file {
            let issues = Self::issues(fs);
            let runtime = fs.phantom_import_count > 0;
            if !runtime && issues.len() < Self::MIN_ISSUES {
                continue;
            }

            let mut severity = Self::SEVERITY + issues.len() as f64 * 0.05;
            if runtime {
                severity += 0.1;
            }
            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: severity.min(0.95),
                title: format!("Incomplete implementation: {path}"),
                files: vec![path.clone()],
                evidence: vec![
                    Evidence::new(
                        "phantom_import_count",
                        fs.phantom_import_count as f64,
                        0.0,
                        format!("{} imports not found", fs.phantom_import_count),
                    ),
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
                        format!("function size gini: {:.2} (uniform = incomplete)", fs.impl_gini),
                    ),
                    Evidence::new(
                        "total_changes",
                        fs.total_changes as f64,
                        fs.percentile("total_changes"),
                        format!("{} total changes (never finished?)", fs.total_changes),
                    ),
                ],
                suggestion: "This file has broken dependencies and/or stub functions. Fix imports, implement stubs, or remove dead code.".to_string(),
                confidence: 0.90,
                effort: Effort::High,
                scope: Scope::File,
            });
        }
        by_severity(findings)
    }
}

/// Two copies of the same file, both unfinished
pub struct DuplicateIncompleteFinder;

impl DuplicateIncompleteFinder {
    const SEVERITY: f64 = 0.75;
    const STUB_RATIO: f64 = 0.3;

    fn incomplete(fs: &FileSignals) -> bool {
        fs.stub_ratio > Self::STUB_RATIO || fs.phantom_import_count > 0
    }
}

impl Finder for DuplicateIncompleteFinder {
    fn name(&self) -> &'static str {
        "duplicate_incomplete"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::ClonePairs]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let (Some(field), Some(pairs)) = (&store.signal_field, &store.clone_pairs) else {
            return Vec::new();
        };
        let mut findings = Vec::new();

        for pair in pairs {
            let (Some(a), Some(b)) = (field.file(&pair.file_a), field.file(&pair.file_b)) else {
                continue;
            };
            if !Self::incomplete(a) || !Self::incomplete(b) {
                continue;
            }

            let mut severity = Self::SEVERITY;
            if a.stub_ratio > 0.5 && b.stub_ratio > 0.5 {
                severity += 0.1;
            }
            if a.phantom_import_count > 0 && b.phantom_import_count > 0 {
                severity += 0.1;
            }
            let phantoms = a.phantom_import_count + b.phantom_import_count;

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: severity.min(0.90),
                title: format!("Duplicate incomplete: {} ≈ {}", pair.file_a, pair.file_b),
                files: vec![pair.file_a.clone(), pair.file_b.clone()],
                evidence: vec![
                    Evidence::new(
                        "ncd",
                        pair.ncd,
                        0.0,
                        format!("Clone similarity: {:.2}", pair.ncd),
                    ),
                    Evidence::new(
                        "stub_ratio",
                        a.stub_ratio,
                        a.percentile("stub_ratio"),
                        format!("{}: {:.0}% stubs", pair.file_a, a.stub_ratio * 100.0),
                    ),
                    Evidence::new(
                        "stub_ratio",
                        b.stub_ratio,
                        b.percentile("stub_ratio"),
                        format!("{}: {:.0}% stubs", pair.file_b, b.stub_ratio * 100.0),
                    ),
                    Evidence::new(
                        "phantom_import_count",
                        phantoms as f64,
                        0.0,
                        format!("Total phantom imports: {phantoms}"),
                    ),
                ],
                suggestion: "Both files are incomplete copies. Complete one implementation and delete the duplicate.".to_string(),
                confidence: 0.90,
                effort: Effort::High,
                scope: Scope::FilePair,
            });
        }
        by_severity(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ClonePair;
    use crate::signals::{NormalizationTier, SignalField};

    fn store_with(files: Vec<FileSignals>) -> AnalysisStore {
        let mut field = SignalField::new(NormalizationTier::Absolute);
        for file in files {
            field.per_file.insert(file.path.clone(), file);
        }
        let mut store = AnalysisStore::new(".");
        store.signal_field = Some(field);
        store
    }

    fn file(path: &str, stub_ratio: f64, phantoms: usize) -> FileSignals {
        let mut fs = FileSignals::new(path);
        fs.stub_ratio = stub_ratio;
        fs.phantom_import_count = phantoms;
        fs.function_count = 4;
        fs.impl_gini = 0.5;
        fs
    }

    #[test]
    fn test_phantom_import_alone_is_enough() {
        let store = store_with(vec![file("a.py", 0.0, 1), file("b.py", 0.7, 0)]);
        let findings = IncompleteImplementationFinder.find(&store);
        // A lone stub signal is not
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].files, vec!["a.py"]);
        // 0.80 + one issue + runtime bonus
        assert!((findings[0].severity - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_stubs_with_uniform_sizes() {
        let mut uniform = file("gen.py", 0.8, 0);
        uniform.function_count = 8;
        uniform.impl_gini = 0.05;
        let findings = IncompleteImplementationFinder.find(&store_with(vec![uniform]));
        assert_eq!(findings.len(), 1);
        assert!((findings[0].severity - 0.90).abs() < 1e-9);
    }

    fn clone(a: &str, b: &str) -> ClonePair {
        ClonePair {
            file_a: a.to_string(),
            file_b: b.to_string(),
            ncd: 0.1,
            size_a: 800,
            size_b: 820,
        }
    }

    #[test]
    fn test_duplicate_incomplete_needs_both_sides() {
        let mut store = store_with(vec![
            file("a.py", 0.6, 1),
            file("b.py", 0.7, 2),
            file("c.py", 0.0, 0),
        ]);
        store.clone_pairs = Some(vec![clone("a.py", "b.py"), clone("a.py", "c.py")]);

        let findings = DuplicateIncompleteFinder.find(&store);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].files, vec!["a.py", "b.py"]);
        assert!((findings[0].severity - 0.90).abs() < 1e-9);
        assert_eq!(findings[0].evidence[3].value, 3.0);
    }
}
