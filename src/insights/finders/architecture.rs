//! Module-level findings: misaligned directories, layering breaks, rigid
//! modules and codebases without layers

use super::{by_severity, file_name, tiered_field};
use crate::graph::ViolationKind;
use crate::insights::engine::Finder;
use crate::insights::models::{
    confidence_from_margins, Effort, Evidence, Finding, Polarity, Scope,
};
use crate::insights::store::{AnalysisStore, Requirement};

/// Directory whose files belong to other dependency clusters
pub struct BoundaryMismatchFinder;

impl BoundaryMismatchFinder {
    const SEVERITY: f64 = 0.6;
    const MIN_ALIGNMENT: f64 = 0.7;
    const SHOWN_MOVES: usize = 4;
}

impl Finder for BoundaryMismatchFinder {
    fn name(&self) -> &'static str {
        "boundary_mismatch"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::Structural]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(architecture) = store.architecture() else {
            return Vec::new();
        };
        let mut findings = Vec::new();

        for mismatch in &architecture.boundary_mismatches {
            let module_path = mismatch.module_path.as_str();
            if module_path.is_empty() || module_path == "." {
                continue;
            }
            let moves: Vec<&(String, String)> = mismatch
                .misplaced_files
                .iter()
                .filter(|(_, target)| {
                    !target.is_empty() && target != module_path && target != "." && target != "unknown"
                })
                .collect();
            if moves.is_empty() {
                continue;
            }
            let Some(module) = architecture.modules.get(module_path) else {
                continue;
            };
            if module.file_count() <= 2 || module.boundary_alignment >= Self::MIN_ALIGNMENT {
                continue;
            }

            let alignment = module.boundary_alignment;
            let clusters = mismatch.community_distribution.len();
            let mut relocations: Vec<String> = moves
                .iter()
                .take(Self::SHOWN_MOVES)
                .map(|(file, target)| format!("  {} is more connected to {}/", file_name(file), target))
                .collect();
            if moves.len() > Self::SHOWN_MOVES {
                relocations.push(format!("  ...and {} more", moves.len() - Self::SHOWN_MOVES));
            }

            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: Self::SEVERITY * (1.0 - alignment).clamp(0.1, 1.0),
                title: format!("Boundary mismatch: {module_path}/"),
                files: moves.iter().map(|(file, _)| file.clone()).collect(),
                evidence: vec![
                    Evidence::new(
                        "boundary_alignment",
                        alignment,
                        0.0,
                        format!(
                            "only {:.0}% of files in this directory share its dominant cluster",
                            alignment * 100.0
                        ),
                    ),
                    Evidence::new(
                        "community_count",
                        clusters as f64,
                        0.0,
                        format!("dependency analysis found {clusters} distinct clusters inside this directory"),
                    ),
                ],
                suggestion: format!(
                    "Files in {module_path}/ belong to {clusters} clusters. Consider moving:\n{}",
                    relocations.join("\n")
                ),
                confidence: 0.7,
                effort: Effort::High,
                scope: Scope::Module,
            });
        }
        by_severity(findings)
    }
}

/// Module import that runs against the inferred layering
pub struct LayerViolationFinder;

impl LayerViolationFinder {
    const SEVERITY: f64 = 0.52;
}

impl Finder for LayerViolationFinder {
    fn name(&self) -> &'static str {
        "layer_violation"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::Architecture]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(architecture) = store.architecture().filter(|_| tiered_field(store).is_some()) else {
            return Vec::new();
        };

        architecture
            .violations
            .iter()
            .filter(|v| {
                let blank = |m: &str| m.is_empty() || m == ".";
                !blank(&v.source_module) && !blank(&v.target_module)
            })
            .map(|v| {
                let (src, tgt) = (&v.source_module, &v.target_module);
                let kind = match v.kind {
                    ViolationKind::Backward => "backward",
                    ViolationKind::Skip => "skip",
                };
                Finding {
                    finding_type: self.name().to_string(),
                    severity: Self::SEVERITY,
                    title: format!(
                        "Layer violation: {src}/ imports {tgt}/ (L{}→L{})",
                        v.source_layer, v.target_layer
                    ),
                    files: vec![src.clone(), tgt.clone()],
                    evidence: vec![
                        Evidence::new(
                            "source_layer",
                            v.source_layer as f64,
                            0.0,
                            format!("{src} at layer {}", v.source_layer),
                        ),
                        Evidence::new(
                            "target_layer",
                            v.target_layer as f64,
                            0.0,
                            format!("{tgt} at layer {}", v.target_layer),
                        ),
                        Evidence::new(
                            "violation_type",
                            v.edge_count as f64,
                            0.0,
                            format!("Violation: {kind} ({} file imports)", v.edge_count),
                        ),
                    ],
                    suggestion: format!(
                        "'{src}' at layer {} imports '{tgt}' at layer {}. Inject dependency or restructure.",
                        v.source_layer, v.target_layer
                    ),
                    confidence: 1.0,
                    effort: Effort::Medium,
                    scope: Scope::ModulePair,
                }
            })
            .collect()
    }
}

/// Concrete module that everything depends on
pub struct ZoneOfPainFinder;

impl ZoneOfPainFinder {
    const MAX_ABSTRACTNESS: f64 = 0.3;
    const MAX_INSTABILITY: f64 = 0.3;
}

impl Finder for ZoneOfPainFinder {
    fn name(&self) -> &'static str {
        "zone_of_pain"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField, Requirement::Architecture]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = tiered_field(store) else {
            return Vec::new();
        };
        let mut findings = Vec::new();

        for (module_path, ms) in &field.per_module {
            if module_path.is_empty() || module_path == "." {
                continue;
            }
            // Isolated modules have no instability to judge
            let Some(instability) = ms.instability else {
                continue;
            };
            let abstractness = ms.abstractness;
            if abstractness >= Self::MAX_ABSTRACTNESS || instability >= Self::MAX_INSTABILITY {
                continue;
            }

            let severity = 0.60 + 0.10 * (1.0 - abstractness.max(instability));
            findings.push(Finding {
                finding_type: self.name().to_string(),
                severity: severity.min(0.70),
                title: format!(
                    "Zone of Pain: {module_path}/ (A={abstractness:.2}, I={instability:.2})"
                ),
                files: vec![module_path.clone()],
                evidence: vec![
                    Evidence::new(
                        "abstractness",
                        abstractness,
                        0.0,
                        format!("{:.0}% abstract types", abstractness * 100.0),
                    ),
                    Evidence::new(
                        "instability",
                        instability,
                        0.0,
                        "mostly depended on, rarely depends on others".to_string(),
                    ),
                    Evidence::new(
                        "main_seq_distance",
                        ms.main_seq_distance,
                        0.0,
                        format!("{:.2} from the main sequence", ms.main_seq_distance),
                    ),
                ],
                suggestion: format!(
                    "{module_path}/ is concrete and heavily depended on, so every change ripples outward. Extract interfaces or protocols that callers can depend on instead."
                ),
                confidence: confidence_from_margins(&[
                    (abstractness, Self::MAX_ABSTRACTNESS, Polarity::HighIsGood),
                    (instability, Self::MAX_INSTABILITY, Polarity::HighIsGood),
                ]),
                effort: Effort::High,
                scope: Scope::Module,
            });
        }
        by_severity(findings)
    }
}

/// Codebase with no depth: everything imports leaves, nothing composes them
pub struct FlatArchitectureFinder;

impl FlatArchitectureFinder {
    const SEVERITY: f64 = 0.60;
    const MAX_DEPTH: i64 = 1;
    const MIN_GLUE_DEFICIT: f64 = 0.5;
}

impl Finder for FlatArchitectureFinder {
    fn name(&self) -> &'static str {
        "flat_architecture"
    }

    fn requires(&self) -> &'static [Requirement] {
        &[Requirement::SignalField]
    }

    fn find(&self, store: &AnalysisStore) -> Vec<Finding> {
        let Some(field) = &store.signal_field else {
            return Vec::new();
        };
        // Negative depth marks files unreachable from any entry point
        let Some(max_depth) = field.per_file.values().map(|f| f.depth).filter(|d| *d >= 0).max()
        else {
            return Vec::new();
        };
        let glue_deficit = field.global.glue_deficit;
        if max_depth > Self::MAX_DEPTH || glue_deficit <= Self::MIN_GLUE_DEFICIT {
            return Vec::new();
        }

        vec![Finding {
            finding_type: self.name().to_string(),
            severity: Self::SEVERITY,
            title: "Flat architecture: no layering or orchestration".to_string(),
            files: Vec::new(),
            evidence: vec![
                Evidence::new(
                    "max_depth",
                    max_depth as f64,
                    0.0,
                    format!("deepest import chain from an entry point: {max_depth}"),
                ),
                Evidence::new(
                    "glue_deficit",
                    glue_deficit,
                    0.0,
                    format!("{:.0}% glue deficit (few files compose others)", glue_deficit * 100.0),
                ),
                Evidence::new(
                    "orphan_ratio",
                    field.global.orphan_ratio,
                    0.0,
                    format!("{:.0}% of files are orphans", field.global.orphan_ratio * 100.0),
                ),
            ],
            suggestion: "Entry points talk straight to leaf modules. Introduce a service or orchestration layer that composes them.".to_string(),
            confidence: confidence_from_margins(&[(
                glue_deficit,
                Self::MIN_GLUE_DEFICIT,
                Polarity::HighIsBad,
            )]),
            effort: Effort::High,
            scope: Scope::Codebase,
        }]
    }
}
