//! Finder implementations
//!
//! Modules:
//! - hotspots: central or volatile files (high_risk_hub, god_file, unstable_file,
//!   weak_link, knowledge_silo)
//! - wiring: incomplete or disconnected code (hollow_code, phantom_imports,
//!   orphan_code, naming_drift)
//! - coupling: file pairs that move together or apart (hidden_coupling,
//!   dead_dependency, copy_paste_clone, accidental_coupling)
//! - architecture: module-level structure (boundary_mismatch, layer_violation,
//!   zone_of_pain, flat_architecture)
//! - churn: change history of files and directories (bug_attractor, bug_magnet,
//!   thrashing_code, directory_hotspot)
//! - ownership: who knows and reviews the code (truck_factor, review_blindspot,
//!   conway_violation)
//! - completeness: unfinished code (incomplete_implementation, duplicate_incomplete)
//! - persistence: earlier recorded runs (chronic_problem, architecture_erosion)

pub mod architecture;
pub mod churn;
pub mod completeness;
pub mod coupling;
pub mod hotspots;
pub mod ownership;
pub mod persistence;
pub mod wiring;

use super::engine::Finder;
use super::store::AnalysisStore;
use crate::signals::{NormalizationTier, SignalField};

pub use architecture::{
    BoundaryMismatchFinder, FlatArchitectureFinder, LayerViolationFinder, ZoneOfPainFinder,
};
pub use churn::{BugAttractorFinder, BugMagnetFinder, DirectoryHotspotFinder, ThrashingCodeFinder};
pub use completeness::{DuplicateIncompleteFinder, IncompleteImplementationFinder};
pub use coupling::{
    AccidentalCouplingFinder, CopyPasteCloneFinder, DeadDependencyFinder, HiddenCouplingFinder,
};
pub use hotspots::{
    GodFileFinder, HighRiskHubFinder, KnowledgeSiloFinder, UnstableFileFinder, WeakLinkFinder,
};
pub use ownership::{ConwayViolationFinder, ReviewBlindspotFinder, TruckFactorFinder};
pub use persistence::{ArchitectureErosionFinder, ChronicProblemFinder};
pub use wiring::{HollowCodeFinder, NamingDriftFinder, OrphanCodeFinder, PhantomImportsFinder};

/// Percentile-based finders stay quiet below this many files
const MIN_FILES: usize = 5;

pub fn all_finders() -> Vec<Box<dyn Finder>> {
    vec![
        Box::new(HighRiskHubFinder),
        Box::new(GodFileFinder),
        Box::new(UnstableFileFinder),
        Box::new(WeakLinkFinder),
        Box::new(KnowledgeSiloFinder),
        Box::new(HollowCodeFinder),
        Box::new(PhantomImportsFinder),
        Box::new(OrphanCodeFinder),
        Box::new(NamingDriftFinder),
        Box::new(HiddenCouplingFinder),
        Box::new(DeadDependencyFinder),
        Box::new(CopyPasteCloneFinder),
        Box::new(BoundaryMismatchFinder),
        Box::new(LayerViolationFinder),
        Box::new(ZoneOfPainFinder),
        Box::new(FlatArchitectureFinder),
        Box::new(AccidentalCouplingFinder),
        Box::new(BugAttractorFinder),
        Box::new(BugMagnetFinder),
        Box::new(ThrashingCodeFinder),
        Box::new(DirectoryHotspotFinder),
        Box::new(TruckFactorFinder),
        Box::new(ReviewBlindspotFinder),
        Box::new(ConwayViolationFinder),
        Box::new(IncompleteImplementationFinder),
        Box::new(DuplicateIncompleteFinder),
        Box::new(ChronicProblemFinder),
        Box::new(ArchitectureErosionFinder),
    ]
}

/// The signal field when it has percentiles
fn tiered_field(store: &AnalysisStore) -> Option<&SignalField> {
    store
        .signal_field
        .as_ref()
        .filter(|f| f.tier != NormalizationTier::Absolute)
}

/// The signal field when it has percentiles and enough files to rank
fn ranked_field(store: &AnalysisStore) -> Option<&SignalField> {
    store
        .signal_field
        .as_ref()
        .filter(|f| f.tier != NormalizationTier::Absolute && f.per_file.len() >= MIN_FILES)
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Highest severity first
fn by_severity(mut findings: Vec<super::Finding>) -> Vec<super::Finding> {
    findings.sort_by(|a, b| b.severity.total_cmp(&a.severity));
    findings
}
