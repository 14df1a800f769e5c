//! Findings: what the signals say is worth fixing
//!
//! Modules:
//! - store: the [`AnalysisStore`] every stage writes into
//! - models: Finding, Evidence, effort and scope
//! - engine: the [`Finder`] trait and the ranking engine
//! - finders: the individual detectors

pub mod engine;
pub mod finders;
pub mod models;
pub mod store;

pub use engine::{Finder, InsightEngine};
pub use models::{confidence_from_margins, Effort, Evidence, Finding, Polarity, Scope};
pub use store::{AnalysisStore, HistoryContext, Requirement, StoreSummary, StructuralAnalysis};
