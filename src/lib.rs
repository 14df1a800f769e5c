//! Shannon Insight - codebase analysis library
//!
//! Parses a repository with tree-sitter, builds its dependency graph, mines
//! git history, fuses everything into per-file, per-module and codebase
//! signals, and turns those signals into ranked findings.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod graph;
pub mod insights;
pub mod language; // Shared language support (tree-sitter configuration)
pub mod math;
pub mod scanning;
pub mod semantics;
pub mod signals;
pub mod temporal;

#[cfg(test)]
pub mod tests;

// Re-export common types
pub use analysis::{InsightAnalyzer, InsightResult};
pub use config::AnalysisConfig;
pub use error::ShannonError;
pub use insights::Finding;
