//! Signal fusion: one record of numbers per file, module and codebase
//!
//! Modules:
//! - models: FileSignals, ModuleSignals, DirectorySignals, GlobalSignals
//! - normalization: percentiles with absolute floors
//! - composites: cognitive load, risk, wiring and health scores
//! - laplacian: per-file risk relative to graph neighbours
//! - fusion: the typestate pipeline that fills a [`SignalField`]

pub mod composites;
pub mod fusion;
pub mod laplacian;
pub mod models;
pub mod normalization;

pub use composites::cognitive_load;
pub use fusion::{build_signal_field, FusionPipeline};
pub use models::{
    DirectorySignals, FileSignals, GlobalSignals, ModuleSignals, NormalizationTier, SignalField,
};
pub use normalization::NORMALIZABLE_SIGNALS;
