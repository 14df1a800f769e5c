//! Numeric building blocks shared by every analysis stage
//!
//! Modules:
//! - entropy: Shannon entropy, normalized entropy, KL divergence
//! - gini: inequality coefficient
//! - compression: zlib compression ratio and normalized compression distance
//! - robust: median, MAD, modified z-scores
//! - information: mutual information of co-occurring events
//! - stats: means, percentiles, regression slope, cosine similarity

pub mod compression;
pub mod entropy;
pub mod gini;
pub mod information;
pub mod robust;
pub mod stats;

pub use compression::{compression_ratio, ncd};
pub use gini::gini;
