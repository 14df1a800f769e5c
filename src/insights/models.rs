//! Findings and the evidence behind them

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::database::identity::compute_identity_key;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub signal: String,
    pub value: f64,
    /// Position in this codebase's distribution, 0-1 (0 when not ranked)
    pub percentile: f64,
    pub description: String,
}

impl Evidence {
    pub fn new(signal: &str, value: f64, percentile: f64, description: impl Into<String>) -> Self {
        Self {
            signal: signal.to_string(),
            value,
            percentile,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::Low => "LOW",
            Effort::Medium => "MEDIUM",
            Effort::High => "HIGH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LOW" => Some(Effort::Low),
            "MEDIUM" => Some(Effort::Medium),
            "HIGH" => Some(Effort::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    File,
    FilePair,
    Module,
    ModulePair,
    Codebase,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::File => "FILE",
            Scope::FilePair => "FILE_PAIR",
            Scope::Module => "MODULE",
            Scope::ModulePair => "MODULE_PAIR",
            Scope::Codebase => "CODEBASE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FILE" => Some(Scope::File),
            "FILE_PAIR" => Some(Scope::FilePair),
            "MODULE" => Some(Scope::Module),
            "MODULE_PAIR" => Some(Scope::ModulePair),
            "CODEBASE" => Some(Scope::Codebase),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub finding_type: String,
    /// 0.0 to 1.0
    pub severity: f64,
    pub title: String,
    pub files: Vec<String>,
    pub evidence: Vec<Evidence>,
    pub suggestion: String,
    pub confidence: f64,
    pub effort: Effort,
    pub scope: Scope,
}

impl Finding {
    /// Stable across runs as long as the same files are involved
    pub fn identity_key(&self) -> String {
        compute_identity_key(&self.finding_type, &self.files)
    }

    pub fn primary_file(&self) -> Option<&str> {
        self.files.first().map(String::as_str)
    }
}

/// Direction in which a signal is bad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HighIsBad,
    HighIsGood,
}

/// Mean margin past each threshold, each clamped to [0, 1]
///
/// High-is-bad margins are `(actual - t) / (1 - t)`; high-is-good margins
/// are `(t - actual) / t`.
pub fn confidence_from_margins(triggered: &[(f64, f64, Polarity)]) -> f64 {
    if triggered.is_empty() {
        return 0.0;
    }
    let total: f64 = triggered
        .iter()
        .map(|&(actual, threshold, polarity)| {
            let margin = match polarity {
                Polarity::HighIsBad if threshold < 1.0 => (actual - threshold) / (1.0 - threshold),
                Polarity::HighIsGood if threshold > 0.0 => (threshold - actual) / threshold,
                _ => 0.0,
            };
            margin.clamp(0.0, 1.0)
        })
        .sum();
    total / triggered.len() as f64
}
