//! Semantic model of a file: role, concepts, naming drift, completeness

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What a file is for. Variant order is the classification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Test,
    EntryPoint,
    Interface,
    Constant,
    Exception,
    Model,
    Cli,
    Service,
    Migration,
    Utility,
    Config,
    Unknown,
}

impl Role {
    pub const ALL: [Role; 12] = [
        Role::Test,
        Role::EntryPoint,
        Role::Interface,
        Role::Constant,
        Role::Exception,
        Role::Model,
        Role::Cli,
        Role::Service,
        Role::Migration,
        Role::Utility,
        Role::Config,
        Role::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Test => "TEST",
            Role::EntryPoint => "ENTRY_POINT",
            Role::Interface => "INTERFACE",
            Role::Constant => "CONSTANT",
            Role::Exception => "EXCEPTION",
            Role::Model => "MODEL",
            Role::Cli => "CLI",
            Role::Service => "SERVICE",
            Role::Migration => "MIGRATION",
            Role::Utility => "UTILITY",
            Role::Config => "CONFIG",
            Role::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topic a file is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub topic: String,
    /// Share of the file's concept mass; weights of a file sum to 1
    pub weight: f64,
    pub keywords: Vec<String>,
}

/// Semantic facts for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSemantics {
    pub path: String,
    pub role: Role,
    pub concepts: Vec<Concept>,
    pub concept_entropy: f64,
    /// 1, 2 or 3: how much vocabulary the file had for concept extraction
    pub tier: u8,
    pub naming_drift: f64,
    /// TODO-style markers per 100 lines
    pub todo_density: f64,
    /// Documented definitions / definitions; Python only
    pub docstring_coverage: Option<f64>,
    /// Import source -> surprise in bits
    pub import_fingerprint: BTreeMap<String, f64>,
}

impl FileSemantics {
    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    pub fn semantic_coherence(&self) -> f64 {
        1.0 / (1.0 + self.concept_entropy)
    }

    /// Heaviest concept, or the role name when nothing was extracted
    pub fn primary_concept(&self) -> String {
        self.concepts
            .iter()
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
            .map(|c| c.topic.clone())
            .unwrap_or_else(|| self.role.as_str().to_lowercase())
    }
}

/// Stems that say nothing about their content and never drift
pub const GENERIC_FILENAMES: &[&str] = &[
    "utils",
    "util",
    "utilities",
    "helpers",
    "helper",
    "common",
    "misc",
    "shared",
    "base",
    "core",
    "__init__",
    "index",
    "main",
    "app",
    "config",
    "settings",
    "constants",
    "types",
    "models",
    "schemas",
    "exceptions",
    "errors",
    "mod",
    "lib",
];
