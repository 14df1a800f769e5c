//! File semantics
//!
//! Modules:
//! - roles: decision tree assigning each file a [`Role`]
//! - concepts: tiered concept extraction and import fingerprints
//! - naming: drift between a file's name and its concepts
//! - completeness: TODO density and docstring coverage
//! - models: semantic data structures

pub mod completeness;
pub mod concepts;
pub mod models;
pub mod naming;
pub mod roles;

pub use concepts::ConceptExtractor;
pub use models::{Concept, FileSemantics, Role, GENERIC_FILENAMES};
pub use roles::classify_role;

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::scanning::FileSyntax;

/// Roles for every file, keyed by path
pub fn classify_roles(files: &[FileSyntax]) -> HashMap<String, Role> {
    files
        .iter()
        .map(|f| (f.path.clone(), classify_role(f)))
        .collect()
}

/// Semantics for every file. `contents` supplies raw text for docstring
/// detection; missing entries are treated as empty.
pub fn analyze_semantics(
    files: &[FileSyntax],
    roles: &HashMap<String, Role>,
    contents: &BTreeMap<String, String>,
) -> BTreeMap<String, FileSemantics> {
    let mut extractor = ConceptExtractor::new();
    for file in files {
        extractor.add_file(file);
    }
    extractor.compute_idf();

    let semantics: BTreeMap<String, FileSemantics> = files
        .iter()
        .map(|file| {
            let role = roles.get(&file.path).copied().unwrap_or(Role::Unknown);
            let extracted = extractor.extract(file, role);
            let content = contents.get(&file.path).map(String::as_str).unwrap_or("");
            let semantics = FileSemantics {
                path: file.path.clone(),
                role,
                naming_drift: naming::naming_drift(&file.path, &extracted.concepts, extracted.tier),
                concepts: extracted.concepts,
                concept_entropy: extracted.entropy,
                tier: extracted.tier,
                todo_density: completeness::todo_density(file.todo_count, file.lines),
                docstring_coverage: completeness::docstring_coverage(file, content),
                import_fingerprint: extractor.import_fingerprint(&file.path),
            };
            (file.path.clone(), semantics)
        })
        .collect();

    let mut role_counts: BTreeMap<Role, usize> = BTreeMap::new();
    for s in semantics.values() {
        *role_counts.entry(s.role).or_insert(0) += 1;
    }
    debug!("Semantics for {} files, roles: {:?}", semantics.len(), role_counts);
    semantics
}
