// Shannon Insight Test Infrastructure
//
// Cross-module tests that run real files, real git histories and real
// SQLite databases through the pipeline. Unit tests for individual
// formulas live next to the code in #[cfg(test)] modules.

// ============================================================================
// HELPERS - Temp directories, fixture paths, throwaway git repositories
// ============================================================================
pub mod helpers;

// ============================================================================
// SCANNING TESTS - Tree-sitter extraction against the sample fixtures
// ============================================================================
pub mod scanning_tests; // sample.c / sample.cpp / Python fixtures, discovery + parallel scan

pub mod semantics_tests; // Role classification and completeness on fixtures

// ============================================================================
// HISTORY TESTS - Git mining (skipped when git is unavailable)
// ============================================================================
pub mod temporal_tests; // Churn series, co-change and bus factor from scripted commits

// ============================================================================
// SIGNAL + INSIGHT TESTS - Fusion and finders end to end
// ============================================================================
pub mod insights_tests; // InsightAnalyzer on temp projects
pub mod signals_tests; // Signal field invariants on analyzed projects


// ============================================================================
// CONFIG + CLI TESTS - Configuration resolution and command output
// ============================================================================
pub mod cli_tests; // Commands driven against temp projects with captured output
