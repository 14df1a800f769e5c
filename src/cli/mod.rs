/// CLI support for the shannon-insight binary
///
/// Modules:
/// - commands: one function per subcommand
/// - output: text or JSON on stdout
/// - progress: scan progress on stderr
/// - report: text rendering of results and history
pub mod commands;
pub mod output;
pub mod progress;
pub mod report;

pub use commands::CommandContext;
pub use output::{OutputFormat, OutputWriter};
pub use progress::ProgressReporter;
