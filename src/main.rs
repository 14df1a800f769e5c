/// shannon-insight: codebase analysis from structure, semantics and history
///
/// Commands:
/// - analyze (default): rank findings and record a history snapshot
/// - explain: every signal for one file
/// - health: codebase and module health scores
/// - history / diff / trend / baseline: work with recorded snapshots
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use shannon_insight::cli::{commands, CommandContext, OutputFormat, OutputWriter};
use shannon_insight::config::AnalysisConfig;

#[derive(Parser)]
#[command(name = "shannon-insight")]
#[command(about = "Find where a codebase hurts: structure, semantics and git history fused into ranked findings", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory to analyze
    #[arg(short, long, global = true, default_value = ".")]
    path: PathBuf,

    /// Config file (defaults to <path>/shannon-insight.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormatArg,

    /// Write info-level logs to this file
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Info-level logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// No progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the codebase and report findings
    Analyze {
        /// Maximum number of findings to report
        #[arg(long)]
        max_findings: Option<usize>,

        /// Do not record a history snapshot
        #[arg(long)]
        no_save: bool,
    },

    /// Show every signal and finding for one file
    Explain {
        /// File path, relative to the analyzed directory
        file: String,
    },

    /// Codebase, module and file health scores
    Health,

    /// List recorded snapshots, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Compare two snapshots (default: the latest two)
    Diff {
        /// Compare the baseline against the latest snapshot
        #[arg(long, conflicts_with_all = ["old", "new"])]
        baseline: bool,

        /// Older snapshot id
        #[arg(requires = "new")]
        old: Option<i64>,

        /// Newer snapshot id
        new: Option<i64>,
    },

    /// History of one signal across snapshots
    Trend {
        /// Signal name, e.g. codebase_health or risk_score
        signal: String,

        /// Follow a file-level signal for this file
        #[arg(long)]
        file: Option<String>,
    },

    /// Manage the baseline snapshot
    Baseline {
        #[command(subcommand)]
        action: BaselineAction,
    },
}

#[derive(Subcommand)]
enum BaselineAction {
    /// Pin a snapshot as the baseline (default: the latest)
    Set { id: Option<i64> },
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormatArg {
    /// Human-readable report
    Text,
    /// Pretty-printed JSON
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AnalysisConfig::load(&cli.path, cli.config.as_deref())?;
    config.verbose |= cli.verbose;
    config.quiet |= cli.quiet;
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }

    init_logging(config.log_file.as_ref(), config.verbose)?;

    let format = match cli.format {
        OutputFormatArg::Text => OutputFormat::Text,
        OutputFormatArg::Json => OutputFormat::Json,
    };
    let mut out = OutputWriter::new(format);
    let ctx = CommandContext::new(cli.path, config);

    match cli.command.unwrap_or(Commands::Analyze {
        max_findings: None,
        no_save: false,
    }) {
        Commands::Analyze {
            max_findings,
            no_save,
        } => commands::analyze(&ctx, &mut out, max_findings, no_save),
        Commands::Explain { file } => commands::explain(&ctx, &mut out, &file),
        Commands::Health => commands::health(&ctx, &mut out),
        Commands::History { limit } => commands::history(&ctx, &mut out, limit),
        Commands::Diff { baseline, old, new } => {
            commands::diff(&ctx, &mut out, baseline, old.zip(new))
        }
        Commands::Trend { signal, file } => {
            commands::trend(&ctx, &mut out, &signal, file.as_deref())
        }
        Commands::Baseline {
            action: BaselineAction::Set { id },
        } => commands::baseline_set(&ctx, &mut out, id),
    }
}

/// Initialize logging with optional file output
fn init_logging(log_path: Option<&PathBuf>, verbose: bool) -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    if let Some(log_file) = log_path {
        // With log file: info+ to file, warn+ to stderr
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

        let file_appender = tracing_appender::rolling::never(
            log_file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new(".")),
            log_file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("shannon-insight.log"),
        );

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(file_appender.and(std::io::stderr.with_max_level(tracing::Level::WARN)))
            .init();

        eprintln!("📝 Logging to {:?}", log_file);
    } else {
        // No log file: warn+ to stderr only (unless RUST_LOG or --verbose)
        let default_level = if verbose { "info" } else { "warn" };
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}
