// CLI Command Tests
//
// Commands run against temp projects with stdout swapped for a shared
// buffer, in both output formats.

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::cli::{commands, CommandContext, OutputFormat, OutputWriter};
use crate::config::AnalysisConfig;
use crate::error::ShannonError;
use crate::tests::helpers::{unique_temp_dir, write_file};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn take(&self) -> String {
        let mut buf = self.0.lock().unwrap();
        let text = String::from_utf8_lossy(&buf).into_owned();
        buf.clear();
        text
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat) -> (OutputWriter, Captured) {
    let captured = Captured::default();
    (OutputWriter::with_writer(format, Box::new(captured.clone())), captured)
}

fn context(root: &Path) -> CommandContext {
    let config = AnalysisConfig {
        quiet: true,
        parallel_workers: Some(2),
        ..AnalysisConfig::default()
    };
    CommandContext::new(root, config)
}

fn small_project(root: &Path) {
    write_file(
        root,
        "src/main.py",
        "import src.store\n\nif __name__ == \"__main__\":\n    src.store.save({})\n",
    );
    write_file(root, "src/store.py", "import src.ghost\n\ndef save(record):\n    return record\n");
    write_file(root, "src/unused.py", "def nothing():\n    return None\n");
}

fn json(text: &str) -> serde_json::Value {
    serde_json::from_str(text).expect("command output should be valid JSON")
}

#[cfg(test)]
mod analyze_command_tests {
    use super::*;

    #[test]
    fn test_analyze_text_report() {
        let dir = unique_temp_dir("cli_analyze_text");
        small_project(dir.path());
        let ctx = context(dir.path());
        let (mut out, captured) = writer(OutputFormat::Text);

        commands::analyze(&ctx, &mut out, None, true).unwrap();

        let text = captured.take();
        assert!(text.contains("PHANTOM IMPORTS"), "{}", text);
        assert!(text.contains("src/store.py"));
        // --no-save leaves no history behind
        assert!(!dir.path().join(".shannon").exists());
    }

    #[test]
    fn test_analyze_json_and_snapshot() {
        let dir = unique_temp_dir("cli_analyze_json");
        small_project(dir.path());
        let ctx = context(dir.path());
        let (mut out, captured) = writer(OutputFormat::Json);

        commands::analyze(&ctx, &mut out, Some(1), false).unwrap();

        let value = json(&captured.take());
        assert_eq!(value["findings"].as_array().unwrap().len(), 1);
        assert_eq!(value["store_summary"]["total_files"], 3);
        assert!(value["file_signals"]["src/store.py"].is_object());
        assert!(dir.path().join(".shannon").join("history.db").exists());
    }

    #[test]
    fn test_history_disabled() {
        let dir = unique_temp_dir("cli_history_disabled");
        small_project(dir.path());
        let mut config = AnalysisConfig {
            quiet: true,
            ..AnalysisConfig::default()
        };
        config.enable_history = false;
        let ctx = CommandContext::new(dir.path(), config);
        let (mut out, _) = writer(OutputFormat::Text);

        commands::analyze(&ctx, &mut out, None, false).unwrap();
        assert!(!dir.path().join(".shannon").exists());

        let err = commands::history(&ctx, &mut out, 10).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShannonError>(),
            Some(ShannonError::HistoryDisabled)
        ));
    }
}

#[cfg(test)]
mod inspection_command_tests {
    use super::*;

    #[test]
    fn test_explain_accepts_relative_and_dotted_paths() {
        let dir = unique_temp_dir("cli_explain");
        small_project(dir.path());
        let ctx = context(dir.path());
        let (mut out, captured) = writer(OutputFormat::Json);

        commands::explain(&ctx, &mut out, "./src/store.py").unwrap();

        let value = json(&captured.take());
        assert_eq!(value["path"], "src/store.py");
        assert_eq!(value["signals"]["phantom_import_count"], 1);
        let types: Vec<&str> = value["findings"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["finding_type"].as_str())
            .collect();
        assert!(types.contains(&"phantom_imports"));
    }

    #[test]
    fn test_explain_unknown_file() {
        let dir = unique_temp_dir("cli_explain_missing");
        small_project(dir.path());
        let ctx = context(dir.path());
        let (mut out, _) = writer(OutputFormat::Text);

        assert!(commands::explain(&ctx, &mut out, "src/nowhere.py").is_err());
    }

    #[test]
    fn test_health_report() {
        let dir = unique_temp_dir("cli_health");
        small_project(dir.path());
        let ctx = context(dir.path());
        let (mut out, captured) = writer(OutputFormat::Json);

        commands::health(&ctx, &mut out).unwrap();

        let value = json(&captured.take());
        assert_eq!(value["tier"], "ABSOLUTE");
        assert_eq!(value["modules"].as_array().unwrap().len(), 1);
        assert!(value["global"]["codebase_health"].is_number());
        let directories = value["directories"].as_array().unwrap();
        assert_eq!(directories.len(), 1);
        assert_eq!(directories[0]["path"], "src");
        assert_eq!(directories[0]["file_count"], 3);
    }
}

#[cfg(test)]
mod history_command_tests {
    use super::*;

    /// Two recorded runs with a file added in between
    fn two_snapshots(root: &Path, ctx: &CommandContext) {
        let (mut out, _) = writer(OutputFormat::Text);
        commands::analyze(ctx, &mut out, None, false).unwrap();
        write_file(root, "src/extra.py", "import src.store\n\ndef more():\n    return 2\n");
        commands::analyze(ctx, &mut out, None, false).unwrap();
    }

    #[test]
    fn test_history_lists_runs() {
        let dir = unique_temp_dir("cli_history");
        small_project(dir.path());
        let ctx = context(dir.path());
        two_snapshots(dir.path(), &ctx);
        let (mut out, captured) = writer(OutputFormat::Json);

        commands::history(&ctx, &mut out, 10).unwrap();

        let value = json(&captured.take());
        let runs = value.as_array().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0]["file_count"], 4);
        assert_eq!(runs[1]["file_count"], 3);
    }

    #[test]
    fn test_diff_defaults_to_latest_two() {
        let dir = unique_temp_dir("cli_diff");
        small_project(dir.path());
        let ctx = context(dir.path());
        two_snapshots(dir.path(), &ctx);
        let (mut out, captured) = writer(OutputFormat::Json);

        commands::diff(&ctx, &mut out, false, None).unwrap();

        let value = json(&captured.take());
        assert_eq!(value["added_files"], serde_json::json!(["src/extra.py"]));
        assert!(value["old_id"].as_i64().unwrap() < value["new_id"].as_i64().unwrap());
    }

    #[test]
    fn test_diff_needs_two_snapshots_or_a_baseline() {
        let dir = unique_temp_dir("cli_diff_errors");
        small_project(dir.path());
        let ctx = context(dir.path());
        let (mut out, _) = writer(OutputFormat::Text);
        commands::analyze(&ctx, &mut out, None, false).unwrap();

        assert!(commands::diff(&ctx, &mut out, false, None).is_err());
        let err = commands::diff(&ctx, &mut out, true, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShannonError>(),
            Some(ShannonError::NoBaseline)
        ));
    }

    #[test]
    fn test_baseline_then_diff_against_it() {
        let dir = unique_temp_dir("cli_baseline");
        small_project(dir.path());
        let ctx = context(dir.path());
        let (mut out, captured) = writer(OutputFormat::Json);
        commands::analyze(&ctx, &mut out, None, false).unwrap();
        captured.take();

        commands::baseline_set(&ctx, &mut out, None).unwrap();
        let baseline = json(&captured.take())["baseline"].as_i64().unwrap();

        write_file(dir.path(), "src/extra.py", "def more():\n    return 2\n");
        commands::analyze(&ctx, &mut out, None, false).unwrap();
        captured.take();

        commands::diff(&ctx, &mut out, true, None).unwrap();
        let value = json(&captured.take());
        assert_eq!(value["old_id"].as_i64(), Some(baseline));
        assert_eq!(value["added_files"], serde_json::json!(["src/extra.py"]));
    }

    #[test]
    fn test_trend_for_codebase_and_file() {
        let dir = unique_temp_dir("cli_trend");
        small_project(dir.path());
        let ctx = context(dir.path());
        two_snapshots(dir.path(), &ctx);
        let (mut out, captured) = writer(OutputFormat::Json);

        commands::trend(&ctx, &mut out, "orphan_ratio", None).unwrap();
        let value = json(&captured.take());
        assert_eq!(value["points"].as_array().unwrap().len(), 2);
        assert!(value["file"].is_null());

        commands::trend(&ctx, &mut out, "lines", Some("src/store.py")).unwrap();
        let value = json(&captured.take());
        assert_eq!(value["file"], "src/store.py");
        let points = value["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["value"], points[1]["value"]);
    }

    #[test]
    fn test_repeated_findings_become_chronic() {
        let dir = unique_temp_dir("cli_chronic");
        small_project(dir.path());
        let ctx = context(dir.path());
        let (mut out, captured) = writer(OutputFormat::Json);
        for _ in 0..3 {
            commands::analyze(&ctx, &mut out, None, false).unwrap();
            captured.take();
        }

        commands::analyze(&ctx, &mut out, None, false).unwrap();

        let value = json(&captured.take());
        let chronic: Vec<&serde_json::Value> = value["findings"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|f| f["finding_type"] == "chronic_problem")
            .collect();
        assert!(!chronic.is_empty());
        assert!(chronic.iter().all(|f| f["title"]
            .as_str()
            .is_some_and(|t| t.ends_with("(unresolved for 3 runs)"))));
        assert!(chronic
            .iter()
            .any(|f| f["files"] == serde_json::json!(["src/store.py"])));
    }

    #[test]
    fn test_history_text_when_empty() {
        let dir = unique_temp_dir("cli_history_empty");
        small_project(dir.path());
        let ctx = context(dir.path());
        let (mut out, captured) = writer(OutputFormat::Text);

        commands::history(&ctx, &mut out, 5).unwrap();
        assert!(captured.take().contains("No snapshots yet"));
    }
}
