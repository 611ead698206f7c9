//! Tests for the CLI module.

use super::*;
use crate::config::Config;
use crate::tasks::{Record, State};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

/// Parse `args` (without the program name) against a scratch database.
fn run_in(dir: &Path, args: &[&str]) -> CliOutput {
    let db = dir.join("tasks.db");
    let mut argv = vec!["utasker".to_string(), "--file".to_string(), db.display().to_string()];
    argv.extend(args.iter().map(|arg| (*arg).to_string()));
    let cli = Cli::try_parse_from(argv).unwrap();
    run_with_config(cli, &Config::default())
}

fn parse_stdout<T: serde::de::DeserializeOwned>(output: &CliOutput) -> T {
    assert_eq!(output.exit_code, ExitCode::SUCCESS, "stderr: {:?}", output.stderr);
    serde_json::from_str(&output.stdout.join("\n")).unwrap()
}

#[test]
fn test_command_is_mutating() {
    assert!(Command::Add { title: None }.is_mutating());
    assert!(Command::Import { path: "x.csv".into() }.is_mutating());
    assert!(!Command::List { screen: Screen::Archive }.is_mutating());
    assert!(!Command::Version.is_mutating());
    assert!(!Command::Export { path: "x.csv".into() }.is_mutating());
}

#[test]
fn test_run_version() {
    let cli = Cli::try_parse_from(["utasker", "version"]).unwrap();
    let output = run_with_config(cli, &Config::default());
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stdout[0].contains(crate::VERSION));
}

#[test]
fn test_parse_rejects_unknown_screen() {
    assert!(Cli::try_parse_from(["utasker", "list", "--screen", "inbox"]).is_err());
    assert!(Cli::try_parse_from(["utasker", "list", "--screen", "Workbench"]).is_ok());
}

#[test]
fn test_time_needs_exactly_one_direction() {
    assert!(Cli::try_parse_from(["utasker", "time", "1"]).is_err());
    assert!(Cli::try_parse_from(["utasker", "time", "1", "--inc", "1", "--dec", "1"]).is_err());
    assert!(Cli::try_parse_from(["utasker", "time", "1", "--dec", "2"]).is_ok());
}

#[test]
fn test_add_and_list() {
    let dir = TempDir::new().unwrap();

    let record: Record = parse_stdout(&run_in(dir.path(), &["add"]));
    assert_eq!(record.id, RecordId(1));
    assert_eq!(record.title, "New Task");

    let record: Record = parse_stdout(&run_in(dir.path(), &["add", "--title", "Write spec"]));
    assert_eq!(record.id, RecordId(2));
    assert_eq!(record.title, "Write spec");

    let listing: serde_json::Value = parse_stdout(&run_in(dir.path(), &["list"]));
    assert_eq!(listing["screen"], "backlog");
    assert_eq!(listing["columns"][0], "ID");
    assert_eq!(listing["rows"].as_array().unwrap().len(), 2);
    assert_eq!(listing["rows"][1][4], "Write spec");

    let listing: serde_json::Value =
        parse_stdout(&run_in(dir.path(), &["list", "--screen", "archive"]));
    assert!(listing["rows"].as_array().unwrap().is_empty());
}

#[test]
fn test_update_example_scenario() {
    let dir = TempDir::new().unwrap();
    run_in(dir.path(), &["add"]);

    let record: Record = parse_stdout(&run_in(
        dir.path(),
        &["update", "1", "--title", "Write spec", "--points", "3"],
    ));
    assert_eq!(record.state, State::Backlog);
    assert_eq!(record.points, 3);
    assert!(record.time_spent.abs() < f64::EPSILON);

    let record: Record = parse_stdout(&run_in(dir.path(), &["update", "1", "--state", "DONE"]));
    assert_eq!(record.state, State::Done);

    let output = run_in(dir.path(), &["update", "1", "--state", "ACTIVE"]);
    assert_eq!(output.exit_code, ExitCode::from(EXIT_REJECTED));
    assert!(output.stderr[0].contains("Can't change state of DONE or CANCELLED Task"));

    let listing: serde_json::Value =
        parse_stdout(&run_in(dir.path(), &["list", "--screen", "archive"]));
    assert_eq!(listing["rows"][0][1], "DONE");
}

#[test]
fn test_update_validation_errors() {
    let dir = TempDir::new().unwrap();
    run_in(dir.path(), &["add"]);

    let output = run_in(dir.path(), &["update", "1", "--state", "Active"]);
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert!(output.stderr[0].contains("invalid state"));

    let output = run_in(dir.path(), &["update", "1", "--points", "many"]);
    assert_eq!(output.exit_code, ExitCode::from(1));

    let output = run_in(dir.path(), &["update", "9", "--title", "x"]);
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert!(output.stderr[0].contains("not found"));
}

#[test]
fn test_update_category_is_recorded() {
    let dir = TempDir::new().unwrap();
    run_in(dir.path(), &["add"]);
    run_in(dir.path(), &["update", "1", "--category", "garden"]);

    let categories: Vec<String> = parse_stdout(&run_in(dir.path(), &["categories"]));
    assert_eq!(categories, vec!["-".to_string(), "garden".to_string()]);
}

#[test]
fn test_time_tracking() {
    let dir = TempDir::new().unwrap();
    run_in(dir.path(), &["add"]);
    run_in(dir.path(), &["update", "1", "--state", "ACTIVE"]);

    let record: Record = parse_stdout(&run_in(dir.path(), &["time", "1", "--inc", "3"]));
    assert!((record.time_spent - 1.5).abs() < f64::EPSILON);

    let output = run_in(dir.path(), &["time", "1", "--dec", "1"]);
    assert_eq!(output.exit_code, ExitCode::from(EXIT_REJECTED));

    let listing: serde_json::Value =
        parse_stdout(&run_in(dir.path(), &["list", "--screen", "workbench"]));
    assert_eq!(listing["rows"][0][6], "1.5");
}

#[test]
fn test_clone() {
    let dir = TempDir::new().unwrap();
    run_in(dir.path(), &["add", "--title", "Original"]);

    let copy: Record = parse_stdout(&run_in(dir.path(), &["clone", "1"]));
    assert_eq!(copy.id, RecordId(2));
    assert_eq!(copy.title, "Clone of Original");

    run_in(dir.path(), &["update", "1", "--state", "ACTIVE"]);
    let output = run_in(dir.path(), &["clone", "1"]);
    assert_eq!(output.exit_code, ExitCode::from(1));

    run_in(dir.path(), &["update", "1", "--state", "CANCELLED"]);
    let copy: Record = parse_stdout(&run_in(dir.path(), &["clone", "1"]));
    assert_eq!(copy.id, RecordId(3));
    assert_eq!(copy.state, State::Backlog);
}

#[test]
fn test_export_and_import() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("tasks.csv");
    let csv_arg = csv_path.display().to_string();
    run_in(dir.path(), &["add", "--title", "One"]);
    run_in(dir.path(), &["add", "--title", "Two"]);

    let exported: serde_json::Value = parse_stdout(&run_in(dir.path(), &["export", &csv_arg]));
    assert_eq!(exported["exported"], 2);

    let imported: serde_json::Value = parse_stdout(&run_in(dir.path(), &["import", &csv_arg]));
    assert_eq!(imported["imported"], 2);
    assert_eq!(imported["ids"], serde_json::json!([3, 4]));
}

#[test]
fn test_reference_labels() {
    let dir = TempDir::new().unwrap();
    let states: Vec<String> = parse_stdout(&run_in(dir.path(), &["states"]));
    assert_eq!(states, State::list());
    let priorities: Vec<String> = parse_stdout(&run_in(dir.path(), &["priorities"]));
    assert_eq!(priorities, vec!["Low", "Medium", "High", "Critical"]);
}

#[test]
fn test_in_memory_store_does_not_persist() {
    let run_memory = |args: &[&str]| {
        let mut argv = vec!["utasker"];
        argv.extend_from_slice(args);
        run_with_config(Cli::try_parse_from(argv).unwrap(), &Config::default())
    };
    let record: Record = parse_stdout(&run_memory(&["add"]));
    assert_eq!(record.id, RecordId(1));
    let record: Record = parse_stdout(&run_memory(&["add"]));
    assert_eq!(record.id, RecordId(1));
}

#[test]
fn test_unopenable_store() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("tasks.db"), "not a database at all").unwrap();
    let output = run_in(dir.path(), &["list"]);
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert!(output.stderr[0].starts_with("Error opening task store"));
}

#[test]
fn test_run_loads_config_from_flag() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    let db_path = dir.path().join("configured.db");
    let config = Config {
        database: Some(db_path.clone()),
        seed_examples: true,
        ..Config::default()
    };
    config.save_to(&config_path).unwrap();

    let config_arg = config_path.display().to_string();
    let cli = Cli::try_parse_from(["utasker", "--config", &config_arg, "list"]).unwrap();
    let listing: serde_json::Value = parse_stdout(&run(cli));
    assert_eq!(listing["rows"].as_array().unwrap().len(), 3);
    assert!(db_path.exists());
}

#[test]
fn test_run_reports_bad_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "columns: [ID, ID]\n").unwrap();

    let config_arg = config_path.display().to_string();
    let cli = Cli::try_parse_from(["utasker", "--config", &config_arg, "list"]).unwrap();
    let output = run(cli);
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert!(output.stderr[0].contains("appears twice"));
}
