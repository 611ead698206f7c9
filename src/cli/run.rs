//! Command execution for the CLI.
//!
//! This module handles running CLI commands and producing output.

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::tasks::{
    export_csv_path, import_csv_path, open_store, reconcile, CommitOutcome, Draft, EditSession,
    Field, RecordId, RecordStore, Screen, StoreLocation, TimeAdjustment, TimeSpentAccumulator,
};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, warn};

/// Exit code for an update refused because the task is DONE or CANCELLED.
pub const EXIT_REJECTED: u8 = 2;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

/// Run a CLI command, loading config from the location the flags name.
pub fn run(cli: Cli) -> CliOutput {
    match Config::load(cli.config.as_deref()) {
        Ok(config) => run_with_config(cli, &config),
        Err(e) => error_output(format!("Error loading config: {e}")),
    }
}

/// Run a CLI command with an already loaded config.
pub fn run_with_config(cli: Cli, config: &Config) -> CliOutput {
    debug!(command = ?cli.command, "running");
    let file = cli.file.as_deref();
    if cli.command.is_mutating() && config.store_location(file) == StoreLocation::InMemory {
        warn!("no database file given; changes will be lost on exit");
    }
    match cli.command {
        Command::Version => run_version(),
        Command::List { screen } => {
            with_store(config, file, |store| run_list(store, config, screen))
        }
        Command::Add { title } => with_store(config, file, |store| run_add(store, config, title)),
        Command::Clone { id } => with_store(config, file, |store| run_clone(store, config, id)),
        Command::Update { id, state, category, priority, title, points, details } => {
            let edits = [
                (Field::State, state),
                (Field::Category, category),
                (Field::Priority, priority),
                (Field::Title, title),
                (Field::Points, points),
                (Field::Details, details),
            ];
            with_store(config, file, |store| run_update(store, id, &edits))
        }
        Command::Time { id, inc, dec } => with_store(config, file, |store| {
            run_time(store, id, inc.unwrap_or(0), dec.unwrap_or(0))
        }),
        Command::Export { path } => with_store(config, file, |store| run_export(store, &path)),
        Command::Import { path } => with_store(config, file, |store| run_import(store, &path)),
        Command::Categories => {
            with_store(config, file, |store| Ok(json_output(&store.get_categories()?)))
        }
        Command::States => with_store(config, file, |store| Ok(json_output(&store.get_states()?))),
        Command::Priorities => {
            with_store(config, file, |store| Ok(json_output(&store.get_priorities()?)))
        }
    }
}

/// Open the configured store, run `f`, and close the store.
fn with_store<F>(config: &Config, file: Option<&Path>, f: F) -> CliOutput
where
    F: FnOnce(&mut dyn RecordStore) -> Result<CliOutput>,
{
    let location = config.store_location(file);
    let mut store = match open_store(config.backend, &location, config.load_options()) {
        Ok(store) => store,
        Err(e) => return error_output(format!("Error opening task store: {e}")),
    };

    let output = f(store.as_mut());
    let closed = store.close();
    match (output, closed) {
        (Ok(output), Ok(())) => output,
        (Err(e), _) | (Ok(_), Err(e)) => error_output(format!("Error: {e}")),
    }
}

// === Utility Commands ===

fn run_version() -> CliOutput {
    success_output(format!("utasker v{}", crate::VERSION))
}

// === Task Commands ===

fn run_list(store: &mut dyn RecordStore, config: &Config, screen: Screen) -> Result<CliOutput> {
    let mut session = EditSession::new(screen, config.column_map()?);
    session.activate(store)?;
    let listing = ScreenListing {
        screen: screen.as_str(),
        columns: session.headers(),
        rows: session.table(),
    };
    Ok(json_output(&listing))
}

fn run_add(
    store: &mut dyn RecordStore,
    config: &Config,
    title: Option<String>,
) -> Result<CliOutput> {
    let mut session = EditSession::new(Screen::Backlog, config.column_map()?);
    session.activate(store)?;
    let record = session.add(store)?;

    let Some(title) = title else {
        return Ok(json_output(&record));
    };
    session.stage(Field::Title, &title)?;
    Ok(outcome_output(session.commit(store)?))
}

fn run_clone(store: &mut dyn RecordStore, config: &Config, id: RecordId) -> Result<CliOutput> {
    let source = store.get_record(id)?;
    let Some(screen) = [Screen::Backlog, Screen::Archive]
        .into_iter()
        .find(|screen| screen.shows(source.state))
    else {
        return Err(Error::Validation(format!(
            "task {id} is {} and cannot be cloned from the workbench",
            source.state
        )));
    };

    let mut session = EditSession::new(screen, config.column_map()?);
    session.activate(store)?;
    session.select_id(id)?;
    Ok(json_output(&session.clone_selected(store)?))
}

fn run_update(
    store: &mut dyn RecordStore,
    id: RecordId,
    edits: &[(Field, Option<String>)],
) -> Result<CliOutput> {
    let mut draft = Draft::default();
    for (field, text) in edits {
        if let Some(text) = text {
            draft.stage(*field, text)?;
        }
    }
    Ok(outcome_output(reconcile(store, id, &draft)?))
}

fn run_time(store: &mut dyn RecordStore, id: RecordId, inc: u32, dec: u32) -> Result<CliOutput> {
    let stored = store.get_record(id)?;
    let mut time = TimeSpentAccumulator::new(stored.time_spent);
    for _ in 0..inc {
        time.increment();
    }
    for _ in 0..dec {
        if let TimeAdjustment::Rejected { baseline, .. } = time.decrement() {
            return Ok(rejected_output(format!(
                "Time spent cannot go below the recorded {baseline} for task {id}"
            )));
        }
    }

    let draft = Draft { time_spent: Some(time.current()), ..Draft::default() };
    Ok(outcome_output(reconcile(store, id, &draft)?))
}

fn run_export(store: &mut dyn RecordStore, path: &Path) -> Result<CliOutput> {
    let exported = export_csv_path(store, path)?;
    Ok(json_output(&serde_json::json!({
        "exported": exported,
        "path": path.display().to_string(),
    })))
}

fn run_import(store: &mut dyn RecordStore, path: &Path) -> Result<CliOutput> {
    let created = import_csv_path(store, path)?;
    let ids: Vec<RecordId> = created.iter().map(|record| record.id).collect();
    Ok(json_output(&serde_json::json!({
        "imported": created.len(),
        "ids": ids,
    })))
}

// === Output Helpers ===

fn outcome_output(outcome: CommitOutcome) -> CliOutput {
    match outcome {
        CommitOutcome::Committed(record) => json_output(&record),
        CommitOutcome::Rejected(notice) => rejected_output(notice.to_string()),
    }
}

fn json_output<T: Serialize>(value: &T) -> CliOutput {
    match serde_json::to_string_pretty(value) {
        Ok(json) => CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![json], stderr: vec![] },
        Err(e) => error_output(e.to_string()),
    }
}

fn success_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![message], stderr: vec![] }
}

fn error_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message] }
}

fn rejected_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::from(EXIT_REJECTED), stdout: vec![], stderr: vec![message] }
}

// === Output Types ===

/// Table shown by `list`.
#[derive(Debug, Serialize)]
struct ScreenListing {
    screen: &'static str,
    columns: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}
