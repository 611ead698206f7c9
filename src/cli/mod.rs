//! Command-line interface for utasker.
//!
//! Every command prints JSON to stdout. Errors go to stderr with exit code 1;
//! updates refused because the task is DONE or CANCELLED exit with code 2.

mod run;

#[cfg(test)]
mod tests;

pub use run::{run, run_with_config, CliOutput, EXIT_REJECTED};

use crate::tasks::{RecordId, Screen};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Micro task manager with backlog, workbench and archive screens.
///
/// ## Quick Start
///
/// ```bash
/// # Capture a task
/// utasker -f tasks.db add --title "Write spec"
///
/// # Queue it and size it
/// utasker -f tasks.db update 1 --state UPCOMING --points 3
///
/// # Work on it and log an hour
/// utasker -f tasks.db update 1 --state ACTIVE
/// utasker -f tasks.db time 1 --inc 2
///
/// # See what is on the workbench
/// utasker -f tasks.db list --screen workbench
/// ```
#[derive(Parser, Debug)]
#[command(name = "utasker")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Task database file. Without one, tasks live in memory for this run.
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Config file (default: $UTASKER_CONFIG or the user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the tasks shown on a screen.
    ///
    /// Backlog shows BACKLOG and UPCOMING, Workbench shows UPCOMING, ACTIVE
    /// and REVIEW, Archive shows DONE and CANCELLED.
    List {
        /// Screen to list: backlog, workbench or archive
        #[arg(short, long, default_value = "backlog")]
        screen: Screen,
    },

    /// Add a new BACKLOG task.
    Add {
        /// Title (default: "New Task")
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Copy a backlog or archived task into a new BACKLOG task.
    Clone {
        /// Task ID
        id: RecordId,
    },

    /// Update a task's fields.
    ///
    /// Only specified fields are updated; others remain unchanged. DONE and
    /// CANCELLED tasks cannot be changed.
    Update {
        /// Task ID
        id: RecordId,

        /// New state: BACKLOG, UPCOMING, ACTIVE, REVIEW, DONE or CANCELLED
        #[arg(short, long)]
        state: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// New priority: Low, Medium, High or Critical
        #[arg(short, long)]
        priority: Option<String>,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New points estimate
        #[arg(long)]
        points: Option<String>,

        /// New details
        #[arg(short, long)]
        details: Option<String>,
    },

    /// Add or remove time in half-hour steps.
    ///
    /// Time spent never goes below the value already recorded.
    Time {
        /// Task ID
        id: RecordId,

        /// Number of steps to add
        #[arg(long, conflicts_with = "dec", required_unless_present = "dec")]
        inc: Option<u32>,

        /// Number of steps to remove
        #[arg(long)]
        dec: Option<u32>,
    },

    /// Write every task to a CSV file.
    Export {
        /// Destination file
        path: PathBuf,
    },

    /// Add every row of a CSV file as a new task.
    ///
    /// The ID column is ignored; importing a file twice duplicates its tasks.
    Import {
        /// Source file
        path: PathBuf,
    },

    /// List the categories in use.
    Categories,

    /// List the workflow states.
    States,

    /// List the priorities.
    Priorities,

    /// Show version information.
    Version,
}

impl Command {
    /// Returns true if this command may change the store.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Add { .. }
                | Self::Clone { .. }
                | Self::Update { .. }
                | Self::Time { .. }
                | Self::Import { .. }
        )
    }
}
