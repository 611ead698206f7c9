//! Record store trait and the rules every backend shares.
//!
//! Two backends implement [`RecordStore`]:
//! - [`SqliteRecordStore`](crate::tasks::SqliteRecordStore): a `SQLite` file, or
//!   a private in-memory database
//! - [`MemoryRecordStore`](crate::tasks::MemoryRecordStore): a plain list kept
//!   in process memory
//!
//! The backend is chosen once, when the store is opened with [`open_store`].

use crate::error::{Error, Result};
use crate::tasks::fields::{check_category, check_time_spent};
use crate::tasks::memory::MemoryRecordStore;
use crate::tasks::models::{Record, RecordId, State, DEFAULT_CATEGORY};
use crate::tasks::sqlite::SqliteRecordStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Message shown when the terminal-state guard rejects an update.
pub const TERMINAL_STATE_MESSAGE: &str = "Can't change state of DONE or CANCELLED Task";

/// Trait for task record storage.
///
/// Every mutation is all-or-nothing: a failed call leaves the store exactly
/// as it was.
#[allow(clippy::missing_errors_doc)]
pub trait RecordStore {
    /// Insert a record with default fields and a freshly allocated ID.
    ///
    /// IDs increase monotonically and are never reused.
    fn new_record(&mut self) -> Result<Record>;

    /// Get the record with the given ID, or `Error::NotFound`.
    fn get_record(&self, id: RecordId) -> Result<Record>;

    /// Replace every field of the stored record with the same ID.
    ///
    /// Fails with `Error::NotFound` for an unknown ID, with
    /// `Error::Validation` when [`check_record`] refuses the new values, and
    /// with `Error::ConstraintViolation` when the stored record is DONE or
    /// CANCELLED.
    fn set_record(&mut self, record: &Record) -> Result<()>;

    /// All records whose state is in `states`; an empty slice means all records.
    fn view_dataset(&self, states: &[State]) -> Result<Vec<Record>>;

    /// Every category label ever persisted.
    fn get_categories(&self) -> Result<BTreeSet<String>>;

    /// Persist categories from `live` that the store has not seen yet.
    ///
    /// Fails with `Error::CategoryDesync` if the store holds a category that
    /// `live` lacks.
    fn update_categories(&mut self, live: &BTreeSet<String>) -> Result<()>;

    /// State labels in display order.
    fn get_states(&self) -> Result<Vec<String>>;

    /// Priority labels in display order.
    fn get_priorities(&self) -> Result<Vec<String>>;

    /// Flush and release the store. Later calls fail with `Error::Closed`.
    fn close(&mut self) -> Result<()>;
}

/// Where a store keeps its records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreLocation {
    /// Nothing is persisted; the records live as long as the store.
    #[default]
    InMemory,
    /// A database file. Missing or empty files are initialised.
    File(PathBuf),
}

impl StoreLocation {
    /// `None` means in-memory.
    #[must_use]
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Self::InMemory, Self::File)
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory => f.write_str(":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Which [`RecordStore`] implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// `SQLite` database (default).
    #[default]
    Sqlite,
    /// Plain in-process list. Cannot persist to a file.
    Memory,
}

/// Options applied when a fresh store is initialised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Insert [`EXAMPLE_TASKS`] into a freshly initialised store.
    pub seed_examples: bool,
}

/// Example tasks as `(title, points, details)`.
pub const EXAMPLE_TASKS: [(&str, u32, &str); 3] =
    [("Tasker1", 3, "First one"), ("Tasker2", 2, "Second one"), ("Tasker3", 1, "Third one")];

/// Category set a fresh store starts with.
#[must_use]
pub fn initial_categories() -> BTreeSet<String> {
    BTreeSet::from([DEFAULT_CATEGORY.to_string()])
}

/// Open a store with the chosen backend.
///
/// # Errors
///
/// Returns `Error::StorageOpen` if the location cannot be used as a task store.
pub fn open_store(
    backend: Backend,
    location: &StoreLocation,
    options: LoadOptions,
) -> Result<Box<dyn RecordStore>> {
    match backend {
        Backend::Sqlite => Ok(Box::new(SqliteRecordStore::load(location, options)?)),
        Backend::Memory => match location {
            StoreLocation::InMemory => Ok(Box::new(MemoryRecordStore::new(options))),
            StoreLocation::File(_) => Err(Error::StorageOpen {
                location: location.to_string(),
                reason: "the memory backend cannot persist to a file".to_string(),
            }),
        },
    }
}

/// Terminal-state guard.
///
/// A full-record replace always rewrites `State`, so once the stored record is
/// DONE or CANCELLED every replace is refused.
///
/// # Errors
///
/// Returns `Error::ConstraintViolation` if `current` is in a terminal state.
pub fn check_replace(current: &Record) -> Result<()> {
    if current.is_closed() {
        return Err(Error::ConstraintViolation(format!(
            "{TERMINAL_STATE_MESSAGE} (task {} is {})",
            current.id, current.state
        )));
    }
    Ok(())
}

/// Value checks applied to every record a backend is asked to store.
///
/// # Errors
///
/// Returns `Error::Validation` for a negative or non-finite time spent and
/// for a blank or padded category.
pub fn check_record(record: &Record) -> Result<()> {
    check_time_spent(record.time_spent)?;
    check_category(&record.category)
}

/// Categories in `live` that are missing from `stored`.
///
/// # Errors
///
/// Returns `Error::CategoryDesync` if `stored` is not a subset of `live`, and
/// `Error::Validation` if a new label is blank or padded.
pub fn category_additions(
    stored: &BTreeSet<String>,
    live: &BTreeSet<String>,
) -> Result<Vec<String>> {
    let missing: Vec<String> = stored.difference(live).cloned().collect();
    if !missing.is_empty() {
        return Err(Error::CategoryDesync { missing });
    }
    let additions: Vec<String> = live.difference(stored).cloned().collect();
    for label in &additions {
        check_category(label)?;
    }
    Ok(additions)
}
