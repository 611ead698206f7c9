//! Error types for `utasker`.

use crate::tasks::models::{InvalidPriority, InvalidState, RecordId};

/// Errors that can occur while tracking tasks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A CSV reading or writing error occurred.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The persistent store could not be opened as a task database.
    #[error("Cannot open task store at {location}: {reason}")]
    StorageOpen {
        /// Where the store was expected.
        location: String,
        /// Why it was refused.
        reason: String,
    },

    /// No record exists with the given ID.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// The store refused the update.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// An edit was rejected before reaching the store.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The stored category set holds labels the caller no longer offers.
    #[error("Stored categories missing from the live set: {}", missing.join(", "))]
    CategoryDesync {
        /// Stored labels absent from the live set.
        missing: Vec<String>,
    },

    /// The store was used after it was closed.
    #[error("Task store is closed")]
    Closed,

    /// A session action needed a selected row but none is selected.
    #[error("No task selected")]
    NoSelection,
}

impl Error {
    /// Whether this is the expected, recoverable terminal-state rejection.
    #[must_use]
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}

impl From<InvalidState> for Error {
    fn from(err: InvalidState) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<InvalidPriority> for Error {
    fn from(err: InvalidPriority) -> Self {
        Self::Validation(err.to_string())
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
