//! Task record types: the record itself, its workflow state and priority.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category assigned to a new task.
pub const DEFAULT_CATEGORY: &str = "-";
/// Title assigned to a new task.
pub const DEFAULT_TITLE: &str = "New Task";
/// Details assigned to a new task.
pub const DEFAULT_DETAILS: &str = "TBA";
/// Points assigned to a new task.
pub const DEFAULT_POINTS: u32 = 1;

/// Store-assigned task identifier. Positive, never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Workflow state of a task.
///
/// The declaration order is the display order used by selection widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    /// Captured but not scheduled.
    #[default]
    Backlog,
    /// Queued for work soon; shown on both Backlog and Workbench.
    Upcoming,
    /// Being worked on.
    Active,
    /// Waiting for review.
    Review,
    /// Finished. Terminal.
    Done,
    /// Dropped. Terminal.
    Cancelled,
}

impl State {
    /// Every state in display order.
    pub const ALL: [Self; 6] =
        [Self::Backlog, Self::Upcoming, Self::Active, Self::Review, Self::Done, Self::Cancelled];

    /// Labels of every state in display order.
    #[must_use]
    pub fn list() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.as_str()).collect()
    }

    /// Stable position of this state in [`State::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The label used for display and persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "BACKLOG",
            Self::Upcoming => "UPCOMING",
            Self::Active => "ACTIVE",
            Self::Review => "REVIEW",
            Self::Done => "DONE",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether a task in this state is retired and can no longer change state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = InvalidState;

    /// Labels must match exactly; there is no case folding or fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| InvalidState(s.to_string()))
    }
}

/// Error when a state label is not one of the known states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidState(pub String);

impl fmt::Display for InvalidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid state: '{}' (must be one of: {})", self.0, State::list().join(", "))
    }
}

impl std::error::Error for InvalidState {}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    /// Low priority (default).
    #[default]
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
    /// Needs attention now.
    Critical,
}

impl Priority {
    /// Every priority in display order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Labels of every priority in display order.
    #[must_use]
    pub fn list() -> Vec<&'static str> {
        Self::ALL.iter().map(|p| p.as_str()).collect()
    }

    /// Stable position of this priority in [`Priority::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The label used for display and persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| InvalidPriority(s.to_string()))
    }
}

/// Error when a priority label is not one of the known priorities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPriority(pub String);

impl fmt::Display for InvalidPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known = Priority::list().join(", ");
        write!(f, "invalid priority: '{}' (must be one of: {known})", self.0)
    }
}

impl std::error::Error for InvalidPriority {}

/// One task.
///
/// Serialized field names are the column names of the `Tasks` table and the
/// header of the CSV exchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier.
    #[serde(rename = "ID")]
    pub id: RecordId,
    /// Workflow state.
    #[serde(rename = "State")]
    pub state: State,
    /// Priority label.
    #[serde(rename = "Priority")]
    pub priority: Priority,
    /// Free-form category label.
    #[serde(rename = "Category")]
    pub category: String,
    /// Short title.
    #[serde(rename = "Title")]
    pub title: String,
    /// Size estimate.
    #[serde(rename = "Points")]
    pub points: u32,
    /// Accumulated effort. Never decreases through the edit path.
    #[serde(rename = "TimeSpent")]
    pub time_spent: f64,
    /// Multi-line description.
    #[serde(rename = "Details")]
    pub details: String,
}

impl Record {
    /// A record with the given ID and every other field at its default.
    #[must_use]
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            state: State::default(),
            priority: Priority::default(),
            category: DEFAULT_CATEGORY.to_string(),
            title: DEFAULT_TITLE.to_string(),
            points: DEFAULT_POINTS,
            time_spent: 0.0,
            details: DEFAULT_DETAILS.to_string(),
        }
    }

    /// Whether the task is DONE or CANCELLED and can no longer be updated.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.state.is_terminal()
    }
}
