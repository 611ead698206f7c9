//! Screens and the state-filtered projections they display.

use crate::error::{Error, Result};
use crate::tasks::fields::Field;
use crate::tasks::models::{Record, State};
use crate::tasks::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three task screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    /// Newly captured and queued tasks.
    #[default]
    Backlog,
    /// Tasks receiving attention.
    Workbench,
    /// Retired tasks.
    Archive,
}

impl Screen {
    /// Every screen.
    pub const ALL: [Self; 3] = [Self::Backlog, Self::Workbench, Self::Archive];

    /// States whose records this screen shows.
    ///
    /// UPCOMING is on both Backlog and Workbench.
    #[must_use]
    pub const fn wanted_states(self) -> &'static [State] {
        match self {
            Self::Backlog => &[State::Backlog, State::Upcoming],
            Self::Workbench => &[State::Active, State::Review, State::Upcoming],
            Self::Archive => &[State::Done, State::Cancelled],
        }
    }

    /// Whether `state` belongs on this screen.
    #[must_use]
    pub fn shows(self, state: State) -> bool {
        self.wanted_states().contains(&state)
    }

    /// Fields the user may edit on this screen.
    ///
    /// `TimeSpent` is never listed; it only changes through the accumulator.
    #[must_use]
    pub const fn editable_fields(self) -> &'static [Field] {
        match self {
            Self::Backlog => &[
                Field::State,
                Field::Priority,
                Field::Category,
                Field::Title,
                Field::Points,
                Field::Details,
            ],
            Self::Workbench => &[Field::State, Field::Title, Field::Details],
            Self::Archive => &[],
        }
    }

    /// States the user may pick on this screen.
    #[must_use]
    pub const fn selectable_states(self) -> &'static [State] {
        match self {
            Self::Backlog => &[State::Backlog, State::Upcoming],
            Self::Workbench => &State::ALL,
            Self::Archive => &[],
        }
    }

    /// Whether the time-spent accumulator is shown.
    #[must_use]
    pub const fn tracks_time(self) -> bool {
        matches!(self, Self::Workbench)
    }

    /// Whether new tasks can be added here.
    #[must_use]
    pub const fn can_add(self) -> bool {
        matches!(self, Self::Backlog)
    }

    /// Whether the selected task can be cloned here.
    #[must_use]
    pub const fn can_clone(self) -> bool {
        matches!(self, Self::Backlog | Self::Archive)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Workbench => "workbench",
            Self::Archive => "archive",
        }
    }

    /// Title shown above the task table.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Workbench => "Workbench",
            Self::Archive => "Archive",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|screen| screen.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown screen: '{s}'")))
    }
}

/// Records whose state is in `wanted`, in store order.
///
/// # Errors
///
/// Propagates store errors.
pub fn project(store: &dyn RecordStore, wanted: &[State]) -> Result<Vec<Record>> {
    store.view_dataset(wanted)
}
