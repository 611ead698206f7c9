//! Edit sessions: staging field edits for one selected task and writing them
//! back through the store.
//!
//! Each screen owns an [`EditSession`]. The session keeps the screen's table
//! (the projection), the selected row, a [`Draft`] of staged edits and the
//! [`TimeSpentAccumulator`]. Committing assembles a full record from the stored
//! one plus the draft and replaces it with a single `set_record` call, so an
//! update is applied completely or not at all.
//!
//! Table rows are only ever filled with records read back from the store.

use crate::error::{Error, Result};
use crate::tasks::fields::{
    parse_category, parse_points, parse_time_spent, ColumnMap, Field,
};
use crate::tasks::models::{Priority, Record, RecordId, State};
use crate::tasks::store::{check_record, RecordStore, TERMINAL_STATE_MESSAGE};
use crate::tasks::view::{project, Screen};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

/// Step used by the time-spent buttons.
pub const TIME_QUANTUM: f64 = 0.5;

/// Prefix given to the title of a cloned task.
pub const CLONE_PREFIX: &str = "Clone of ";

/// Staged, already validated field edits for one record.
///
/// `None` leaves the stored value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    /// New state.
    pub state: Option<State>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New category.
    pub category: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New points.
    pub points: Option<u32>,
    /// New time spent.
    pub time_spent: Option<f64>,
    /// New details.
    pub details: Option<String>,
}

impl Draft {
    /// Parse `text` for `field` and stage it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the text does not parse or the field is
    /// the ID. Nothing is staged on error.
    pub fn stage(&mut self, field: Field, text: &str) -> Result<()> {
        match field {
            Field::Id => return Err(Error::Validation("the ID cannot be edited".to_string())),
            Field::State => self.state = Some(text.parse()?),
            Field::Priority => self.priority = Some(text.parse()?),
            Field::Category => self.category = Some(parse_category(text)?),
            Field::Title => self.title = Some(text.to_string()),
            Field::Points => self.points = Some(parse_points(text)?),
            Field::TimeSpent => self.time_spent = Some(parse_time_spent(text)?),
            Field::Details => self.details = Some(text.to_string()),
        }
        Ok(())
    }

    /// Rebuild a draft covering every field from a display row.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if any cell fails to parse.
    pub fn from_row<S: AsRef<str>>(columns: &ColumnMap, cells: &[S]) -> Result<(RecordId, Self)> {
        let record = columns.parse_row(cells)?;
        Ok((record.id, Self::from(record)))
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `record` with the staged edits applied.
    #[must_use]
    pub fn apply(&self, record: &Record) -> Record {
        Record {
            id: record.id,
            state: self.state.unwrap_or(record.state),
            priority: self.priority.unwrap_or(record.priority),
            category: self.category.clone().unwrap_or_else(|| record.category.clone()),
            title: self.title.clone().unwrap_or_else(|| record.title.clone()),
            points: self.points.unwrap_or(record.points),
            time_spent: self.time_spent.unwrap_or(record.time_spent),
            details: self.details.clone().unwrap_or_else(|| record.details.clone()),
        }
    }
}

impl From<Record> for Draft {
    fn from(record: Record) -> Self {
        Self {
            state: Some(record.state),
            priority: Some(record.priority),
            category: Some(record.category),
            title: Some(record.title),
            points: Some(record.points),
            time_spent: Some(record.time_spent),
            details: Some(record.details),
        }
    }
}

/// Result of a time-spent step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeAdjustment {
    /// The displayed value changed to this.
    Applied(f64),
    /// The step would have gone below the committed value; nothing changed.
    Rejected {
        /// Last committed value.
        baseline: f64,
        /// Value the step would have produced.
        attempted: f64,
    },
}

impl TimeAdjustment {
    /// Whether the step was refused.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Pending time-spent value that never drops below the last committed one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeSpentAccumulator {
    baseline: f64,
    current: f64,
}

impl TimeSpentAccumulator {
    /// Start from a committed value.
    #[must_use]
    pub const fn new(committed: f64) -> Self {
        Self { baseline: committed, current: committed }
    }

    /// Restart from a newly loaded or committed value.
    pub fn reset(&mut self, committed: f64) {
        *self = Self::new(committed);
    }

    /// Last committed value.
    #[must_use]
    pub const fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Value currently shown.
    #[must_use]
    pub const fn current(&self) -> f64 {
        self.current
    }

    /// Whether the shown value differs from the committed one.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.current > self.baseline
    }

    /// Add one quantum. Always succeeds.
    pub fn increment(&mut self) -> f64 {
        self.current += TIME_QUANTUM;
        self.current
    }

    /// Remove one quantum unless that would go below the baseline.
    pub fn decrement(&mut self) -> TimeAdjustment {
        let attempted = self.current - TIME_QUANTUM;
        if attempted < self.baseline {
            return TimeAdjustment::Rejected { baseline: self.baseline, attempted };
        }
        self.current = attempted;
        TimeAdjustment::Applied(attempted)
    }
}

/// Dismissable warning left by a rejected commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Task whose update was refused.
    pub record: RecordId,
    /// Text to show.
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// What happened to a commit.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// The store accepted the update; this is the stored record.
    Committed(Record),
    /// The store refused the update; nothing changed.
    Rejected(Notice),
}

/// Apply `draft` to the stored record `id` and replace it in one call.
///
/// A terminal-state rejection is expected and comes back as
/// [`CommitOutcome::Rejected`]; every other failure is an error.
///
/// # Errors
///
/// Returns `Error::NotFound` for an unknown ID, `Error::Validation` if the
/// draft holds a value the store cannot keep or would lower the time spent,
/// and any store error.
pub fn reconcile(
    store: &mut dyn RecordStore,
    id: RecordId,
    draft: &Draft,
) -> Result<CommitOutcome> {
    let current = store.get_record(id)?;
    let updated = draft.apply(&current);

    check_record(&updated)?;
    if updated.time_spent < current.time_spent {
        return Err(Error::Validation(format!(
            "time spent cannot go down from {} to {}",
            current.time_spent, updated.time_spent
        )));
    }

    ensure_category(store, &updated.category)?;

    match store.set_record(&updated) {
        Ok(()) => {
            debug!(id = %id, "committed");
            Ok(CommitOutcome::Committed(store.get_record(id)?))
        }
        Err(e) if e.is_constraint_violation() => {
            warn!(id = %id, error = %e, "update rejected");
            Ok(CommitOutcome::Rejected(Notice {
                record: id,
                message: TERMINAL_STATE_MESSAGE.to_string(),
            }))
        }
        Err(e) => Err(e),
    }
}

/// Reconcile a full display row keyed by its ID cell.
///
/// # Errors
///
/// Returns `Error::Validation` if the row does not parse; otherwise as
/// [`reconcile`].
pub fn commit_row<S: AsRef<str>>(
    store: &mut dyn RecordStore,
    columns: &ColumnMap,
    cells: &[S],
) -> Result<CommitOutcome> {
    let (id, draft) = Draft::from_row(columns, cells)?;
    reconcile(store, id, &draft)
}

/// Make sure `category` is in the store's category set.
fn ensure_category(store: &mut dyn RecordStore, category: &str) -> Result<()> {
    let mut live = store.get_categories()?;
    if live.insert(category.to_string()) {
        store.update_categories(&live)?;
    }
    Ok(())
}

/// Per-screen binding between the task table and the detail editor.
#[derive(Debug, Clone)]
pub struct EditSession {
    screen: Screen,
    columns: ColumnMap,
    rows: Vec<Record>,
    selected: Option<usize>,
    draft: Draft,
    time: TimeSpentAccumulator,
    categories: BTreeSet<String>,
    notice: Option<Notice>,
}

impl EditSession {
    /// An empty session; call [`EditSession::activate`] to fill it.
    #[must_use]
    pub fn new(screen: Screen, columns: ColumnMap) -> Self {
        Self {
            screen,
            columns,
            rows: Vec::new(),
            selected: None,
            draft: Draft::default(),
            time: TimeSpentAccumulator::default(),
            categories: BTreeSet::new(),
            notice: None,
        }
    }

    /// The screen this session serves.
    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    /// Clear and repopulate the table from the screen's projection.
    ///
    /// Selects the first row, if any.
    ///
    /// # Errors
    ///
    /// Propagates store errors; the session is unchanged on error.
    pub fn activate(&mut self, store: &dyn RecordStore) -> Result<()> {
        let rows = project(store, self.screen.wanted_states())?;
        let categories = store.get_categories()?;

        debug!(screen = %self.screen, rows = rows.len(), "projected");
        self.rows = rows;
        self.categories = categories;
        self.selected = None;
        self.draft = Draft::default();
        self.time = TimeSpentAccumulator::default();
        if !self.rows.is_empty() {
            self.load_selection(0);
        }
        Ok(())
    }

    /// Re-project after edits may have moved tasks off this screen.
    ///
    /// # Errors
    ///
    /// As [`EditSession::activate`].
    pub fn tidy(&mut self, store: &dyn RecordStore) -> Result<()> {
        self.activate(store)
    }

    /// Records in the table.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.rows
    }

    /// Column headers in display order.
    #[must_use]
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.names()
    }

    /// The table as display rows.
    #[must_use]
    pub fn table(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|record| self.columns.row(record)).collect()
    }

    /// Category labels offered by the category picker.
    #[must_use]
    pub const fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Index of the selected row.
    #[must_use]
    pub const fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// The selected row as stored.
    #[must_use]
    pub fn selected_record(&self) -> Option<&Record> {
        self.selected.and_then(|index| self.rows.get(index))
    }

    /// The selected row with staged edits and pending time applied.
    #[must_use]
    pub fn details(&self) -> Option<Record> {
        self.selected_record().map(|record| {
            let mut shown = self.draft.apply(record);
            if self.screen.tracks_time() {
                shown.time_spent = self.time.current();
            }
            shown
        })
    }

    /// Staged edits.
    #[must_use]
    pub const fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Time-spent accumulator for the selected row.
    #[must_use]
    pub const fn time(&self) -> &TimeSpentAccumulator {
        &self.time
    }

    /// Select a row by position, discarding staged edits.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `index` is out of range.
    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.rows.len() {
            return Err(Error::Validation(format!(
                "row {index} out of range ({} rows)",
                self.rows.len()
            )));
        }
        self.load_selection(index);
        Ok(())
    }

    /// Select the row holding task `id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the task is not in this table.
    pub fn select_id(&mut self, id: RecordId) -> Result<()> {
        let index = self.rows.iter().position(|r| r.id == id).ok_or(Error::NotFound(id))?;
        self.load_selection(index);
        Ok(())
    }

    fn load_selection(&mut self, index: usize) {
        self.selected = Some(index);
        self.draft = Draft::default();
        self.time.reset(self.rows[index].time_spent);
    }

    fn selected_position(&self) -> Result<usize> {
        self.selected.ok_or(Error::NoSelection)
    }

    /// Stage an edit of the selected row.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSelection` without a selection, and
    /// `Error::Validation` if the field is not editable on this screen, the
    /// state is not selectable here, or the text does not parse.
    pub fn stage(&mut self, field: Field, text: &str) -> Result<()> {
        self.selected_position()?;
        if !self.screen.editable_fields().contains(&field) {
            return Err(Error::Validation(format!(
                "{field} cannot be edited on the {} screen",
                self.screen.title()
            )));
        }

        let mut draft = self.draft.clone();
        draft.stage(field, text)?;
        if let Some(state) = draft.state {
            if !self.screen.selectable_states().contains(&state) {
                return Err(Error::Validation(format!(
                    "{state} cannot be chosen on the {} screen",
                    self.screen.title()
                )));
            }
        }
        if let Some(category) = &draft.category {
            self.categories.insert(category.clone());
        }
        self.draft = draft;
        Ok(())
    }

    /// Backlog "upcoming" checkbox: stage UPCOMING or BACKLOG.
    ///
    /// # Errors
    ///
    /// As [`EditSession::stage`].
    pub fn set_upcoming(&mut self, upcoming: bool) -> Result<()> {
        let state = if upcoming { State::Upcoming } else { State::Backlog };
        self.stage(Field::State, state.as_str())
    }

    /// Add one time quantum to the selected row.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSelection` without a selection and
    /// `Error::Validation` on screens that do not track time.
    pub fn increment_time(&mut self) -> Result<f64> {
        self.ensure_time_tracking()?;
        Ok(self.time.increment())
    }

    /// Remove one time quantum, refusing to go below the committed value.
    ///
    /// # Errors
    ///
    /// As [`EditSession::increment_time`].
    pub fn decrement_time(&mut self) -> Result<TimeAdjustment> {
        self.ensure_time_tracking()?;
        let adjustment = self.time.decrement();
        if let TimeAdjustment::Rejected { baseline, attempted } = adjustment {
            warn!(baseline, attempted, "time spent cannot go below the committed value");
        }
        Ok(adjustment)
    }

    fn ensure_time_tracking(&self) -> Result<()> {
        self.selected_position()?;
        if !self.screen.tracks_time() {
            return Err(Error::Validation(format!(
                "time spent is not tracked on the {} screen",
                self.screen.title()
            )));
        }
        Ok(())
    }

    /// Write staged edits (and pending time) for the selected row.
    ///
    /// On success the row shows the stored record and the time baseline moves
    /// to the committed value. On a terminal-state rejection the staged edits
    /// are dropped, the row is reloaded from the store and a [`Notice`] stays
    /// pending until dismissed.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSelection`, `Error::Validation` on a read-only
    /// screen, `Error::CategoryDesync` if the store knows categories this
    /// session no longer offers, and store errors.
    pub fn commit(&mut self, store: &mut dyn RecordStore) -> Result<CommitOutcome> {
        let index = self.selected_position()?;
        if self.screen.editable_fields().is_empty() {
            return Err(Error::Validation(format!(
                "tasks cannot be edited on the {} screen",
                self.screen.title()
            )));
        }

        let id = self.rows[index].id;
        let mut draft = self.draft.clone();
        if self.screen.tracks_time() && self.time.is_dirty() {
            draft.time_spent = Some(self.time.current());
        }

        store.update_categories(&self.categories)?;
        let outcome = reconcile(store, id, &draft)?;

        let stored = match &outcome {
            CommitOutcome::Committed(record) => record.clone(),
            CommitOutcome::Rejected(notice) => {
                self.notice = Some(notice.clone());
                store.get_record(id)?
            }
        };
        self.time.reset(stored.time_spent);
        self.rows[index] = stored;
        self.draft = Draft::default();
        Ok(outcome)
    }

    /// Create a default task, append it and select it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` on screens without an add action, and store
    /// errors.
    pub fn add(&mut self, store: &mut dyn RecordStore) -> Result<Record> {
        if !self.screen.can_add() {
            return Err(Error::Validation(format!(
                "tasks cannot be added on the {} screen",
                self.screen.title()
            )));
        }
        let record = store.new_record()?;
        self.push_and_select(record.clone());
        Ok(record)
    }

    /// Copy the selected task into a new BACKLOG task.
    ///
    /// The copy appears in this table only if the screen shows BACKLOG.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSelection`, `Error::Validation` on screens without a
    /// clone action, and store errors.
    pub fn clone_selected(&mut self, store: &mut dyn RecordStore) -> Result<Record> {
        let index = self.selected_position()?;
        if !self.screen.can_clone() {
            return Err(Error::Validation(format!(
                "tasks cannot be cloned on the {} screen",
                self.screen.title()
            )));
        }

        let source = self.rows[index].clone();
        let fresh = store.new_record()?;
        let copy = Record {
            title: format!("{CLONE_PREFIX}{}", source.title),
            category: source.category,
            priority: source.priority,
            points: source.points,
            details: source.details,
            ..fresh
        };
        store.set_record(&copy)?;
        let stored = store.get_record(copy.id)?;
        debug!(source = %source.id, clone = %stored.id, "cloned");

        if self.screen.shows(stored.state) {
            self.push_and_select(stored.clone());
        }
        Ok(stored)
    }

    fn push_and_select(&mut self, record: Record) {
        self.rows.push(record);
        self.load_selection(self.rows.len() - 1);
    }

    /// Warning left by the last rejected commit.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Dismiss the pending warning.
    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::memory::MemoryRecordStore;
    use crate::tasks::sqlite::SqliteRecordStore;
    use crate::tasks::store::{LoadOptions, StoreLocation};

    fn sqlite_store() -> SqliteRecordStore {
        SqliteRecordStore::load(&StoreLocation::InMemory, LoadOptions::default()).unwrap()
    }

    fn session(screen: Screen, store: &dyn RecordStore) -> EditSession {
        let mut session = EditSession::new(screen, ColumnMap::default());
        session.activate(store).unwrap();
        session
    }

    fn with_state(store: &mut dyn RecordStore, state: State) -> Record {
        let mut record = store.new_record().unwrap();
        record.state = state;
        store.set_record(&record).unwrap();
        record
    }

    #[test]
    fn test_draft_stage_validates() {
        let mut draft = Draft::default();
        draft.stage(Field::Points, "3").unwrap();
        draft.stage(Field::State, "ACTIVE").unwrap();
        assert_eq!(draft.points, Some(3));
        assert_eq!(draft.state, Some(State::Active));

        assert!(draft.stage(Field::State, "Active").is_err());
        assert!(draft.stage(Field::Points, "lots").is_err());
        assert!(draft.stage(Field::Id, "5").is_err());
        assert_eq!(draft.points, Some(3));
    }

    #[test]
    fn test_draft_apply_keeps_unstaged_fields() {
        let record = Record::new(RecordId(2));
        let draft = Draft { title: Some("Write spec".to_string()), ..Draft::default() };
        let applied = draft.apply(&record);
        assert_eq!(applied.title, "Write spec");
        assert_eq!(applied.details, record.details);
        assert!(Draft::default().is_empty());
        assert!(!draft.is_empty());
    }

    #[test]
    fn test_accumulator() {
        let mut time = TimeSpentAccumulator::new(1.0);
        assert!(time.decrement().is_rejected());
        assert!((time.current() - 1.0).abs() < f64::EPSILON);

        assert!((time.increment() - 1.5).abs() < f64::EPSILON);
        assert!(time.is_dirty());
        assert_eq!(time.decrement(), TimeAdjustment::Applied(1.0));
        assert_eq!(time.decrement(), TimeAdjustment::Rejected { baseline: 1.0, attempted: 0.5 });

        time.reset(2.0);
        assert!((time.baseline() - 2.0).abs() < f64::EPSILON);
        assert!(!time.is_dirty());
    }

    #[test]
    fn test_reconcile_example_scenario() {
        let mut store = sqlite_store();
        let record = store.new_record().unwrap();
        assert_eq!(record.id, RecordId(1));

        let mut draft = Draft::default();
        draft.stage(Field::Title, "Write spec").unwrap();
        draft.stage(Field::Points, "3").unwrap();
        let outcome = reconcile(&mut store, record.id, &draft).unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed(_)));

        let stored = store.get_record(RecordId(1)).unwrap();
        assert_eq!(stored.state, State::Backlog);
        assert_eq!(stored.title, "Write spec");
        assert_eq!(stored.points, 3);
        assert!(stored.time_spent.abs() < f64::EPSILON);

        let done = Draft { state: Some(State::Done), ..Draft::default() };
        assert!(matches!(
            reconcile(&mut store, record.id, &done).unwrap(),
            CommitOutcome::Committed(_)
        ));

        let reopen = Draft { state: Some(State::Active), ..Draft::default() };
        let outcome = reconcile(&mut store, record.id, &reopen).unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Rejected(Notice {
                record: RecordId(1),
                message: TERMINAL_STATE_MESSAGE.to_string()
            })
        );
        assert_eq!(store.get_record(RecordId(1)).unwrap().state, State::Done);
    }

    #[test]
    fn test_reconcile_refuses_lower_time() {
        let mut store = MemoryRecordStore::default();
        let mut record = store.new_record().unwrap();
        record.time_spent = 2.0;
        store.set_record(&record).unwrap();

        let draft = Draft { time_spent: Some(1.5), ..Draft::default() };
        let result = reconcile(&mut store, record.id, &draft);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!((store.get_record(record.id).unwrap().time_spent - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reconcile_refuses_unstorable_values() {
        let mut stores: [Box<dyn RecordStore>; 2] =
            [Box::new(sqlite_store()), Box::new(MemoryRecordStore::default())];
        for store in &mut stores {
            let record = with_state(store.as_mut(), State::Active);
            let categories = store.get_categories().unwrap();

            for time_spent in [f64::NAN, f64::INFINITY, -1.0] {
                let draft = Draft { time_spent: Some(time_spent), ..Draft::default() };
                let result = reconcile(store.as_mut(), record.id, &draft);
                assert!(matches!(result, Err(Error::Validation(_))), "{time_spent}: {result:?}");
            }

            let padded = Draft { category: Some(" work ".to_string()), ..Draft::default() };
            let result = reconcile(store.as_mut(), record.id, &padded);
            assert!(matches!(result, Err(Error::Validation(_))));

            assert_eq!(store.get_record(record.id).unwrap(), record);
            assert_eq!(store.get_categories().unwrap(), categories);
        }
    }

    #[test]
    fn test_reconcile_unknown_id() {
        let mut store = MemoryRecordStore::default();
        let result = reconcile(&mut store, RecordId(3), &Draft::default());
        assert!(matches!(result, Err(Error::NotFound(RecordId(3)))));
    }

    #[test]
    fn test_reconcile_records_new_category() {
        let mut store = sqlite_store();
        let record = store.new_record().unwrap();
        let draft = Draft { category: Some("garden".to_string()), ..Draft::default() };
        reconcile(&mut store, record.id, &draft).unwrap();
        assert!(store.get_categories().unwrap().contains("garden"));
    }

    #[test]
    fn test_commit_row() {
        let mut store = MemoryRecordStore::default();
        let record = store.new_record().unwrap();
        let columns = ColumnMap::default();
        let mut row = columns.row(&record);
        row[columns.column(Field::Title)] = "From the table".to_string();

        let outcome = commit_row(&mut store, &columns, &row).unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed(r) if r.title == "From the table"));

        row[columns.column(Field::Points)] = "x".to_string();
        assert!(matches!(commit_row(&mut store, &columns, &row), Err(Error::Validation(_))));
    }

    #[test]
    fn test_backlog_session_edit_and_commit() {
        let mut store = sqlite_store();
        store.new_record().unwrap();
        let mut backlog = session(Screen::Backlog, &store);
        assert_eq!(backlog.selected_index(), Some(0));

        backlog.stage(Field::Title, "Write spec").unwrap();
        backlog.stage(Field::Points, "3").unwrap();
        backlog.stage(Field::Category, "work").unwrap();
        backlog.set_upcoming(true).unwrap();
        assert_eq!(backlog.details().unwrap().title, "Write spec");
        // Nothing written yet.
        assert_eq!(store.get_record(RecordId(1)).unwrap().title, "New Task");

        let outcome = backlog.commit(&mut store).unwrap();
        let CommitOutcome::Committed(record) = outcome else { panic!("expected commit") };
        assert_eq!(record.state, State::Upcoming);
        assert_eq!(record.category, "work");
        assert_eq!(backlog.records()[0], store.get_record(RecordId(1)).unwrap());
        assert!(store.get_categories().unwrap().contains("work"));
        assert!(backlog.draft().is_empty());
    }

    #[test]
    fn test_backlog_cannot_pick_workbench_states() {
        let mut store = MemoryRecordStore::default();
        store.new_record().unwrap();
        let mut backlog = session(Screen::Backlog, &store);
        assert!(matches!(backlog.stage(Field::State, "ACTIVE"), Err(Error::Validation(_))));
        assert!(matches!(backlog.stage(Field::TimeSpent, "3"), Err(Error::Validation(_))));
        assert!(backlog.increment_time().is_err());
    }

    #[test]
    fn test_stage_requires_selection() {
        let store = MemoryRecordStore::default();
        let mut backlog = session(Screen::Backlog, &store);
        assert!(matches!(backlog.stage(Field::Title, "x"), Err(Error::NoSelection)));
    }

    #[test]
    fn test_workbench_time_tracking() {
        let mut store = sqlite_store();
        with_state(&mut store, State::Active);
        let mut bench = session(Screen::Workbench, &store);

        assert!(bench.decrement_time().unwrap().is_rejected());
        bench.increment_time().unwrap();
        bench.increment_time().unwrap();
        assert_eq!(bench.decrement_time().unwrap(), TimeAdjustment::Applied(0.5));
        bench.commit(&mut store).unwrap();
        assert!((store.get_record(RecordId(1)).unwrap().time_spent - 0.5).abs() < f64::EPSILON);

        // The baseline moved to the committed value.
        assert!((bench.time().baseline() - 0.5).abs() < f64::EPSILON);
        assert!(bench.decrement_time().unwrap().is_rejected());
        assert!((store.get_record(RecordId(1)).unwrap().time_spent - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selecting_another_row_resets_time() {
        let mut store = MemoryRecordStore::default();
        let mut first = with_state(&mut store, State::Active);
        first.time_spent = 4.0;
        store.set_record(&first).unwrap();
        with_state(&mut store, State::Review);
        let mut bench = session(Screen::Workbench, &store);

        bench.increment_time().unwrap();
        bench.select(1).unwrap();
        assert!(bench.time().current().abs() < f64::EPSILON);
        bench.select(0).unwrap();
        assert!((bench.time().current() - 4.0).abs() < f64::EPSILON);
        assert!(bench.select(2).is_err());
    }

    #[test]
    fn test_workbench_rejected_commit_shows_notice() {
        let mut store = sqlite_store();
        with_state(&mut store, State::Active);
        let mut bench = session(Screen::Workbench, &store);

        bench.stage(Field::State, "DONE").unwrap();
        assert!(matches!(bench.commit(&mut store).unwrap(), CommitOutcome::Committed(_)));

        // Row still listed until tidied; the next change is refused.
        bench.stage(Field::Title, "Sneaky edit").unwrap();
        bench.stage(Field::State, "ACTIVE").unwrap();
        bench.increment_time().unwrap();
        let outcome = bench.commit(&mut store).unwrap();
        assert!(matches!(outcome, CommitOutcome::Rejected(_)));
        assert_eq!(bench.notice().unwrap().message, TERMINAL_STATE_MESSAGE);

        let stored = store.get_record(RecordId(1)).unwrap();
        assert_eq!(stored.state, State::Done);
        assert_eq!(stored.title, "New Task");
        assert!(stored.time_spent.abs() < f64::EPSILON);
        assert_eq!(bench.records()[0], stored);
        assert!(bench.draft().is_empty());

        assert!(bench.dismiss_notice().is_some());
        assert!(bench.notice().is_none());

        bench.tidy(&store).unwrap();
        assert!(bench.records().is_empty());
        assert_eq!(bench.selected_index(), None);
    }

    #[test]
    fn test_add_and_clone_on_backlog() {
        let mut store = sqlite_store();
        let mut backlog = session(Screen::Backlog, &store);
        let added = backlog.add(&mut store).unwrap();
        assert_eq!(backlog.selected_record(), Some(&added));

        backlog.stage(Field::Title, "Original").unwrap();
        backlog.stage(Field::Priority, "High").unwrap();
        backlog.stage(Field::Points, "5").unwrap();
        backlog.commit(&mut store).unwrap();

        let copy = backlog.clone_selected(&mut store).unwrap();
        assert_eq!(copy.id, RecordId(2));
        assert_eq!(copy.title, "Clone of Original");
        assert_eq!(copy.priority, Priority::High);
        assert_eq!(copy.points, 5);
        assert_eq!(copy.state, State::Backlog);
        assert_eq!(backlog.records().len(), 2);
        assert_eq!(backlog.selected_index(), Some(1));
    }

    #[test]
    fn test_archive_clone_goes_to_backlog() {
        let mut store = sqlite_store();
        let mut done = with_state(&mut store, State::Active);
        done.title = "Shipped".to_string();
        done.state = State::Done;
        done.time_spent = 3.0;
        store.set_record(&done).unwrap();

        let mut archive = session(Screen::Archive, &store);
        assert!(matches!(archive.stage(Field::Title, "x"), Err(Error::Validation(_))));
        assert!(matches!(archive.commit(&mut store), Err(Error::Validation(_))));
        assert!(archive.add(&mut store).is_err());

        let copy = archive.clone_selected(&mut store).unwrap();
        assert_eq!(copy.title, "Clone of Shipped");
        assert!(copy.time_spent.abs() < f64::EPSILON);
        assert_eq!(archive.records().len(), 1);

        let backlog = session(Screen::Backlog, &store);
        assert_eq!(backlog.records(), &[copy]);
    }

    #[test]
    fn test_commit_detects_category_desync() {
        let mut store = MemoryRecordStore::default();
        store.new_record().unwrap();
        let mut backlog = session(Screen::Backlog, &store);

        let live: BTreeSet<String> = ["-", "elsewhere"].iter().map(|s| (*s).to_string()).collect();
        store.update_categories(&live).unwrap();

        backlog.stage(Field::Title, "x").unwrap();
        assert!(matches!(backlog.commit(&mut store), Err(Error::CategoryDesync { .. })));
        assert_eq!(store.get_record(RecordId(1)).unwrap().title, "New Task");
    }

    #[test]
    fn test_table_uses_column_map() {
        let mut store = MemoryRecordStore::default();
        store.new_record().unwrap();
        let backlog = session(Screen::Backlog, &store);
        assert_eq!(backlog.headers()[0], "ID");
        assert_eq!(
            backlog.table(),
            vec![vec!["1", "BACKLOG", "Low", "-", "New Task", "1", "0.0", "TBA"]]
        );
    }
}
