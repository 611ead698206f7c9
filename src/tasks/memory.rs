//! In-process list implementation of [`RecordStore`].
//!
//! Nothing is persisted. Useful for development and for tests that do not
//! care about `SQLite`.

use crate::error::{Error, Result};
use crate::tasks::models::{Priority, Record, RecordId, State};
use crate::tasks::store::{
    category_additions, check_record, check_replace, initial_categories, LoadOptions,
    RecordStore, EXAMPLE_TASKS,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Record store backed by a `Vec`.
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    records: Vec<Record>,
    categories: BTreeSet<String>,
    last_id: i64,
    closed: bool,
}

impl MemoryRecordStore {
    /// Create an empty store, seeded with the example tasks if requested.
    #[must_use]
    pub fn new(options: LoadOptions) -> Self {
        let mut store = Self {
            records: Vec::new(),
            categories: initial_categories(),
            last_id: 0,
            closed: false,
        };
        if options.seed_examples {
            for (title, points, details) in EXAMPLE_TASKS {
                store.last_id += 1;
                store.records.push(Record {
                    title: title.to_string(),
                    points,
                    details: details.to_string(),
                    ..Record::new(RecordId(store.last_id))
                });
            }
        }
        store
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn insert_default(&mut self) -> Record {
        self.last_id += 1;
        let record = Record::new(RecordId(self.last_id));
        self.records.push(record.clone());
        record
    }

    fn position(&self, id: RecordId) -> Result<usize> {
        self.records.iter().position(|r| r.id == id).ok_or(Error::NotFound(id))
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl RecordStore for MemoryRecordStore {
    fn new_record(&mut self) -> Result<Record> {
        self.ensure_open()?;
        let record = self.insert_default();
        debug!(id = %record.id, "new_record");
        Ok(record)
    }

    fn get_record(&self, id: RecordId) -> Result<Record> {
        self.ensure_open()?;
        Ok(self.records[self.position(id)?].clone())
    }

    fn set_record(&mut self, record: &Record) -> Result<()> {
        self.ensure_open()?;
        let index = self.position(record.id)?;
        check_record(record)?;
        check_replace(&self.records[index])?;
        self.records[index] = record.clone();
        debug!(id = %record.id, state = %record.state, "set_record");
        Ok(())
    }

    fn view_dataset(&self, states: &[State]) -> Result<Vec<Record>> {
        self.ensure_open()?;
        Ok(self
            .records
            .iter()
            .filter(|r| states.is_empty() || states.contains(&r.state))
            .cloned()
            .collect())
    }

    fn get_categories(&self) -> Result<BTreeSet<String>> {
        self.ensure_open()?;
        Ok(self.categories.clone())
    }

    fn update_categories(&mut self, live: &BTreeSet<String>) -> Result<()> {
        self.ensure_open()?;
        let additions = category_additions(&self.categories, live)?;
        self.categories.extend(additions);
        Ok(())
    }

    fn get_states(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(State::list().into_iter().map(str::to_string).collect())
    }

    fn get_priorities(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(Priority::list().into_iter().map(str::to_string).collect())
    }

    fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}
