//! CSV export and import.
//!
//! The header row holds the exact field names in store order. On import the
//! `ID` column is ignored and every row becomes a new task, so importing the
//! same file twice yields duplicates.

use crate::error::{Error, Result};
use crate::tasks::fields::{
    parse_category, parse_points, parse_time_spent, Field, RECORD_FIELD_NAMES,
};
use crate::tasks::models::{Priority, Record, RecordId, State};
use crate::tasks::store::RecordStore;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// Write every record, in store order, as CSV.
///
/// # Errors
///
/// Returns store errors and `Error::Csv` if writing fails.
pub fn export_csv<W: Write>(store: &dyn RecordStore, writer: W) -> Result<usize> {
    let records = store.view_dataset(&[])?;
    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    out.write_record(RECORD_FIELD_NAMES)?;
    for record in &records {
        out.serialize(record)?;
    }
    out.flush()?;
    info!(count = records.len(), "exported tasks");
    Ok(records.len())
}

/// Export to a file, creating or truncating it.
///
/// # Errors
///
/// As [`export_csv`], plus `Error::Io` if the file cannot be created.
pub fn export_csv_path(store: &dyn RecordStore, path: &Path) -> Result<usize> {
    export_csv(store, File::create(path)?)
}

/// Read CSV rows and add each one as a new task.
///
/// Every row is validated before the first task is created; a bad row
/// imports nothing. Returns the created records.
///
/// # Errors
///
/// Returns `Error::Validation` for a bad header or cell, `Error::Csv` for
/// malformed CSV, and store errors.
pub fn import_csv<R: Read>(store: &mut dyn RecordStore, reader: R) -> Result<Vec<Record>> {
    let mut input = csv::Reader::from_reader(reader);
    let columns = ImportColumns::new(input.headers()?)?;

    let mut rows = Vec::new();
    for (line, row) in input.records().enumerate() {
        let row = row?;
        let record = columns
            .parse(&row)
            .map_err(|e| Error::Validation(format!("row {}: {e}", line + 1)))?;
        rows.push(record);
    }

    let mut categories = store.get_categories()?;
    categories.extend(rows.iter().map(|row| row.category.clone()));
    store.update_categories(&categories)?;

    let mut created = Vec::with_capacity(rows.len());
    for row in rows {
        let fresh = store.new_record()?;
        let record = Record { id: fresh.id, ..row };
        store.set_record(&record)?;
        created.push(record);
    }
    info!(count = created.len(), "imported tasks");
    Ok(created)
}

/// Import from a file.
///
/// # Errors
///
/// As [`import_csv`], plus `Error::Io` if the file cannot be opened.
pub fn import_csv_path(store: &mut dyn RecordStore, path: &Path) -> Result<Vec<Record>> {
    import_csv(store, File::open(path)?)
}

/// Header positions of every field except `ID`.
struct ImportColumns {
    positions: [Option<usize>; 8],
}

impl ImportColumns {
    fn new(headers: &csv::StringRecord) -> Result<Self> {
        let mut positions = [None; 8];
        for (column, name) in headers.iter().enumerate() {
            let field: Field = name.trim().parse()?;
            if positions[field as usize].replace(column).is_some() {
                return Err(Error::Validation(format!("column '{field}' appears twice")));
            }
        }

        let missing: Vec<&str> = Field::ALL
            .into_iter()
            .filter(|field| *field != Field::Id && positions[*field as usize].is_none())
            .map(Field::name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::Validation(format!("missing columns: {}", missing.join(", "))));
        }
        Ok(Self { positions })
    }

    fn cell<'r>(&self, row: &'r csv::StringRecord, field: Field) -> Result<&'r str> {
        self.positions[field as usize]
            .and_then(|column| row.get(column))
            .ok_or_else(|| Error::Validation(format!("missing {field} cell")))
    }

    /// A record with a placeholder ID.
    fn parse(&self, row: &csv::StringRecord) -> Result<Record> {
        Ok(Record {
            id: RecordId(0),
            state: self.cell(row, Field::State)?.parse::<State>()?,
            priority: self.cell(row, Field::Priority)?.parse::<Priority>()?,
            category: parse_category(self.cell(row, Field::Category)?)?,
            title: self.cell(row, Field::Title)?.to_string(),
            points: parse_points(self.cell(row, Field::Points)?)?,
            time_spent: parse_time_spent(self.cell(row, Field::TimeSpent)?)?,
            details: self.cell(row, Field::Details)?.to_string(),
        })
    }
}
