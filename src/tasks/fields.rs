//! Record fields and the mapping between field names and display columns.
//!
//! The presentation layer works with plain rows: one string per column. A
//! [`ColumnMap`] is built once from a list of field names (normally
//! [`RECORD_FIELD_NAMES`], or a configured display order) and is the only
//! place that knows which column holds which field.

use crate::error::{Error, Result};
use crate::tasks::models::{Priority, Record, RecordId, State};
use std::fmt;
use std::str::FromStr;

/// Field names in store order. Also the CSV header.
pub const RECORD_FIELD_NAMES: [&str; 8] =
    ["ID", "State", "Priority", "Category", "Title", "Points", "TimeSpent", "Details"];

/// One field of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `ID`
    Id,
    /// `State`
    State,
    /// `Priority`
    Priority,
    /// `Category`
    Category,
    /// `Title`
    Title,
    /// `Points`
    Points,
    /// `TimeSpent`
    TimeSpent,
    /// `Details`
    Details,
}

impl Field {
    /// Every field in store order.
    pub const ALL: [Self; 8] = [
        Self::Id,
        Self::State,
        Self::Priority,
        Self::Category,
        Self::Title,
        Self::Points,
        Self::TimeSpent,
        Self::Details,
    ];

    /// The field's column name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        RECORD_FIELD_NAMES[self as usize]
    }

    /// Render this field of `record` as display text.
    #[must_use]
    pub fn display(self, record: &Record) -> String {
        match self {
            Self::Id => record.id.to_string(),
            Self::State => record.state.to_string(),
            Self::Priority => record.priority.to_string(),
            Self::Category => record.category.clone(),
            Self::Title => record.title.clone(),
            Self::Points => record.points.to_string(),
            Self::TimeSpent => format_time_spent(record.time_spent),
            Self::Details => record.details.clone(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| Error::Validation(format!("unknown field: '{s}'")))
    }
}

/// Format a time-spent value so that whole numbers keep one decimal place.
#[must_use]
pub fn format_time_spent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Parse a record ID.
///
/// # Errors
///
/// Returns `Error::Validation` unless the text is a positive integer.
pub fn parse_id(text: &str) -> Result<RecordId> {
    match text.parse::<RecordId>() {
        Ok(id) if id.0 > 0 => Ok(id),
        _ => Err(Error::Validation(format!("invalid ID: '{text}'"))),
    }
}

/// Parse a points estimate.
///
/// # Errors
///
/// Returns `Error::Validation` unless the text is a non-negative integer.
pub fn parse_points(text: &str) -> Result<u32> {
    text.trim().parse().map_err(|_| Error::Validation(format!("invalid points: '{text}'")))
}

/// Parse a time-spent value.
///
/// # Errors
///
/// Returns `Error::Validation` unless the text is a finite, non-negative number.
pub fn parse_time_spent(text: &str) -> Result<f64> {
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Validation(format!("invalid time spent: '{text}'")))?;
    check_time_spent(value)?;
    Ok(value)
}

/// Check that a time-spent value can be stored.
///
/// # Errors
///
/// Returns `Error::Validation` unless the value is finite and non-negative.
pub fn check_time_spent(value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!("invalid time spent: {value}")))
    }
}

/// Validate a category label, trimming surrounding whitespace.
///
/// # Errors
///
/// Returns `Error::Validation` if the label is blank.
pub fn parse_category(text: &str) -> Result<String> {
    let label = text.trim();
    check_category(label)?;
    Ok(label.to_string())
}

/// Check that a category label can be stored as-is.
///
/// # Errors
///
/// Returns `Error::Validation` if the label is blank or has surrounding
/// whitespace.
pub fn check_category(label: &str) -> Result<()> {
    if label.trim().is_empty() {
        return Err(Error::Validation("category must not be blank".to_string()));
    }
    if label.trim() != label {
        return Err(Error::Validation(format!("category '{label}' has surrounding whitespace")));
    }
    Ok(())
}

/// Bidirectional mapping between fields and display columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: Vec<Field>,
    positions: [usize; 8],
}

impl ColumnMap {
    /// Build a mapping from column names in display order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a name is unknown, repeated, or if any
    /// field is missing.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut columns = Vec::with_capacity(names.len());
        let mut positions = [usize::MAX; 8];

        for (column, name) in names.iter().enumerate() {
            let field: Field = name.as_ref().parse()?;
            if positions[field as usize] != usize::MAX {
                return Err(Error::Validation(format!("column '{field}' appears twice")));
            }
            positions[field as usize] = column;
            columns.push(field);
        }

        let missing: Vec<&str> = Field::ALL
            .into_iter()
            .filter(|field| positions[*field as usize] == usize::MAX)
            .map(Field::name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::Validation(format!("missing columns: {}", missing.join(", "))));
        }

        Ok(Self { columns, positions })
    }

    /// Column holding `field`.
    #[must_use]
    pub const fn column(&self, field: Field) -> usize {
        self.positions[field as usize]
    }

    /// Column names in display order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|field| field.name()).collect()
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false: every field has a column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Render a record as a display row.
    #[must_use]
    pub fn row(&self, record: &Record) -> Vec<String> {
        self.columns.iter().map(|field| field.display(record)).collect()
    }

    /// Rebuild a full record from a display row.
    ///
    /// Every cell is validated before anything is returned; nothing is
    /// partially applied.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the row has the wrong width or any cell
    /// does not parse.
    pub fn parse_row<S: AsRef<str>>(&self, cells: &[S]) -> Result<Record> {
        if cells.len() != self.columns.len() {
            return Err(Error::Validation(format!(
                "row has {} cells, expected {}",
                cells.len(),
                self.columns.len()
            )));
        }
        let cell = |field: Field| cells[self.column(field)].as_ref();

        Ok(Record {
            id: parse_id(cell(Field::Id))?,
            state: cell(Field::State).parse::<State>()?,
            priority: cell(Field::Priority).parse::<Priority>()?,
            category: parse_category(cell(Field::Category))?,
            title: cell(Field::Title).to_string(),
            points: parse_points(cell(Field::Points))?,
            time_spent: parse_time_spent(cell(Field::TimeSpent))?,
            details: cell(Field::Details).to_string(),
        })
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self { columns: Field::ALL.to_vec(), positions: [0, 1, 2, 3, 4, 5, 6, 7] }
    }
}
