//! `SQLite` implementation of [`RecordStore`].

use crate::error::{Error, Result};
use crate::tasks::fields::RECORD_FIELD_NAMES;
use crate::tasks::models::{Priority, Record, RecordId, State};
use crate::tasks::store::{
    category_additions, check_record, check_replace, LoadOptions, RecordStore, StoreLocation,
    EXAMPLE_TASKS, TERMINAL_STATE_MESSAGE,
};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Columns selected for every record query, in `parse_record` order.
const SELECT_RECORD: &str =
    "SELECT ID, State, Priority, Category, Title, Points, TimeSpent, Details FROM Tasks";

/// Reference tables that must exist in an opened database.
const REFERENCE_TABLES: [&str; 3] = ["Categories", "States", "Priorities"];

/// SQLite-based record store.
///
/// Holds one connection for its whole life; [`RecordStore::close`] releases it.
#[derive(Debug)]
pub struct SqliteRecordStore {
    conn: Option<Connection>,
    location: StoreLocation,
}

impl SqliteRecordStore {
    /// Open the store at `location`.
    ///
    /// In-memory locations, missing files and zero-length files get a fresh
    /// schema (and the example tasks if `options.seed_examples`). Any other
    /// file is opened as-is and checked against the expected schema.
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageOpen` if the file is not a task database.
    pub fn load(location: &StoreLocation, options: LoadOptions) -> Result<Self> {
        let open_error =
            |reason: String| Error::StorageOpen { location: location.to_string(), reason };

        let (conn, fresh) = match location {
            StoreLocation::InMemory => (Connection::open_in_memory()?, true),
            StoreLocation::File(path) => {
                let fresh = std::fs::metadata(path).map_or(true, |meta| meta.len() == 0);
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| open_error(e.to_string()))?;
                }
                (Connection::open(path).map_err(|e| open_error(e.to_string()))?, fresh)
            }
        };

        conn.execute_batch("PRAGMA journal_mode = WAL;").map_err(|e| open_error(e.to_string()))?;

        if fresh {
            Self::init_schema(&conn)?;
            if options.seed_examples {
                Self::seed_examples(&conn)?;
            }
            info!(location = %location, seeded = options.seed_examples, "initialised task store");
        } else {
            Self::verify_schema(&conn).map_err(open_error)?;
            info!(location = %location, "opened task store");
        }

        Ok(Self { conn: Some(conn), location: location.clone() })
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or(Error::Closed)
    }

    /// Create tables, the terminal-state trigger and the reference labels.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            r"
            CREATE TABLE IF NOT EXISTS Tasks (
                ID INTEGER PRIMARY KEY AUTOINCREMENT,
                State TEXT NOT NULL DEFAULT 'BACKLOG',
                Priority TEXT NOT NULL DEFAULT 'Low',
                Category TEXT NOT NULL DEFAULT '-',
                Title TEXT NOT NULL DEFAULT 'New Task',
                Points INTEGER NOT NULL DEFAULT 1 CHECK (Points >= 0),
                TimeSpent REAL NOT NULL DEFAULT 0.0 CHECK (TimeSpent >= 0),
                Details TEXT NOT NULL DEFAULT 'TBA'
            );

            CREATE TABLE IF NOT EXISTS Categories (Category TEXT PRIMARY KEY);
            CREATE TABLE IF NOT EXISTS States (State TEXT PRIMARY KEY);
            CREATE TABLE IF NOT EXISTS Priorities (Priority TEXT PRIMARY KEY);

            CREATE INDEX IF NOT EXISTS idx_tasks_state ON Tasks(State);

            -- Retired tasks keep their state
            CREATE TRIGGER IF NOT EXISTS tasks_terminal_state
            BEFORE UPDATE OF State ON Tasks
            WHEN OLD.State IN ('DONE', 'CANCELLED')
            BEGIN
                SELECT RAISE(ABORT, '{}');
            END;

            INSERT OR IGNORE INTO Categories (Category) VALUES ('-');
            ",
            TERMINAL_STATE_MESSAGE.replace('\'', "''")
        ))?;

        for state in State::ALL {
            conn.execute(
                "INSERT OR IGNORE INTO States (State) VALUES (?1)",
                params![state.as_str()],
            )?;
        }
        for priority in Priority::ALL {
            conn.execute(
                "INSERT OR IGNORE INTO Priorities (Priority) VALUES (?1)",
                params![priority.as_str()],
            )?;
        }
        Ok(())
    }

    fn seed_examples(conn: &Connection) -> Result<()> {
        for (title, points, details) in EXAMPLE_TASKS {
            conn.execute(
                "INSERT INTO Tasks (Title, Points, Details) VALUES (?1, ?2, ?3)",
                params![title, points, details],
            )?;
        }
        Ok(())
    }

    /// Check that an existing database has the task schema.
    fn verify_schema(conn: &Connection) -> std::result::Result<(), String> {
        let tables: BTreeSet<String> =
            collect_labels(conn, "SELECT name FROM sqlite_master WHERE type = 'table'")
                .map_err(|e| e.to_string())?
                .into_iter()
                .collect();

        for table in std::iter::once("Tasks").chain(REFERENCE_TABLES) {
            if !tables.contains(table) {
                return Err(format!("missing table {table}"));
            }
        }

        let columns: BTreeSet<String> =
            collect_labels(conn, "SELECT name FROM pragma_table_info('Tasks')")
                .map_err(|e| e.to_string())?
                .into_iter()
                .collect();
        let expected: BTreeSet<String> =
            RECORD_FIELD_NAMES.iter().map(|name| (*name).to_string()).collect();
        if columns != expected {
            return Err(format!(
                "Tasks columns are [{}], expected [{}]",
                columns.into_iter().collect::<Vec<_>>().join(", "),
                RECORD_FIELD_NAMES.join(", ")
            ));
        }

        for sql in ["SELECT State FROM States", "SELECT DISTINCT State FROM Tasks"] {
            for label in collect_labels(conn, sql).map_err(|e| e.to_string())? {
                label.parse::<State>().map_err(|e| e.to_string())?;
            }
        }
        for sql in ["SELECT Priority FROM Priorities", "SELECT DISTINCT Priority FROM Tasks"] {
            for label in collect_labels(conn, sql).map_err(|e| e.to_string())? {
                label.parse::<Priority>().map_err(|e| e.to_string())?;
            }
        }

        Ok(())
    }

    /// Parse a record from a row selected with [`SELECT_RECORD`].
    fn parse_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
        let state: String = row.get(1)?;
        let priority: String = row.get(2)?;

        Ok(Record {
            id: RecordId(row.get(0)?),
            state: state.parse().map_err(|e| conversion_error(1, e))?,
            priority: priority.parse().map_err(|e| conversion_error(2, e))?,
            category: row.get(3)?,
            title: row.get(4)?,
            points: row.get(5)?,
            time_spent: row.get(6)?,
            details: row.get(7)?,
        })
    }

    fn query_record(conn: &Connection, id: RecordId) -> Result<Option<Record>> {
        let record = conn
            .query_row(
                &format!("{SELECT_RECORD} WHERE ID = ?1"),
                params![id.0],
                Self::parse_record,
            )
            .optional()?;
        Ok(record)
    }

    fn query_labels(&self, sql: &str) -> Result<Vec<String>> {
        Ok(collect_labels(self.conn()?, sql)?)
    }
}

/// Run a query whose rows are single text labels.
fn collect_labels(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let labels = stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(labels)
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Map constraint failures from an update.
///
/// Only the terminal-state trigger becomes `Error::ConstraintViolation`; a
/// failed CHECK or NOT NULL is a bad value and becomes `Error::Validation`.
fn constraint_error(err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(code, Some(message))
            if code.code == ErrorCode::ConstraintViolation =>
        {
            if message.contains(TERMINAL_STATE_MESSAGE) {
                Error::ConstraintViolation(message)
            } else {
                Error::Validation(message)
            }
        }
        other => Error::Database(other),
    }
}

impl RecordStore for SqliteRecordStore {
    fn new_record(&mut self) -> Result<Record> {
        let tx = self.conn_mut()?.transaction()?;
        tx.execute("INSERT INTO Tasks DEFAULT VALUES", [])?;
        let id = RecordId(tx.last_insert_rowid());
        let record = Self::query_record(&tx, id)?.ok_or(Error::NotFound(id))?;
        tx.commit()?;

        debug!(id = %record.id, "new_record");
        Ok(record)
    }

    fn get_record(&self, id: RecordId) -> Result<Record> {
        Self::query_record(self.conn()?, id)?.ok_or(Error::NotFound(id))
    }

    fn set_record(&mut self, record: &Record) -> Result<()> {
        let tx = self.conn_mut()?.transaction()?;
        let current = Self::query_record(&tx, record.id)?.ok_or(Error::NotFound(record.id))?;
        check_record(record)?;
        check_replace(&current)?;

        tx.execute(
            "UPDATE Tasks
             SET State = ?1, Priority = ?2, Category = ?3, Title = ?4,
                 Points = ?5, TimeSpent = ?6, Details = ?7
             WHERE ID = ?8",
            params![
                record.state.as_str(),
                record.priority.as_str(),
                record.category,
                record.title,
                record.points,
                record.time_spent,
                record.details,
                record.id.0,
            ],
        )
        .map_err(constraint_error)?;
        tx.commit()?;

        debug!(id = %record.id, state = %record.state, "set_record");
        Ok(())
    }

    fn view_dataset(&self, states: &[State]) -> Result<Vec<Record>> {
        let conn = self.conn()?;
        let sql = if states.is_empty() {
            format!("{SELECT_RECORD} ORDER BY ID")
        } else {
            let placeholders = vec!["?"; states.len()].join(", ");
            format!("{SELECT_RECORD} WHERE State IN ({placeholders}) ORDER BY ID")
        };

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(states.iter().map(|s| s.as_str())), Self::parse_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn get_categories(&self) -> Result<BTreeSet<String>> {
        Ok(self.query_labels("SELECT Category FROM Categories")?.into_iter().collect())
    }

    fn update_categories(&mut self, live: &BTreeSet<String>) -> Result<()> {
        let stored = self.get_categories()?;
        let additions = category_additions(&stored, live)?;
        if additions.is_empty() {
            return Ok(());
        }

        let tx = self.conn_mut()?.transaction()?;
        for category in &additions {
            tx.execute(
                "INSERT OR IGNORE INTO Categories (Category) VALUES (?1)",
                params![category],
            )?;
        }
        tx.commit()?;

        debug!(added = ?additions, "update_categories");
        Ok(())
    }

    fn get_states(&self) -> Result<Vec<String>> {
        self.query_labels("SELECT State FROM States ORDER BY rowid")
    }

    fn get_priorities(&self) -> Result<Vec<String>> {
        self.query_labels("SELECT Priority FROM Priorities ORDER BY rowid")
    }

    fn close(&mut self) -> Result<()> {
        let conn = self.conn.take().ok_or(Error::Closed)?;
        conn.close().map_err(|(_, e)| Error::Database(e))?;
        info!(location = %self.location, "closed task store");
        Ok(())
    }
}
