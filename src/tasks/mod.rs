//! Task records, their stores, and the screens that edit them.
//!
//! Tasks move through six workflow states and are shown on three screens:
//! - Backlog: BACKLOG and UPCOMING tasks; add, clone and edit
//! - Workbench: UPCOMING, ACTIVE and REVIEW tasks; edit and track time
//! - Archive: DONE and CANCELLED tasks; read-only, clone back to the backlog
//!
//! DONE and CANCELLED are final. Every store refuses to replace a record in
//! either state.
//!
//! # Example
//!
//! ```no_run
//! use utasker::tasks::{
//!     open_store, reconcile, Backend, Draft, Field, LoadOptions, StoreLocation,
//! };
//!
//! let location = StoreLocation::File("/tmp/tasks.db".into());
//! let mut store = open_store(Backend::Sqlite, &location, LoadOptions::default()).unwrap();
//!
//! let task = store.new_record().unwrap();
//! let mut draft = Draft::default();
//! draft.stage(Field::Title, "Write spec").unwrap();
//! draft.stage(Field::Points, "3").unwrap();
//! reconcile(store.as_mut(), task.id, &draft).unwrap();
//! ```

pub mod fields;
pub mod memory;
pub mod models;
pub mod session;
pub mod sqlite;
pub mod store;
pub mod transfer;
pub mod view;

pub use fields::{ColumnMap, Field, RECORD_FIELD_NAMES};
pub use memory::MemoryRecordStore;
pub use models::{InvalidPriority, InvalidState, Priority, Record, RecordId, State};
pub use session::{
    commit_row, reconcile, CommitOutcome, Draft, EditSession, Notice, TimeAdjustment,
    TimeSpentAccumulator,
};
pub use sqlite::SqliteRecordStore;
pub use store::{open_store, Backend, LoadOptions, RecordStore, StoreLocation};
pub use transfer::{export_csv, export_csv_path, import_csv, import_csv_path};
pub use view::{project, Screen};
