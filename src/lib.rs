//! # `utasker`
//!
//! A micro task manager. Tasks move from the backlog through the workbench to
//! the archive, and are kept in a `SQLite` file or in memory.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
#[cfg(feature = "cli")]
pub mod logging;
pub mod tasks;

pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
