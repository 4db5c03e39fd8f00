//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite, including constraint violations.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating the database directory.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No database path was configured and no home directory exists.
    #[error("No database path configured and home directory is unknown")]
    NoHomeDirectory,

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// A write that must touch exactly one row touched none.
    #[error("No row in '{table}' for load id '{load_id}'")]
    MissingRow { table: &'static str, load_id: String },

    /// A job's own dispatch group lookup did not return the job.
    #[error("Job '{load_id}' is missing from its dispatch group '{group}'")]
    GroupMismatch { group: String, load_id: String },

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,
}
