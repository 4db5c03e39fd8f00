use thiserror::Error;

use crate::db::DatabaseError;

/// Errors from job tracking operations.
#[derive(Error, Debug)]
pub enum TrackingError {
    /// The referenced job does not exist.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// A job with this load id already exists.
    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    /// The request payload failed validation; nothing was written.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The dispatch group is larger than the configured fan-out limit.
    #[error("Dispatch group '{group}' has {size} jobs, more than the limit of {limit}")]
    GroupTooLarge {
        group: String,
        size: u64,
        limit: usize,
    },

    /// Storage failed; the whole request was rolled back.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl TrackingError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller sent a bad request, as opposed to a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::AlreadyExists(_)
                | Self::Validation { .. }
                | Self::GroupTooLarge { .. }
        )
    }
}
