//! Job tracking: checkpoint updates, group fan-out, and job lifecycle.

pub mod coordinator;
pub mod error;
pub mod jobs;
pub mod update;

use std::sync::Arc;

pub use coordinator::{AffectedJob, GroupUpdateCoordinator, UpdateMode, UpdateOutcome};
pub use error::TrackingError;
pub use jobs::JobService;
pub use update::{parse_payload, CheckpointUpdate, FieldChange};

use crate::config::Config;
use crate::db::Database;
use crate::error::FleetError;
use crate::status::StatusRules;

/// Everything a caller needs, wired from one configuration and one
/// database handle.
pub struct Tracker {
    jobs: JobService,
    coordinator: GroupUpdateCoordinator,
    rules: Arc<StatusRules>,
}

impl Tracker {
    /// Opens the configured database and builds the status rules.
    pub fn from_config(config: &Config) -> Result<Self, FleetError> {
        let db = Database::open_configured(&config.database)?;
        Self::with_database(config, db)
    }

    /// Wires a tracker over an already-open database.
    pub fn with_database(config: &Config, db: Database) -> Result<Self, FleetError> {
        let rules = Arc::new(StatusRules::from_config(&config.status)?);
        Ok(Self {
            jobs: JobService::new(db.clone(), Arc::clone(&rules)),
            coordinator: GroupUpdateCoordinator::new(db, Arc::clone(&rules), &config.groups),
            rules,
        })
    }

    pub fn jobs(&self) -> &JobService {
        &self.jobs
    }

    pub fn coordinator(&self) -> &GroupUpdateCoordinator {
        &self.coordinator
    }

    pub fn rules(&self) -> &StatusRules {
        &self.rules
    }
}
