pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod status;
pub mod tracking;

pub use config::{load_config, Config};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, FleetError, Result};
pub use status::{derive_status, Checkpoint, CheckpointRecord, StatusRules};
pub use tracking::{
    CheckpointUpdate, GroupUpdateCoordinator, JobService, Tracker, TrackingError, UpdateMode,
    UpdateOutcome,
};
