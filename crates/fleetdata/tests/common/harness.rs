//! Test harness for isolated tracker instances.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

use fleetdata::config::Config;
use fleetdata::db::job_repo::JobRow;
use fleetdata::tracking::{CheckpointUpdate, UpdateOutcome};
use fleetdata::{CheckpointRecord, Database, Tracker, TrackingError};

/// A tracker backed by a database file in its own temporary directory.
pub struct TestHarness {
    temp_dir: TempDir,
    pub db_path: PathBuf,
    pub db: Database,
    pub tracker: Tracker,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("data").join("fleetdata.db");
        let db = Database::open(&db_path).expect("Failed to open database");
        let tracker = Tracker::with_database(&config, db.clone()).expect("Failed to build tracker");
        Self {
            temp_dir,
            db_path,
            db,
            tracker,
        }
    }

    /// Create every job, panicking on failure.
    pub fn create_jobs(&self, jobs: impl IntoIterator<Item = JobRow>) {
        for job in jobs {
            self.tracker
                .jobs()
                .create_job(job)
                .expect("Failed to create job");
        }
    }

    pub fn apply(&self, update: CheckpointUpdate) -> Result<UpdateOutcome, TrackingError> {
        self.tracker.coordinator().apply(&update)
    }

    pub fn status(&self, load_id: &str) -> String {
        self.tracker
            .jobs()
            .get_job(load_id)
            .expect("Job should exist")
            .status
    }

    pub fn record(&self, load_id: &str) -> CheckpointRecord {
        self.tracker
            .jobs()
            .checkpoints(load_id)
            .expect("Job should exist")
    }

    /// Status and checkpoint record of each job, for before/after comparisons.
    pub fn snapshot(&self, load_ids: &[&str]) -> Vec<(String, CheckpointRecord)> {
        load_ids
            .iter()
            .map(|id| (self.status(id), self.record(id)))
            .collect()
    }

    /// Make every status write for `load_id` fail inside SQLite.
    pub fn fail_status_writes_for(&self, load_id: &str) {
        let sql = format!(
            "CREATE TRIGGER fail_{id} BEFORE UPDATE OF status ON jobs
             WHEN NEW.load_id = '{id}'
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
            id = load_id
        );
        self.db
            .with_conn(|conn| Ok(conn.execute_batch(&sql)?))
            .expect("Failed to install trigger");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
