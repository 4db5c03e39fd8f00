//! Job lifecycle operations around the coordinator: create, read, list,
//! delete, and status maintenance.

use std::sync::Arc;

use chrono::Utc;

use super::TrackingError;
use crate::db::job_repo::{self, JobFilter, JobRow};
use crate::db::pallet_repo::{self, PalletRow, PalletUpdate};
use crate::db::{checkpoint_repo, Database};
use crate::status::{CheckpointRecord, StatusRules};

pub struct JobService {
    db: Database,
    rules: Arc<StatusRules>,
}

impl JobService {
    pub fn new(db: Database, rules: Arc<StatusRules>) -> Self {
        Self { db, rules }
    }

    /// Creates a job together with its empty checkpoint record.
    ///
    /// Any `status` on the draft is ignored: a new job starts at the status
    /// its empty record derives to.
    pub fn create_job(&self, draft: JobRow) -> Result<JobRow, TrackingError> {
        let load_id = draft.load_id.trim().to_string();
        if load_id.is_empty() {
            return Err(TrackingError::validation("load_id", "must not be empty"));
        }

        let now = Utc::now().to_rfc3339();
        let record = CheckpointRecord::new(&load_id);
        let status = self
            .rules
            .variant_for(draft.origin_location.as_deref())
            .derive(&record)
            .to_string();

        let job = JobRow {
            load_id,
            dispatch_group: job_repo::group_key(draft.dispatch_group.as_deref()),
            status,
            created_at: if draft.created_at.is_empty() {
                now.clone()
            } else {
                draft.created_at.clone()
            },
            updated_at: now,
            ..draft
        };

        self.db.with_transaction(|tx| -> Result<(), TrackingError> {
            if job_repo::find_by_id(tx, &job.load_id)?.is_some() {
                return Err(TrackingError::AlreadyExists(job.load_id.clone()));
            }
            job_repo::insert(tx, &job)?;
            checkpoint_repo::insert(tx, &record)?;
            Ok(())
        })?;

        log::info!("Created job {} with status '{}'", job.load_id, job.status);
        Ok(job)
    }

    pub fn get_job(&self, load_id: &str) -> Result<JobRow, TrackingError> {
        self.db
            .with_conn(|conn| job_repo::find_by_id(conn, load_id))?
            .ok_or_else(|| TrackingError::NotFound(load_id.to_string()))
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Result<(Vec<JobRow>, u64), TrackingError> {
        let filter = JobFilter {
            dispatch_group: job_repo::group_key(filter.dispatch_group.as_deref()),
            ..filter.clone()
        };
        Ok(self.db.with_conn(|conn| job_repo::query(conn, &filter))?)
    }

    /// Jobs that share the dispatch group of `load_id`, or just the job
    /// itself when it has no group.
    pub fn group_members(&self, load_id: &str) -> Result<Vec<JobRow>, TrackingError> {
        let job = self.get_job(load_id)?;
        match job_repo::group_key(job.dispatch_group.as_deref()) {
            Some(group) => Ok(self
                .db
                .with_conn(|conn| job_repo::find_by_group(conn, &group))?),
            None => Ok(vec![job]),
        }
    }

    /// The job's checkpoint record. A job whose record was never written
    /// reads as an empty record.
    pub fn checkpoints(&self, load_id: &str) -> Result<CheckpointRecord, TrackingError> {
        self.db.with_conn(|conn| {
            if job_repo::find_by_id(conn, load_id)?.is_none() {
                return Ok(None);
            }
            Ok(Some(
                checkpoint_repo::find(conn, load_id)?
                    .unwrap_or_else(|| CheckpointRecord::new(load_id)),
            ))
        })?
        .ok_or_else(|| TrackingError::NotFound(load_id.to_string()))
    }

    /// Removes a job along with its checkpoint and pallet records.
    pub fn delete_job(&self, load_id: &str) -> Result<(), TrackingError> {
        let removed = self
            .db
            .with_transaction(|tx| -> Result<bool, TrackingError> {
                Ok(job_repo::delete(tx, load_id)?)
            })?;
        if !removed {
            return Err(TrackingError::NotFound(load_id.to_string()));
        }
        log::info!("Deleted job {}", load_id);
        Ok(())
    }

    /// Re-derives the status from the stored record and writes it back if
    /// it drifted. Returns the current status.
    pub fn refresh_status(&self, load_id: &str) -> Result<String, TrackingError> {
        self.db.with_transaction(|tx| -> Result<String, TrackingError> {
            let job = job_repo::find_by_id(tx, load_id)?
                .ok_or_else(|| TrackingError::NotFound(load_id.to_string()))?;
            let record = checkpoint_repo::find(tx, load_id)?
                .unwrap_or_else(|| CheckpointRecord::new(load_id));

            let status = self
                .rules
                .variant_for(job.origin_location.as_deref())
                .derive(&record);
            if !status.is_empty() && status != job.status {
                log::warn!(
                    "Status of job {} drifted from '{}' to '{}', repairing",
                    load_id,
                    job.status,
                    status
                );
                job_repo::update_status(tx, load_id, status, &Utc::now().to_rfc3339())?;
                return Ok(status.to_string());
            }
            Ok(job.status)
        })
    }

    /// Derives a status for an arbitrary record without persisting anything.
    pub fn preview_status(&self, record: &CheckpointRecord, origin_location: Option<&str>) -> String {
        self.rules.preview(record, origin_location)
    }

    pub fn record_pallets(&self, update: &PalletUpdate) -> Result<PalletRow, TrackingError> {
        self.db.with_transaction(|tx| -> Result<PalletRow, TrackingError> {
            if job_repo::find_by_id(tx, &update.load_id)?.is_none() {
                return Err(TrackingError::NotFound(update.load_id.clone()));
            }
            Ok(pallet_repo::apply_update(tx, update)?)
        })
    }

    pub fn pallets(&self, load_id: &str) -> Result<Option<PalletRow>, TrackingError> {
        Ok(self.db.with_conn(|conn| pallet_repo::find(conn, load_id))?)
    }
}
