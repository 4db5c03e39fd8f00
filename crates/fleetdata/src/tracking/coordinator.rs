//! Group update coordinator.
//!
//! Applies a checkpoint update to one job, or to every job in its dispatch
//! group, and recomputes each job's status. All writes for a request share
//! one transaction: either every affected job changes or none does.
//!
//! Fan-out happens only when the caller asks for it, the target job has a
//! dispatch group, and the update touches nothing but early-journey
//! checkpoints. In every other case the update quietly applies to the
//! target alone.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;

use super::{CheckpointUpdate, TrackingError};
use crate::config::GroupConfig;
use crate::db::job_repo::{self, JobRow};
use crate::db::{checkpoint_repo, Database, DatabaseError};
use crate::status::{CheckpointRecord, StatusRules};

/// Whether an update was applied to one job or a whole dispatch group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    Single,
    Group,
}

impl UpdateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateMode::Single => "single",
            UpdateMode::Group => "group",
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// New status of one affected job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedJob {
    pub load_id: String,
    pub status: String,
}

/// Result of a committed checkpoint update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub mode: UpdateMode,
    /// Number of jobs the update was applied to.
    pub group_size: usize,
    pub affected: Vec<AffectedJob>,
}

impl UpdateOutcome {
    pub fn status_of(&self, load_id: &str) -> Option<&str> {
        self.affected
            .iter()
            .find(|job| job.load_id == load_id)
            .map(|job| job.status.as_str())
    }
}

pub struct GroupUpdateCoordinator {
    db: Database,
    rules: Arc<StatusRules>,
    max_group_size: usize,
}

impl GroupUpdateCoordinator {
    pub fn new(db: Database, rules: Arc<StatusRules>, groups: &GroupConfig) -> Self {
        Self {
            db,
            rules,
            max_group_size: groups.max_size,
        }
    }

    /// Applies an update using the payload's own `apply_to_group` flag.
    pub fn apply(&self, update: &CheckpointUpdate) -> Result<UpdateOutcome, TrackingError> {
        self.apply_checkpoint_update(update, update.applies_to_group())
    }

    /// Applies `update` to its target job, or to the target's whole dispatch
    /// group when `apply_to_group` is set and the update allows it.
    ///
    /// On error nothing is written and the error is returned unchanged.
    pub fn apply_checkpoint_update(
        &self,
        update: &CheckpointUpdate,
        apply_to_group: bool,
    ) -> Result<UpdateOutcome, TrackingError> {
        update.validate()?;

        let span = tracing::info_span!(
            "checkpoint_update",
            load_id = %update.load_id,
            mode = tracing::field::Empty,
            group_size = tracing::field::Empty,
        );
        let _enter = span.enter();

        let result = self.db.with_transaction(|tx| -> Result<UpdateOutcome, TrackingError> {
            let target = job_repo::find_by_id(tx, &update.load_id)?
                .ok_or_else(|| TrackingError::NotFound(update.load_id.clone()))?;

            let (mode, jobs) = self.resolve_scope(tx, target, update, apply_to_group)?;
            span.record("mode", mode.as_str());
            span.record("group_size", jobs.len());

            let now = Utc::now().to_rfc3339();
            let mut affected = Vec::with_capacity(jobs.len());
            for job in &jobs {
                affected.push(self.apply_to_job(tx, job, update, &now)?);
            }

            Ok(UpdateOutcome {
                mode,
                group_size: affected.len(),
                affected,
            })
        });

        match &result {
            Ok(outcome) => tracing::info!(
                mode = %outcome.mode,
                group_size = outcome.group_size,
                "Checkpoint update committed"
            ),
            Err(e) => tracing::warn!(error = %e, "Checkpoint update rolled back"),
        }
        result
    }

    /// Decides which jobs the update applies to.
    fn resolve_scope(
        &self,
        conn: &Connection,
        target: JobRow,
        update: &CheckpointUpdate,
        apply_to_group: bool,
    ) -> Result<(UpdateMode, Vec<JobRow>), TrackingError> {
        let Some(group) = job_repo::group_key(target.dispatch_group.as_deref()) else {
            return Ok((UpdateMode::Single, vec![target]));
        };

        if !apply_to_group {
            return Ok((UpdateMode::Single, vec![target]));
        }
        if !update.is_early_journey_only() {
            tracing::debug!(
                group = %group,
                "Update touches late checkpoints, applying to target only"
            );
            return Ok((UpdateMode::Single, vec![target]));
        }

        let size = job_repo::count_by_group(conn, &group)?;
        if size > self.max_group_size as u64 {
            return Err(TrackingError::GroupTooLarge {
                group,
                size,
                limit: self.max_group_size,
            });
        }

        let members = job_repo::find_by_group(conn, &group)?;
        if !members.iter().any(|job| job.load_id == target.load_id) {
            return Err(DatabaseError::GroupMismatch {
                group,
                load_id: target.load_id,
            }
            .into());
        }
        Ok((UpdateMode::Group, members))
    }

    /// Merges the update into one job's record and refreshes its status.
    fn apply_to_job(
        &self,
        conn: &Connection,
        job: &JobRow,
        update: &CheckpointUpdate,
        now: &str,
    ) -> Result<AffectedJob, TrackingError> {
        let existing = checkpoint_repo::find(conn, &job.load_id)?;
        let is_new = existing.is_none();
        let mut record = existing.unwrap_or_else(|| CheckpointRecord::new(&job.load_id));

        update.apply_to(&mut record);
        if is_new {
            checkpoint_repo::insert(conn, &record)?;
        } else {
            checkpoint_repo::update(conn, &record)?;
        }

        let variant = self.rules.variant_for(job.origin_location.as_deref());
        let status = variant.derive(&record);
        if !status.is_empty() {
            job_repo::update_status(conn, &job.load_id, status, now)?;
        }

        tracing::debug!(
            load_id = %job.load_id,
            variant = variant.name,
            status,
            created_record = is_new,
            "Checkpoint record updated"
        );

        Ok(AffectedJob {
            load_id: job.load_id.clone(),
            status: status.to_string(),
        })
    }
}
