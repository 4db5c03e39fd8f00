//! Builders for test jobs and configurations.

#![allow(dead_code)]

use fleetdata::config::Config;
use fleetdata::db::job_repo::JobRow;
use fleetdata::status::StatusRule;

/// Builder for job drafts passed to `JobService::create_job`.
pub struct JobBuilder {
    row: JobRow,
}

impl JobBuilder {
    pub fn new(load_id: &str) -> Self {
        Self {
            row: JobRow {
                load_id: load_id.to_string(),
                date_plan: Some("2026-03-01".to_string()),
                head_plate: Some("70-1234".to_string()),
                driver_name: Some("Somchai".to_string()),
                ..Default::default()
            },
        }
    }

    /// Put the job in a dispatch group.
    pub fn group(mut self, group: &str) -> Self {
        self.row.dispatch_group = Some(group.to_string());
        self
    }

    /// Set the origin location, which selects the status rule variant.
    pub fn origin(mut self, location: &str) -> Self {
        self.row.origin_location = Some(location.to_string());
        self
    }

    pub fn date_plan(mut self, date: &str) -> Self {
        self.row.date_plan = Some(date.to_string());
        self
    }

    pub fn build(self) -> JobRow {
        self.row
    }
}

/// Builder for `Config` instances.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn max_group_size(mut self, size: usize) -> Self {
        self.config.groups.max_size = size;
        self
    }

    /// Map an origin location to a rule variant.
    pub fn location(mut self, location: &str, variant: &str) -> Self {
        self.config
            .status
            .location_variants
            .insert(location.to_string(), variant.to_string());
        self
    }

    pub fn variant(mut self, name: &str, rules: Vec<StatusRule>) -> Self {
        self.config.status.variants.insert(name.to_string(), rules);
        self
    }

    pub fn initial_label(mut self, label: &str) -> Self {
        self.config.status.initial_label = Some(label.to_string());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
