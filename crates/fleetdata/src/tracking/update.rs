//! Checkpoint update payload.
//!
//! Every checkpoint has a named `*_datetime` and `*_coords` field. A field
//! that is absent leaves the stored value alone; `null` or an empty string
//! clears it. Unknown keys are rejected during deserialization.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::TrackingError;
use crate::status::{Checkpoint, CheckpointRecord};

static RE_COORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d{1,3}(?:\.\d+)?)\s*,\s*(-?\d{1,3}(?:\.\d+)?)\s*$").unwrap()
});

/// Timestamp layouts accepted besides RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A requested change to one stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Set(String),
    Clear,
}

impl FieldChange {
    /// Normalizes a raw payload value: missing or blank means clear.
    pub fn from_raw(raw: Option<String>) -> Self {
        match raw {
            Some(value) if !value.trim().is_empty() => FieldChange::Set(value.trim().to_string()),
            _ => FieldChange::Clear,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            FieldChange::Set(value) => Some(value.as_str()),
            FieldChange::Clear => None,
        }
    }
}

fn field_change<'de, D>(deserializer: D) -> Result<Option<FieldChange>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(Some(FieldChange::from_raw(raw)))
}

/// A partial update to one job's checkpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointUpdate {
    pub load_id: String,
    /// Propagate to the job's dispatch group when allowed. Defaults to true.
    #[serde(default)]
    pub apply_to_group: Option<bool>,

    #[serde(default, deserialize_with = "field_change")]
    pub start_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub origin_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change", alias = "start_recive_datetime")]
    pub start_receive_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change", alias = "end_recive_datetime")]
    pub end_receive_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub intransit_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change", alias = "desination_datetime")]
    pub destination_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub start_unload_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub end_unload_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change", alias = "docs_submitted")]
    pub docs_submitted_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change", alias = "docs_returned")]
    pub docs_returned_datetime: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub complete_datetime: Option<FieldChange>,

    #[serde(default, deserialize_with = "field_change")]
    pub start_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub origin_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub start_receive_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub end_receive_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub intransit_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub destination_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub start_unload_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub end_unload_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub docs_submitted_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub docs_returned_coords: Option<FieldChange>,
    #[serde(default, deserialize_with = "field_change")]
    pub complete_coords: Option<FieldChange>,
}

impl CheckpointUpdate {
    /// An update for `load_id` that changes nothing yet.
    pub fn for_load(load_id: impl Into<String>) -> Self {
        Self {
            load_id: load_id.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, TrackingError> {
        parse_payload(json)
    }

    /// Sets the timestamp of a checkpoint.
    pub fn set(mut self, checkpoint: Checkpoint, at: impl Into<String>) -> Self {
        *self.time_slot_mut(checkpoint) = Some(FieldChange::from_raw(Some(at.into())));
        self
    }

    /// Clears the timestamp of a checkpoint.
    pub fn clear(mut self, checkpoint: Checkpoint) -> Self {
        *self.time_slot_mut(checkpoint) = Some(FieldChange::Clear);
        self
    }

    /// Sets the coordinate of a checkpoint.
    pub fn set_coords(mut self, checkpoint: Checkpoint, coords: impl Into<String>) -> Self {
        *self.coords_slot_mut(checkpoint) = Some(FieldChange::from_raw(Some(coords.into())));
        self
    }

    pub fn with_group_flag(mut self, apply_to_group: bool) -> Self {
        self.apply_to_group = Some(apply_to_group);
        self
    }

    pub fn applies_to_group(&self) -> bool {
        self.apply_to_group.unwrap_or(true)
    }

    pub fn time_change(&self, checkpoint: Checkpoint) -> Option<&FieldChange> {
        match checkpoint {
            Checkpoint::Start => self.start_datetime.as_ref(),
            Checkpoint::OriginArrival => self.origin_datetime.as_ref(),
            Checkpoint::LoadingStart => self.start_receive_datetime.as_ref(),
            Checkpoint::LoadingEnd => self.end_receive_datetime.as_ref(),
            Checkpoint::InTransit => self.intransit_datetime.as_ref(),
            Checkpoint::DestinationArrival => self.destination_datetime.as_ref(),
            Checkpoint::UnloadingStart => self.start_unload_datetime.as_ref(),
            Checkpoint::UnloadingEnd => self.end_unload_datetime.as_ref(),
            Checkpoint::DocsSubmitted => self.docs_submitted_datetime.as_ref(),
            Checkpoint::DocsReturned => self.docs_returned_datetime.as_ref(),
            Checkpoint::Complete => self.complete_datetime.as_ref(),
        }
    }

    pub fn coords_change(&self, checkpoint: Checkpoint) -> Option<&FieldChange> {
        match checkpoint {
            Checkpoint::Start => self.start_coords.as_ref(),
            Checkpoint::OriginArrival => self.origin_coords.as_ref(),
            Checkpoint::LoadingStart => self.start_receive_coords.as_ref(),
            Checkpoint::LoadingEnd => self.end_receive_coords.as_ref(),
            Checkpoint::InTransit => self.intransit_coords.as_ref(),
            Checkpoint::DestinationArrival => self.destination_coords.as_ref(),
            Checkpoint::UnloadingStart => self.start_unload_coords.as_ref(),
            Checkpoint::UnloadingEnd => self.end_unload_coords.as_ref(),
            Checkpoint::DocsSubmitted => self.docs_submitted_coords.as_ref(),
            Checkpoint::DocsReturned => self.docs_returned_coords.as_ref(),
            Checkpoint::Complete => self.complete_coords.as_ref(),
        }
    }

    fn time_slot_mut(&mut self, checkpoint: Checkpoint) -> &mut Option<FieldChange> {
        match checkpoint {
            Checkpoint::Start => &mut self.start_datetime,
            Checkpoint::OriginArrival => &mut self.origin_datetime,
            Checkpoint::LoadingStart => &mut self.start_receive_datetime,
            Checkpoint::LoadingEnd => &mut self.end_receive_datetime,
            Checkpoint::InTransit => &mut self.intransit_datetime,
            Checkpoint::DestinationArrival => &mut self.destination_datetime,
            Checkpoint::UnloadingStart => &mut self.start_unload_datetime,
            Checkpoint::UnloadingEnd => &mut self.end_unload_datetime,
            Checkpoint::DocsSubmitted => &mut self.docs_submitted_datetime,
            Checkpoint::DocsReturned => &mut self.docs_returned_datetime,
            Checkpoint::Complete => &mut self.complete_datetime,
        }
    }

    fn coords_slot_mut(&mut self, checkpoint: Checkpoint) -> &mut Option<FieldChange> {
        match checkpoint {
            Checkpoint::Start => &mut self.start_coords,
            Checkpoint::OriginArrival => &mut self.origin_coords,
            Checkpoint::LoadingStart => &mut self.start_receive_coords,
            Checkpoint::LoadingEnd => &mut self.end_receive_coords,
            Checkpoint::InTransit => &mut self.intransit_coords,
            Checkpoint::DestinationArrival => &mut self.destination_coords,
            Checkpoint::UnloadingStart => &mut self.start_unload_coords,
            Checkpoint::UnloadingEnd => &mut self.end_unload_coords,
            Checkpoint::DocsSubmitted => &mut self.docs_submitted_coords,
            Checkpoint::DocsReturned => &mut self.docs_returned_coords,
            Checkpoint::Complete => &mut self.complete_coords,
        }
    }

    /// Checkpoints this update changes in any way, earliest first.
    pub fn touched(&self) -> Vec<Checkpoint> {
        Checkpoint::ALL
            .into_iter()
            .filter(|cp| self.time_change(*cp).is_some() || self.coords_change(*cp).is_some())
            .collect()
    }

    /// True when every touched checkpoint is one a convoy shares at pickup.
    pub fn is_early_journey_only(&self) -> bool {
        self.touched().iter().all(|cp| cp.is_early_journey())
    }

    /// Boundary checks run before any storage access.
    pub fn validate(&self) -> Result<(), TrackingError> {
        if self.load_id.trim().is_empty() {
            return Err(TrackingError::validation("load_id", "must not be empty"));
        }
        if self.touched().is_empty() {
            return Err(TrackingError::validation(
                "payload",
                "update does not change any checkpoint",
            ));
        }

        for cp in Checkpoint::ALL {
            if let Some(FieldChange::Set(at)) = self.time_change(cp) {
                if !is_valid_timestamp(at) {
                    return Err(TrackingError::validation(
                        cp.datetime_column(),
                        format!("'{}' is not a recognized timestamp", at),
                    ));
                }
            }
            if let Some(FieldChange::Set(coords)) = self.coords_change(cp) {
                if !is_valid_coords(coords) {
                    return Err(TrackingError::validation(
                        cp.coords_column(),
                        format!("'{}' is not a 'lat,lng' pair", coords),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Merges the changes into `record`. Untouched marks are left as they are.
    pub fn apply_to(&self, record: &mut CheckpointRecord) {
        for cp in Checkpoint::ALL {
            let time = self.time_change(cp).map(|c| c.value().map(str::to_string));
            let coords = self.coords_change(cp).map(|c| c.value().map(str::to_string));
            let mark = record.mark_mut(cp);
            if let Some(at) = time {
                mark.at = at;
            }
            if let Some(coords) = coords {
                mark.coords = coords;
            }
        }
    }
}

/// Parses a request payload. Malformed JSON, missing required fields and
/// unknown keys all surface as a `Validation` error on `payload`.
pub fn parse_payload<T: DeserializeOwned>(json: &str) -> Result<T, TrackingError> {
    serde_json::from_str(json).map_err(|e| TrackingError::validation("payload", e.to_string()))
}

fn is_valid_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NAIVE_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}

fn is_valid_coords(value: &str) -> bool {
    let Some(caps) = RE_COORDS.captures(value) else {
        return false;
    };
    let lat: f64 = caps[1].parse().unwrap_or(f64::NAN);
    let lng: f64 = caps[2].parse().unwrap_or(f64::NAN);
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}
