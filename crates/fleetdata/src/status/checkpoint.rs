//! Checkpoint identifiers and the per-job checkpoint record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named milestone in a job's journey, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    Start,
    OriginArrival,
    LoadingStart,
    LoadingEnd,
    InTransit,
    DestinationArrival,
    UnloadingStart,
    UnloadingEnd,
    DocsSubmitted,
    DocsReturned,
    Complete,
}

impl Checkpoint {
    /// Every checkpoint, earliest first.
    pub const ALL: [Checkpoint; 11] = [
        Checkpoint::Start,
        Checkpoint::OriginArrival,
        Checkpoint::LoadingStart,
        Checkpoint::LoadingEnd,
        Checkpoint::InTransit,
        Checkpoint::DestinationArrival,
        Checkpoint::UnloadingStart,
        Checkpoint::UnloadingEnd,
        Checkpoint::DocsSubmitted,
        Checkpoint::DocsReturned,
        Checkpoint::Complete,
    ];

    /// Checkpoints shared by every truck of a dispatch group at pickup.
    pub const EARLY_JOURNEY: [Checkpoint; 4] = [
        Checkpoint::Start,
        Checkpoint::OriginArrival,
        Checkpoint::LoadingStart,
        Checkpoint::LoadingEnd,
    ];

    pub fn is_early_journey(self) -> bool {
        Self::EARLY_JOURNEY.contains(&self)
    }

    /// Stable snake_case name used in configuration and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Checkpoint::Start => "start",
            Checkpoint::OriginArrival => "origin_arrival",
            Checkpoint::LoadingStart => "loading_start",
            Checkpoint::LoadingEnd => "loading_end",
            Checkpoint::InTransit => "in_transit",
            Checkpoint::DestinationArrival => "destination_arrival",
            Checkpoint::UnloadingStart => "unloading_start",
            Checkpoint::UnloadingEnd => "unloading_end",
            Checkpoint::DocsSubmitted => "docs_submitted",
            Checkpoint::DocsReturned => "docs_returned",
            Checkpoint::Complete => "complete",
        }
    }

    /// Column holding the checkpoint timestamp (also the payload key).
    pub fn datetime_column(self) -> &'static str {
        match self {
            Checkpoint::Start => "start_datetime",
            Checkpoint::OriginArrival => "origin_datetime",
            Checkpoint::LoadingStart => "start_receive_datetime",
            Checkpoint::LoadingEnd => "end_receive_datetime",
            Checkpoint::InTransit => "intransit_datetime",
            Checkpoint::DestinationArrival => "destination_datetime",
            Checkpoint::UnloadingStart => "start_unload_datetime",
            Checkpoint::UnloadingEnd => "end_unload_datetime",
            Checkpoint::DocsSubmitted => "docs_submitted_datetime",
            Checkpoint::DocsReturned => "docs_returned_datetime",
            Checkpoint::Complete => "complete_datetime",
        }
    }

    /// Column holding the paired `"lat,lng"` coordinate (also the payload key).
    pub fn coords_column(self) -> &'static str {
        match self {
            Checkpoint::Start => "start_coords",
            Checkpoint::OriginArrival => "origin_coords",
            Checkpoint::LoadingStart => "start_receive_coords",
            Checkpoint::LoadingEnd => "end_receive_coords",
            Checkpoint::InTransit => "intransit_coords",
            Checkpoint::DestinationArrival => "destination_coords",
            Checkpoint::UnloadingStart => "start_unload_coords",
            Checkpoint::UnloadingEnd => "end_unload_coords",
            Checkpoint::DocsSubmitted => "docs_submitted_coords",
            Checkpoint::DocsReturned => "docs_returned_coords",
            Checkpoint::Complete => "complete_coords",
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Checkpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Checkpoint::ALL
            .into_iter()
            .find(|cp| cp.as_str() == s)
            .ok_or_else(|| format!("unknown checkpoint '{}'", s))
    }
}

/// What was recorded at a single checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMark {
    /// When the checkpoint was reached. `None` means not yet reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
    /// Where the checkpoint was reached, as `"lat,lng"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coords: Option<String>,
}

impl CheckpointMark {
    pub fn is_reached(&self) -> bool {
        self.at.is_some()
    }
}

/// The checkpoint record of one job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointRecord {
    pub load_id: String,
    pub start: CheckpointMark,
    pub origin_arrival: CheckpointMark,
    pub loading_start: CheckpointMark,
    pub loading_end: CheckpointMark,
    pub in_transit: CheckpointMark,
    pub destination_arrival: CheckpointMark,
    pub unloading_start: CheckpointMark,
    pub unloading_end: CheckpointMark,
    pub docs_submitted: CheckpointMark,
    pub docs_returned: CheckpointMark,
    pub complete: CheckpointMark,
}

impl CheckpointRecord {
    /// An empty record: nothing reached yet.
    pub fn new(load_id: impl Into<String>) -> Self {
        Self {
            load_id: load_id.into(),
            ..Default::default()
        }
    }

    pub fn mark(&self, checkpoint: Checkpoint) -> &CheckpointMark {
        match checkpoint {
            Checkpoint::Start => &self.start,
            Checkpoint::OriginArrival => &self.origin_arrival,
            Checkpoint::LoadingStart => &self.loading_start,
            Checkpoint::LoadingEnd => &self.loading_end,
            Checkpoint::InTransit => &self.in_transit,
            Checkpoint::DestinationArrival => &self.destination_arrival,
            Checkpoint::UnloadingStart => &self.unloading_start,
            Checkpoint::UnloadingEnd => &self.unloading_end,
            Checkpoint::DocsSubmitted => &self.docs_submitted,
            Checkpoint::DocsReturned => &self.docs_returned,
            Checkpoint::Complete => &self.complete,
        }
    }

    pub fn mark_mut(&mut self, checkpoint: Checkpoint) -> &mut CheckpointMark {
        match checkpoint {
            Checkpoint::Start => &mut self.start,
            Checkpoint::OriginArrival => &mut self.origin_arrival,
            Checkpoint::LoadingStart => &mut self.loading_start,
            Checkpoint::LoadingEnd => &mut self.loading_end,
            Checkpoint::InTransit => &mut self.in_transit,
            Checkpoint::DestinationArrival => &mut self.destination_arrival,
            Checkpoint::UnloadingStart => &mut self.unloading_start,
            Checkpoint::UnloadingEnd => &mut self.unloading_end,
            Checkpoint::DocsSubmitted => &mut self.docs_submitted,
            Checkpoint::DocsReturned => &mut self.docs_returned,
            Checkpoint::Complete => &mut self.complete,
        }
    }

    pub fn is_reached(&self, checkpoint: Checkpoint) -> bool {
        self.mark(checkpoint).is_reached()
    }

    /// Convenience setter used by callers building snapshots for previews.
    pub fn with_time(mut self, checkpoint: Checkpoint, at: impl Into<String>) -> Self {
        self.mark_mut(checkpoint).at = Some(at.into());
        self
    }

    /// Checkpoints that have a timestamp, earliest first.
    pub fn reached(&self) -> Vec<Checkpoint> {
        Checkpoint::ALL
            .into_iter()
            .filter(|cp| self.is_reached(*cp))
            .collect()
    }
}
