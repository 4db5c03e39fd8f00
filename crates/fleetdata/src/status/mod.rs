//! Status engine: derives a job's human-readable status from its checkpoints.

pub mod checkpoint;
pub mod rules;

pub use checkpoint::{Checkpoint, CheckpointMark, CheckpointRecord};
pub use rules::{
    derive_status, StatusRule, StatusRules, Variant, DEFAULT_VARIANT, DOCUMENTS_VARIANT,
    INITIAL_LABEL,
};
