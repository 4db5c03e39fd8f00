//! Status rule table.
//!
//! A rule variant is an ordered precedence list of `(checkpoint, label)`
//! pairs, most advanced checkpoint first. Deriving a status scans the list
//! and returns the label of the first checkpoint the record has reached.
//! Jobs pick a variant through their origin location; anything unmapped
//! falls back to the `default` variant.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::checkpoint::{Checkpoint, CheckpointRecord};
use crate::config::schema::StatusConfig;
use crate::error::ConfigError;

pub const DEFAULT_VARIANT: &str = "default";
pub const DOCUMENTS_VARIANT: &str = "documents";
pub const INITIAL_LABEL: &str = "Ready for job";

/// One entry of a precedence list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRule {
    pub checkpoint: Checkpoint,
    pub label: String,
}

impl StatusRule {
    pub fn new(checkpoint: Checkpoint, label: &str) -> Self {
        Self {
            checkpoint,
            label: label.to_string(),
        }
    }
}

/// The built-in precedence list used when no location override applies.
pub fn default_rules() -> Vec<StatusRule> {
    vec![
        StatusRule::new(Checkpoint::Complete, "Completed"),
        StatusRule::new(Checkpoint::UnloadingEnd, "Unloading finished"),
        StatusRule::new(Checkpoint::UnloadingStart, "Unloading"),
        StatusRule::new(Checkpoint::DestinationArrival, "Arrived at destination"),
        StatusRule::new(Checkpoint::InTransit, "In transit"),
        StatusRule::new(Checkpoint::LoadingEnd, "Loading finished"),
        StatusRule::new(Checkpoint::LoadingStart, "Loading"),
        StatusRule::new(Checkpoint::OriginArrival, "Arrived at origin"),
        StatusRule::new(Checkpoint::Start, "Job started"),
    ]
}

/// The built-in list for locations that track paperwork.
pub fn documents_rules() -> Vec<StatusRule> {
    vec![
        StatusRule::new(Checkpoint::Complete, "Completed"),
        StatusRule::new(Checkpoint::DocsReturned, "Documents returned"),
        StatusRule::new(Checkpoint::UnloadingEnd, "Unloading finished"),
        StatusRule::new(Checkpoint::UnloadingStart, "Unloading"),
        StatusRule::new(Checkpoint::DestinationArrival, "Arrived at destination"),
        StatusRule::new(Checkpoint::DocsSubmitted, "Documents submitted"),
        StatusRule::new(Checkpoint::InTransit, "In transit"),
        StatusRule::new(Checkpoint::LoadingEnd, "Loading finished"),
        StatusRule::new(Checkpoint::LoadingStart, "Loading"),
        StatusRule::new(Checkpoint::OriginArrival, "Arrived at origin"),
        StatusRule::new(Checkpoint::Start, "Job started"),
    ]
}

/// A borrowed view of a single rule variant.
#[derive(Debug, Clone, Copy)]
pub struct Variant<'a> {
    pub name: &'a str,
    pub rules: &'a [StatusRule],
    pub initial_label: &'a str,
}

impl<'a> Variant<'a> {
    pub fn derive(&self, record: &CheckpointRecord) -> &'a str {
        derive_status(record, *self)
    }
}

/// Returns the label of the most advanced reached checkpoint in `variant`,
/// or the variant's initial label if none is reached.
///
/// Only which checkpoints are set matters. Checkpoints the variant does not
/// list are ignored.
pub fn derive_status<'a>(record: &CheckpointRecord, variant: Variant<'a>) -> &'a str {
    variant
        .rules
        .iter()
        .find(|rule| record.is_reached(rule.checkpoint))
        .map(|rule| rule.label.as_str())
        .unwrap_or(variant.initial_label)
}

/// All rule variants plus the location → variant mapping.
#[derive(Debug, Clone)]
pub struct StatusRules {
    initial_label: String,
    variants: BTreeMap<String, Vec<StatusRule>>,
    locations: HashMap<String, String>,
}

impl Default for StatusRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StatusRules {
    /// The `default` and `documents` variants with no location overrides.
    pub fn builtin() -> Self {
        let mut variants = BTreeMap::new();
        variants.insert(DEFAULT_VARIANT.to_string(), default_rules());
        variants.insert(DOCUMENTS_VARIANT.to_string(), documents_rules());
        Self {
            initial_label: INITIAL_LABEL.to_string(),
            variants,
            locations: HashMap::new(),
        }
    }

    /// Builds the table from configuration, layering configured variants
    /// over the built-in ones.
    pub fn from_config(config: &StatusConfig) -> Result<Self, ConfigError> {
        let mut rules = Self::builtin();
        if let Some(label) = &config.initial_label {
            rules.initial_label = label.clone();
        }

        for (name, list) in &config.variants {
            let mut seen = Vec::with_capacity(list.len());
            for rule in list {
                if seen.contains(&rule.checkpoint) {
                    return Err(ConfigError::InvalidVariant {
                        name: name.clone(),
                        reason: format!("checkpoint '{}' listed more than once", rule.checkpoint),
                    });
                }
                seen.push(rule.checkpoint);
            }
            rules.variants.insert(name.clone(), list.clone());
        }

        for (location, variant) in &config.location_variants {
            if !rules.variants.contains_key(variant) {
                return Err(ConfigError::InvalidVariant {
                    name: variant.clone(),
                    reason: format!("location '{}' maps to an undefined variant", location),
                });
            }
            let key = location.trim();
            if rules.locations.contains_key(key) {
                return Err(ConfigError::InvalidVariant {
                    name: variant.clone(),
                    reason: format!("location '{}' is mapped more than once", key),
                });
            }
            rules.locations.insert(key.to_string(), variant.clone());
        }

        Ok(rules)
    }

    /// Maps an additional origin location to an existing variant.
    pub fn with_location(mut self, location: &str, variant: &str) -> Result<Self, ConfigError> {
        if !self.variants.contains_key(variant) {
            return Err(ConfigError::InvalidVariant {
                name: variant.to_string(),
                reason: format!("location '{}' maps to an undefined variant", location),
            });
        }
        self.locations
            .insert(location.trim().to_string(), variant.to_string());
        Ok(self)
    }

    pub fn initial_label(&self) -> &str {
        &self.initial_label
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// Looks up a variant by name.
    pub fn variant(&self, name: &str) -> Option<Variant<'_>> {
        self.variants
            .get_key_value(name)
            .map(|(name, rules)| Variant {
                name,
                rules,
                initial_label: &self.initial_label,
            })
    }

    /// Selects the variant for a job's origin location.
    pub fn variant_for(&self, origin_location: Option<&str>) -> Variant<'_> {
        let name = origin_location
            .map(str::trim)
            .and_then(|loc| self.locations.get(loc))
            .map(String::as_str)
            .unwrap_or(DEFAULT_VARIANT);

        match self.variant(name) {
            Some(variant) => variant,
            // `default` is seeded by `builtin()` and can only be overridden.
            None => Variant {
                name: DEFAULT_VARIANT,
                rules: &[],
                initial_label: &self.initial_label,
            },
        }
    }

    /// Derives the status a record would have for a job at `origin_location`
    /// without touching storage.
    pub fn preview(&self, record: &CheckpointRecord, origin_location: Option<&str>) -> String {
        self.variant_for(origin_location).derive(record).to_string()
    }
}
