use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::status::StatusRule;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub groups: GroupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database: DatabaseConfig::default(),
            status: StatusConfig::default(),
            groups: GroupConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. Falls back to `~/.fleetdata/data/fleetdata.db`.
    #[serde(default)]
    pub path: Option<String>,
}

/// Status rule overrides. Anything left out keeps the built-in rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default)]
    pub initial_label: Option<String>,
    /// Variant name → precedence list, most advanced checkpoint first.
    #[serde(default)]
    pub variants: BTreeMap<String, Vec<StatusRule>>,
    /// Origin location → variant name.
    #[serde(default)]
    pub location_variants: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default = "default_max_group_size")]
    pub max_size: usize,
}

fn default_max_group_size() -> usize {
    50
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_group_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
