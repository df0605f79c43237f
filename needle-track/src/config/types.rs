use crate::ingest::normalize::{DEFAULT_ID_FIELD, DEFAULT_LINK_TEMPLATE};
use crate::ingest::OnMalformed;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "needle_track.db";

/// Top-level configuration, read from `needle_track.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NeedleConfig {
    pub store: StoreConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Field of each exported object that holds the survey object ID
    pub id_field: String,
    /// Record link, with `{object_id}` substituted
    pub link_template: String,
    pub on_malformed: OnMalformed,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            link_template: DEFAULT_LINK_TEMPLATE.to_string(),
            on_malformed: OnMalformed::Abort,
        }
    }
}
