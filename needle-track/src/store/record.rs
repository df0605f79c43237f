//! Record types held by the [`RecordStore`](super::RecordStore).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One catalogued transient, keyed by its survey object ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransientRecord {
    pub object_id: String,
    /// Opaque survey payload; compared by deep equality on re-ingestion.
    pub properties: Value,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub annotation_status: bool,
    pub link: String,
    pub is_followup: bool,
    pub is_new: bool,
    pub is_removed: bool,
    pub is_updated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A free-text note attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A record as it arrives from ingestion, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingRecord {
    pub object_id: String,
    pub properties: Value,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub link: String,
}

impl IncomingRecord {
    pub fn new(object_id: impl Into<String>, properties: Value, link: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            properties,
            tags: Vec::new(),
            comments: Vec::new(),
            link: link.into(),
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Classification of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Inserted,
    Updated,
    NoChange,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Inserted => "inserted",
            Outcome::Updated => "updated",
            Outcome::NoChange => "no_change",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed tag vocabulary accepted by `add_tag`.
///
/// Each code carries a numeric alias (0/1/2/4) so it can be typed either way
/// on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCode {
    Followup,
    Favored,
    New,
    Removed,
}

impl TagCode {
    pub const ALL: [TagCode; 4] = [
        TagCode::Followup,
        TagCode::Favored,
        TagCode::New,
        TagCode::Removed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TagCode::Followup => "followup",
            TagCode::Favored => "favored",
            TagCode::New => "new",
            TagCode::Removed => "removed",
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            TagCode::Followup => 0,
            TagCode::Favored => 1,
            TagCode::New => 2,
            TagCode::Removed => 4,
        }
    }
}

impl fmt::Display for TagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tag code '{0}' (expected followup/0, favored/1, new/2 or removed/4)")]
pub struct UnknownTagCode(pub String);

impl FromStr for TagCode {
    type Err = UnknownTagCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        TagCode::ALL
            .into_iter()
            .find(|t| t.label() == needle || t.code().to_string() == needle)
            .ok_or_else(|| UnknownTagCode(s.to_string()))
    }
}

/// How `find_by_tag` interprets its query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagMatch {
    /// Literal substring of the serialized tag sequence.
    #[default]
    Substring,
    /// Structured membership: one tag equals the query exactly.
    Exact,
}
