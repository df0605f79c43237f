//! SQLite schema and the typed codec between rows and [`TransientRecord`]s.
//!
//! Structured fields (`properties`, `tags`, `comments`) live in TEXT columns
//! as JSON and are decoded into their typed form on every read. A column that
//! no longer decodes is reported as [`StoreError::Corrupt`], never defaulted.

use super::record::{Comment, TagCode, TransientRecord};
use super::StoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub(crate) const CREATE_SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS transients (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    object_id         TEXT    NOT NULL UNIQUE,
    properties        TEXT    NOT NULL,
    tags              TEXT    NOT NULL DEFAULT '[]',
    comments          TEXT    NOT NULL DEFAULT '[]',
    annotation_status INTEGER NOT NULL DEFAULT 0,
    link              TEXT    NOT NULL DEFAULT '',
    is_followup       INTEGER NOT NULL DEFAULT 0,
    is_new            INTEGER NOT NULL DEFAULT 1,
    is_removed        INTEGER NOT NULL DEFAULT 0,
    is_updated        INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT    NOT NULL,
    updated_at        TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transients_updated    ON transients(is_updated);
CREATE INDEX IF NOT EXISTS idx_transients_annotation ON transients(annotation_status);
";

pub(crate) const DROP_SCHEMA_SQL: &str = "DROP TABLE IF EXISTS transients;";

pub(crate) const SELECT_COLUMNS: &str = "object_id, properties, tags, comments, annotation_status, \
     link, is_followup, is_new, is_removed, is_updated, created_at, updated_at";

/// The JSON-encoded columns, so per-field reads stay typed.
#[derive(Debug, Clone, Copy)]
pub(crate) enum JsonColumn {
    Properties,
    Tags,
    Comments,
}

impl JsonColumn {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            JsonColumn::Properties => "properties",
            JsonColumn::Tags => "tags",
            JsonColumn::Comments => "comments",
        }
    }
}

/// Flag column set when a tag code is added; `favored` is a label only.
pub(crate) fn flag_column(code: TagCode) -> Option<&'static str> {
    match code {
        TagCode::Followup => Some("is_followup"),
        TagCode::New => Some("is_new"),
        TagCode::Removed => Some("is_removed"),
        TagCode::Favored => None,
    }
}

/// Fixed-width UTC form; lexical order equals chronological order, which lets
/// SQL clamp `updated_at` with `MAX(created_at, ?)`.
pub(crate) fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn encode<T: Serialize + ?Sized>(
    object_id: &str,
    column: JsonColumn,
    value: &T,
) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Corrupt {
        object_id: object_id.to_string(),
        field: column.name(),
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(
    object_id: &str,
    column: JsonColumn,
    raw: &str,
) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        object_id: object_id.to_string(),
        field: column.name(),
        reason: e.to_string(),
    })
}

fn parse_timestamp(
    object_id: &str,
    field: &'static str,
    raw: &str,
) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            object_id: object_id.to_string(),
            field,
            reason: e.to_string(),
        })
}

/// A `transients` row exactly as SQLite returns it, before JSON decoding.
pub(crate) struct RawRow {
    object_id: String,
    properties: String,
    tags: String,
    comments: String,
    annotation_status: bool,
    link: String,
    is_followup: bool,
    is_new: bool,
    is_removed: bool,
    is_updated: bool,
    created_at: String,
    updated_at: String,
}

impl RawRow {
    /// Column order follows [`SELECT_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            object_id: row.get(0)?,
            properties: row.get(1)?,
            tags: row.get(2)?,
            comments: row.get(3)?,
            annotation_status: row.get(4)?,
            link: row.get(5)?,
            is_followup: row.get(6)?,
            is_new: row.get(7)?,
            is_removed: row.get(8)?,
            is_updated: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    pub(crate) fn decode(self) -> Result<TransientRecord, StoreError> {
        let id = self.object_id.as_str();
        let properties: Value = decode(id, JsonColumn::Properties, &self.properties)?;
        let tags: Vec<String> = decode(id, JsonColumn::Tags, &self.tags)?;
        let comments: Vec<Comment> = decode(id, JsonColumn::Comments, &self.comments)?;
        let created_at = parse_timestamp(id, "created_at", &self.created_at)?;
        let updated_at = parse_timestamp(id, "updated_at", &self.updated_at)?;

        Ok(TransientRecord {
            object_id: self.object_id,
            properties,
            tags,
            comments,
            annotation_status: self.annotation_status,
            link: self.link,
            is_followup: self.is_followup,
            is_new: self.is_new,
            is_removed: self.is_removed,
            is_updated: self.is_updated,
            created_at,
            updated_at,
        })
    }
}

pub(crate) fn select_by_id(
    conn: &Connection,
    object_id: &str,
) -> Result<Option<TransientRecord>, StoreError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM transients WHERE object_id = ?1");
    let raw = conn
        .query_row(&sql, params![object_id], RawRow::from_row)
        .optional()?;
    raw.map(RawRow::decode).transpose()
}

/// Read and decode one JSON column; `None` when the record does not exist.
pub(crate) fn select_json<T: DeserializeOwned>(
    conn: &Connection,
    object_id: &str,
    column: JsonColumn,
) -> Result<Option<T>, StoreError> {
    let sql = format!(
        "SELECT {} FROM transients WHERE object_id = ?1",
        column.name()
    );
    let raw: Option<String> = conn
        .query_row(&sql, params![object_id], |row| row.get(0))
        .optional()?;
    raw.map(|r| decode(object_id, column, &r)).transpose()
}

/// Run a `SELECT` over `transients` with an optional `WHERE` clause, in
/// insertion order.
pub(crate) fn select_where<P: rusqlite::Params>(
    conn: &Connection,
    clause: &str,
    params: P,
) -> Result<Vec<TransientRecord>, StoreError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM transients {clause} ORDER BY id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, RawRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(RawRow::decode).collect()
}
