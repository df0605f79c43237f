//! Record Store: durable, keyed storage for transient records.
//!
//! A [`RecordStore`] owns one SQLite connection for its whole lifetime; open
//! one per command (or per test, with [`RecordStore::open_in_memory`]) and
//! drop it to release the file.
//!
//! Every mutating call is a single transaction: either all of its field
//! changes are durable or none are. Operations on an unknown object ID are
//! not errors; they report `false` (mutations) or `None` (lookups).

pub mod record;
mod schema;

pub use record::{
    Comment, IncomingRecord, Outcome, TagCode, TagMatch, TransientRecord, UnknownTagCode,
};

use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use schema::JsonColumn;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened or its schema created.
    #[error("record store unavailable at {location}: {reason}")]
    Unavailable { location: String, reason: String },
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored field no longer decodes into its typed form.
    #[error("corrupt {field} for object {object_id}: {reason}")]
    Corrupt {
        object_id: String,
        field: &'static str,
        reason: String,
    },
}

pub struct RecordStore {
    conn: Connection,
    location: String,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("location", &self.location)
            .finish()
    }
}

impl RecordStore {
    /// Open (or create) the store at `path`. Existing data is kept.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let location = path.display().to_string();
        let unavailable = |reason: String| StoreError::Unavailable {
            location: location.clone(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|e| unavailable(e.to_string()))?;
        Self::with_connection(conn, location)
    }

    /// A private, non-persistent store. Each call yields an isolated instance.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Unavailable {
            location: ":memory:".to_string(),
            reason: e.to_string(),
        })?;
        Self::with_connection(conn, ":memory:".to_string())
    }

    fn with_connection(conn: Connection, location: String) -> Result<Self, StoreError> {
        conn.execute_batch(schema::CREATE_SCHEMA_SQL)
            .map_err(|e| StoreError::Unavailable {
                location: location.clone(),
                reason: format!("failed to initialise schema: {}", e),
            })?;
        debug!("[RecordStore] opened {}", location);
        Ok(Self { conn, location })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Drop and recreate the schema, discarding every record.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(schema::DROP_SCHEMA_SQL)?;
        tx.execute_batch(schema::CREATE_SCHEMA_SQL)?;
        tx.commit()?;
        warn!("[RecordStore] reset {}: all records discarded", self.location);
        Ok(())
    }

    /// Insert a new record or reconcile an existing one against `incoming`.
    ///
    /// - unknown ID: inserted with `isNew` set and the given tags/comments.
    /// - same properties (deep equality): nothing is written.
    /// - different properties: `properties` and `link` are replaced, incoming
    ///   tags are merged after the existing ones, `isUpdated` is set. Comments
    ///   and the remaining flags are left alone.
    pub fn upsert(&mut self, incoming: &IncomingRecord) -> Result<Outcome, StoreError> {
        let now = schema::timestamp(Utc::now());
        let id = incoming.object_id.as_str();
        let tx = self.conn.transaction()?;

        let outcome = match schema::select_by_id(&tx, id)? {
            None => {
                tx.execute(
                    "INSERT INTO transients (object_id, properties, tags, comments, link, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![
                        id,
                        schema::encode(id, JsonColumn::Properties, &incoming.properties)?,
                        schema::encode(id, JsonColumn::Tags, &incoming.tags)?,
                        schema::encode(id, JsonColumn::Comments, &incoming.comments)?,
                        incoming.link,
                        now,
                    ],
                )?;
                Outcome::Inserted
            }
            Some(current) if current.properties == incoming.properties => Outcome::NoChange,
            Some(current) => {
                let tags = merge_tags(current.tags, &incoming.tags);
                tx.execute(
                    "UPDATE transients
                     SET properties = ?1, tags = ?2, link = ?3, is_updated = 1,
                         updated_at = MAX(created_at, ?4)
                     WHERE object_id = ?5",
                    params![
                        schema::encode(id, JsonColumn::Properties, &incoming.properties)?,
                        schema::encode(id, JsonColumn::Tags, &tags)?,
                        incoming.link,
                        now,
                        id,
                    ],
                )?;
                Outcome::Updated
            }
        };

        tx.commit()?;
        debug!("[RecordStore] upsert {} -> {}", id, outcome);
        Ok(outcome)
    }

    /// Soft-delete: set `isRemoved`. Returns `false` if the ID is unknown.
    pub fn mark_removed(&mut self, object_id: &str) -> Result<bool, StoreError> {
        self.set_flag(object_id, "is_removed", true)
    }

    pub fn set_annotation_status(
        &mut self,
        object_id: &str,
        annotated: bool,
    ) -> Result<bool, StoreError> {
        self.set_flag(object_id, "annotation_status", annotated)
    }

    // `column` is always one of the fixed flag names above.
    fn set_flag(&mut self, object_id: &str, column: &str, value: bool) -> Result<bool, StoreError> {
        let now = schema::timestamp(Utc::now());
        let sql = format!(
            "UPDATE transients SET {column} = ?1, updated_at = MAX(created_at, ?2) WHERE object_id = ?3"
        );
        let tx = self.conn.transaction()?;
        let changed = tx.execute(&sql, params![value, now, object_id])?;
        tx.commit()?;
        if changed == 0 {
            debug!("[RecordStore] {} not found while setting {}", object_id, column);
        }
        Ok(changed > 0)
    }

    /// Append a comment stamped with the current time.
    pub fn add_comment(&mut self, object_id: &str, text: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        let tx = self.conn.transaction()?;
        let Some(mut comments) =
            schema::select_json::<Vec<Comment>>(&tx, object_id, JsonColumn::Comments)?
        else {
            return Ok(false);
        };

        comments.push(Comment {
            text: text.to_string(),
            timestamp: now,
        });
        tx.execute(
            "UPDATE transients SET comments = ?1, updated_at = MAX(created_at, ?2) WHERE object_id = ?3",
            params![
                schema::encode(object_id, JsonColumn::Comments, &comments)?,
                schema::timestamp(now),
                object_id,
            ],
        )?;
        tx.commit()?;
        info!("[RecordStore] comment #{} added to {}", comments.len(), object_id);
        Ok(true)
    }

    /// Add a tag label (once) and raise the flag it stands for.
    pub fn add_tag(&mut self, object_id: &str, code: TagCode) -> Result<bool, StoreError> {
        let now = schema::timestamp(Utc::now());
        let tx = self.conn.transaction()?;
        let Some(mut tags) = schema::select_json::<Vec<String>>(&tx, object_id, JsonColumn::Tags)?
        else {
            return Ok(false);
        };

        if !tags.iter().any(|t| t == code.label()) {
            tags.push(code.label().to_string());
        }
        let flag = schema::flag_column(code)
            .map(|column| format!(", {column} = 1"))
            .unwrap_or_default();
        let sql = format!(
            "UPDATE transients SET tags = ?1{flag}, updated_at = MAX(created_at, ?2) WHERE object_id = ?3"
        );
        tx.execute(
            &sql,
            params![schema::encode(object_id, JsonColumn::Tags, &tags)?, now, object_id],
        )?;
        tx.commit()?;
        info!("[RecordStore] tag '{}' added to {}", code, object_id);
        Ok(true)
    }

    pub fn find_by_id(&self, object_id: &str) -> Result<Option<TransientRecord>, StoreError> {
        schema::select_by_id(&self.conn, object_id)
    }

    /// Records whose tags match `query`, in insertion order.
    ///
    /// [`TagMatch::Substring`] tests the serialized tag sequence, so a query
    /// can match part of a label (or span two). [`TagMatch::Exact`] requires
    /// one tag equal to `query`.
    pub fn find_by_tag(
        &self,
        query: &str,
        mode: TagMatch,
    ) -> Result<Vec<TransientRecord>, StoreError> {
        match mode {
            TagMatch::Substring => {
                schema::select_where(&self.conn, "WHERE instr(tags, ?1) > 0", params![query])
            }
            TagMatch::Exact => schema::select_where(
                &self.conn,
                "WHERE EXISTS (SELECT 1 FROM json_each(transients.tags) WHERE json_each.value = ?1)",
                params![query],
            ),
        }
    }

    pub fn find_by_annotation_status(
        &self,
        annotated: bool,
    ) -> Result<Vec<TransientRecord>, StoreError> {
        schema::select_where(
            &self.conn,
            "WHERE annotation_status = ?1",
            params![annotated],
        )
    }

    /// Records whose properties changed on some ingestion since creation.
    pub fn find_updated(&self) -> Result<Vec<TransientRecord>, StoreError> {
        schema::select_where(&self.conn, "WHERE is_updated = 1", [])
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM transients", [], |r| r.get(0))?;
        Ok(n as usize)
    }
}

/// Existing tags first, in order, then incoming tags not already present.
fn merge_tags(mut existing: Vec<String>, incoming: &[String]) -> Vec<String> {
    for tag in incoming {
        if !existing.contains(tag) {
            existing.push(tag.clone());
        }
    }
    existing
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> RecordStore {
        RecordStore::open_in_memory().expect("in-memory store")
    }

    fn incoming(id: &str, properties: serde_json::Value) -> IncomingRecord {
        IncomingRecord::new(id, properties, format!("https://example.test/{}/", id))
    }

    #[test]
    fn insert_sets_default_flags() {
        let mut s = store();
        let outcome = s.upsert(&incoming("ZTF21aa", json!({"mag": 19.2}))).unwrap();
        assert_eq!(outcome, Outcome::Inserted);

        let r = s.find_by_id("ZTF21aa").unwrap().expect("record");
        assert!(r.is_new);
        assert!(!r.is_updated);
        assert!(!r.is_removed);
        assert!(!r.is_followup);
        assert!(!r.annotation_status);
        assert!(r.tags.is_empty());
        assert!(r.comments.is_empty());
        assert_eq!(r.created_at, r.updated_at);
        assert_eq!(r.link, "https://example.test/ZTF21aa/");
    }

    #[test]
    fn structurally_equal_properties_are_no_change() {
        let mut s = store();
        s.upsert(&incoming("a", json!({"mag": 19.2, "ra": 10.5, "nested": {"x": [1, 2]}})))
            .unwrap();
        let before = s.find_by_id("a").unwrap().unwrap();

        // Same document, keys in a different order.
        let again = incoming("a", json!({"nested": {"x": [1, 2]}, "ra": 10.5, "mag": 19.2}));
        assert_eq!(s.upsert(&again).unwrap(), Outcome::NoChange);

        let after = s.find_by_id("a").unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn changed_properties_are_updated() {
        let mut s = store();
        s.upsert(&incoming("a", json!({"mag": 19.2}))).unwrap();
        let changed = IncomingRecord::new("a", json!({"mag": 18.9}), "https://example.test/new/");
        assert_eq!(s.upsert(&changed).unwrap(), Outcome::Updated);

        let r = s.find_by_id("a").unwrap().unwrap();
        assert!(r.is_updated);
        assert!(r.is_new);
        assert_eq!(r.properties, json!({"mag": 18.9}));
        assert_eq!(r.link, "https://example.test/new/");
        assert!(r.updated_at >= r.created_at);
    }

    #[test]
    fn update_keeps_manual_tags_and_comments() {
        let mut s = store();
        s.upsert(&incoming("a", json!({"mag": 19.2})).with_tags(["sn"]))
            .unwrap();
        assert!(s.add_tag("a", TagCode::Favored).unwrap());
        assert!(s.add_comment("a", "looks like a SN Ia").unwrap());

        let changed = incoming("a", json!({"mag": 18.0})).with_tags(["sn", "bright"]);
        assert_eq!(s.upsert(&changed).unwrap(), Outcome::Updated);

        let r = s.find_by_id("a").unwrap().unwrap();
        assert_eq!(r.tags, vec!["sn", "favored", "bright"]);
        assert_eq!(r.comments.len(), 1);
        assert_eq!(r.comments[0].text, "looks like a SN Ia");
    }

    #[test]
    fn no_change_does_not_touch_tags() {
        let mut s = store();
        s.upsert(&incoming("a", json!({"mag": 19.2}))).unwrap();
        s.add_tag("a", TagCode::Followup).unwrap();

        let same = incoming("a", json!({"mag": 19.2})).with_tags(["other"]);
        assert_eq!(s.upsert(&same).unwrap(), Outcome::NoChange);
        assert_eq!(s.find_by_id("a").unwrap().unwrap().tags, vec!["followup"]);
    }

    #[test]
    fn add_comment_appends_in_order() {
        let mut s = store();
        s.upsert(&incoming("a", json!({}))).unwrap();
        assert!(s.add_comment("a", "first").unwrap());
        assert!(s.add_comment("a", "second").unwrap());

        let r = s.find_by_id("a").unwrap().unwrap();
        let texts: Vec<_> = r.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(r.comments[0].timestamp <= r.comments[1].timestamp);
        assert!(r.updated_at >= r.created_at);
    }

    #[test]
    fn unknown_object_is_reported_not_raised() {
        let mut s = store();
        assert!(!s.add_comment("missing", "hello").unwrap());
        assert!(!s.add_tag("missing", TagCode::Followup).unwrap());
        assert!(!s.mark_removed("missing").unwrap());
        assert!(!s.set_annotation_status("missing", true).unwrap());
        assert!(s.find_by_id("missing").unwrap().is_none());
        assert_eq!(s.count().unwrap(), 0);
    }

    #[test]
    fn removed_tag_sets_removed_flag() {
        let mut s = store();
        s.upsert(&incoming("a", json!({}))).unwrap();
        assert!(s.add_tag("a", TagCode::Removed).unwrap());

        let r = s.find_by_id("a").unwrap().unwrap();
        assert!(r.is_removed);
        assert!(r.tags.iter().any(|t| t == "removed"));
    }

    #[test]
    fn tag_codes_map_onto_flags() {
        let mut s = store();
        s.upsert(&incoming("a", json!({}))).unwrap();
        s.add_tag("a", TagCode::Followup).unwrap();
        s.add_tag("a", TagCode::Favored).unwrap();
        s.add_tag("a", TagCode::Followup).unwrap();

        let r = s.find_by_id("a").unwrap().unwrap();
        assert!(r.is_followup);
        assert!(!r.is_removed);
        assert_eq!(r.tags, vec!["followup", "favored"]);
    }

    #[test]
    fn mark_removed_only_changes_flag_and_timestamp() {
        let mut s = store();
        s.upsert(&incoming("ZTF21aa", json!({"mag": 19.2}))).unwrap();
        let before = s.find_by_id("ZTF21aa").unwrap().unwrap();

        assert!(s.mark_removed("ZTF21aa").unwrap());
        let after = s.find_by_id("ZTF21aa").unwrap().unwrap();
        assert!(after.is_removed);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(
            TransientRecord {
                is_removed: false,
                updated_at: before.updated_at,
                ..after
            },
            before
        );
    }

    #[test]
    fn tag_substring_search_matches_serialized_tags() {
        let mut s = store();
        s.upsert(&incoming("a", json!({"n": 1})).with_tags(["followup"])).unwrap();
        s.upsert(&incoming("b", json!({"n": 2})).with_tags(["favored"])).unwrap();
        s.upsert(&incoming("c", json!({"n": 3}))).unwrap();
        s.upsert(&incoming("d", json!({"n": 4})).with_tags(["sn", "follow"])).unwrap();

        let ids = |rs: Vec<TransientRecord>| rs.into_iter().map(|r| r.object_id).collect::<Vec<_>>();
        assert_eq!(ids(s.find_by_tag("follow", TagMatch::Substring).unwrap()), vec!["a", "d"]);
        assert_eq!(ids(s.find_by_tag("fav", TagMatch::Substring).unwrap()), vec!["b"]);
        // Spans the serialized separator between two labels.
        assert_eq!(ids(s.find_by_tag("sn\",\"", TagMatch::Substring).unwrap()), vec!["d"]);
        assert!(s.find_by_tag("nothing", TagMatch::Substring).unwrap().is_empty());
    }

    #[test]
    fn tag_exact_search_is_membership() {
        let mut s = store();
        s.upsert(&incoming("a", json!({"n": 1})).with_tags(["followup"])).unwrap();
        s.upsert(&incoming("d", json!({"n": 4})).with_tags(["sn", "follow"])).unwrap();

        let hits = s.find_by_tag("follow", TagMatch::Exact).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object_id, "d");
    }

    #[test]
    fn annotation_and_updated_queries() {
        let mut s = store();
        s.upsert(&incoming("a", json!({"n": 1}))).unwrap();
        s.upsert(&incoming("b", json!({"n": 1}))).unwrap();
        assert!(s.set_annotation_status("b", true).unwrap());
        s.upsert(&incoming("a", json!({"n": 2}))).unwrap();

        let annotated = s.find_by_annotation_status(true).unwrap();
        assert_eq!(annotated.len(), 1);
        assert_eq!(annotated[0].object_id, "b");
        assert_eq!(s.find_by_annotation_status(false).unwrap()[0].object_id, "a");

        let updated = s.find_updated().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].object_id, "a");
    }

    #[test]
    fn reset_discards_everything() {
        let mut s = store();
        s.upsert(&incoming("a", json!({}))).unwrap();
        s.reset().unwrap();
        assert_eq!(s.count().unwrap(), 0);
        assert_eq!(s.upsert(&incoming("a", json!({}))).unwrap(), Outcome::Inserted);
    }

    #[test]
    fn corrupt_comments_surface_as_errors() {
        let mut s = store();
        s.upsert(&incoming("a", json!({}))).unwrap();
        s.conn
            .execute("UPDATE transients SET comments = 'not json' WHERE object_id = 'a'", [])
            .unwrap();

        assert!(matches!(
            s.add_comment("a", "hello"),
            Err(StoreError::Corrupt { field: "comments", .. })
        ));
        assert!(matches!(s.find_by_id("a"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn merge_tags_keeps_order_and_deduplicates() {
        let merged = merge_tags(
            vec!["a".to_string(), "b".to_string()],
            &["b".to_string(), "c".to_string()],
        );
        assert_eq!(merged, vec!["a", "b", "c"]);
    }
}
