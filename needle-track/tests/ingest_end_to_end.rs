use needle_track::ingest::{load_batch, IngestError, IngestReport, Reconciler};
use needle_track::{RecordStore, TagCode};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::tempdir;

fn write_json(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn report(inserted: usize, updated: usize, no_change: usize) -> IngestReport {
    IngestReport {
        inserted,
        updated,
        no_change,
        skipped: 0,
    }
}

#[test]
fn test_insert_then_no_change_then_update() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("needle_track.db");
    let first = write_json(dir.path(), "first.json", r#"[{"objectId":"ZTF21aa","mag":19.2}]"#);
    let changed = write_json(dir.path(), "changed.json", r#"[{"objectId":"ZTF21aa","mag":18.9}]"#);

    let mut store = RecordStore::open(&db).unwrap();
    assert_eq!(
        Reconciler::new(&mut store).ingest_file(&first).unwrap(),
        report(1, 0, 0)
    );
    assert_eq!(
        Reconciler::new(&mut store).ingest_file(&first).unwrap(),
        report(0, 0, 1)
    );
    assert_eq!(
        Reconciler::new(&mut store).ingest_file(&changed).unwrap(),
        report(0, 1, 0)
    );

    let record = store.find_by_id("ZTF21aa").unwrap().expect("record");
    assert!(record.is_updated);
    assert_eq!(record.properties, serde_json::json!({"mag": 18.9}));
    assert_eq!(record.link, "https://lasair-ztf.lsst.ac.uk/objects/ZTF21aa/");
    assert_eq!(store.find_updated().unwrap().len(), 1);
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nested").join("needle_track.db");
    let batch = write_json(
        dir.path(),
        "batch.json",
        r#"[{"objectId":"ZTF21aa","mag":19.2},{"objectId":"ZTF21ab","mag":20.0}]"#,
    );

    {
        let mut store = RecordStore::open(&db).unwrap();
        Reconciler::new(&mut store).ingest_file(&batch).unwrap();
        assert!(store.add_comment("ZTF21aa", "candidate SN").unwrap());
        assert!(store.add_tag("ZTF21ab", TagCode::Followup).unwrap());
    }

    let mut store = RecordStore::open(&db).unwrap();
    assert_eq!(store.count().unwrap(), 2);
    let a = store.find_by_id("ZTF21aa").unwrap().unwrap();
    assert_eq!(a.comments.len(), 1);
    assert_eq!(a.comments[0].text, "candidate SN");
    let b = store.find_by_id("ZTF21ab").unwrap().unwrap();
    assert!(b.is_followup);
    assert_eq!(b.tags, vec!["followup".to_string()]);

    // Re-ingesting after the reopen still reconciles against the stored state.
    assert_eq!(
        Reconciler::new(&mut store).ingest_file(&batch).unwrap(),
        report(0, 0, 2)
    );
}

#[test]
fn test_reset_is_explicit() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("needle_track.db");
    let batch = write_json(dir.path(), "batch.json", r#"[{"objectId":"ZTF21aa"}]"#);

    let mut store = RecordStore::open(&db).unwrap();
    Reconciler::new(&mut store).ingest_file(&batch).unwrap();
    drop(store);

    // Plain reopen keeps data; only reset() discards it.
    let mut store = RecordStore::open(&db).unwrap();
    assert_eq!(store.count().unwrap(), 1);
    store.reset().unwrap();
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_source_errors() {
    let dir = tempdir().unwrap();
    let not_array = write_json(dir.path(), "object.json", r#"{"objectId":"ZTF21aa"}"#);

    assert!(matches!(
        load_batch(&not_array),
        Err(IngestError::Parse { .. })
    ));
    assert!(matches!(
        load_batch(&dir.path().join("missing.json")),
        Err(IngestError::Read { .. })
    ));
}

#[test]
fn test_unwritable_location_is_unavailable() {
    let dir = tempdir().unwrap();
    // A regular file where a parent directory is expected.
    let blocker = write_json(dir.path(), "blocker", "");
    let result = RecordStore::open(blocker.join("needle_track.db"));
    assert!(matches!(
        result,
        Err(needle_track::StoreError::Unavailable { .. })
    ));
}
