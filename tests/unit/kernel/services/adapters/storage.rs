use super::*;
use crate::kernel::services::ports::storage::SavedSession;
use crate::models::Snapshot;
use tempfile::tempdir;

fn sample_snapshot() -> Snapshot {
    Snapshot::from([
        ("index.html".to_string(), "<h1>hi</h1>".to_string()),
        ("src/app.js".to_string(), "console.log(1)".to_string()),
    ])
}

#[test]
fn test_memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").unwrap(), None);

    store.set("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
}

#[test]
fn test_json_file_store_persists_across_instances() {
    let dir = tempdir().unwrap();
    let session = SavedSession::new(sample_snapshot(), Some("src/app.js".to_string()));

    let store = JsonFileStore::new(dir.path().join("storage"));
    session.save(&store, "zpreview.session").unwrap();
    assert!(dir.path().join("storage/zpreview.session.json").exists());

    let reopened = JsonFileStore::new(dir.path().join("storage"));
    let restored = SavedSession::load(&reopened, "zpreview.session")
        .unwrap()
        .unwrap();
    assert_eq!(restored, session);
}

#[test]
fn test_json_file_store_missing_key_and_remove() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());

    assert_eq!(store.get("absent").unwrap(), None);
    store.remove("absent").unwrap();

    store.set("a/b", "x").unwrap();
    assert!(dir.path().join("a_b.json").exists());
    assert_eq!(store.get("a/b").unwrap().as_deref(), Some("x"));
}

#[test]
fn test_corrupt_session_is_reported() {
    let store = MemoryStore::new();
    store.set("zpreview.session", "not json").unwrap();

    let err = SavedSession::load(&store, "zpreview.session").unwrap_err();
    assert!(matches!(err, StorageError::Corrupt(_)));
}

#[test]
fn test_session_with_unknown_version_is_ignored() {
    let store = MemoryStore::new();
    store
        .set("zpreview.session", r#"{"version": 99, "files": {}}"#)
        .unwrap();

    assert!(SavedSession::load(&store, "zpreview.session")
        .unwrap()
        .is_none());
}
