use super::*;
use crate::logic::features::{FeatureVector, FEATURE_COUNT, FEATURE_VERSION};
use tempfile::tempdir;

fn vector(seed: f64) -> FeatureVector {
    let mut values = [0.0; FEATURE_COUNT];
    for (i, v) in values.iter_mut().enumerate() {
        *v = seed + i as f64 * 0.5;
    }
    FeatureVector::from_values(values)
}

fn exercise_store(store: &dyn TrainingStore) {
    assert_eq!(store.count("alice").unwrap(), 0);
    assert!(store.read_all("alice").unwrap().is_empty());

    for i in 0..3 {
        store.append("alice", &vector(i as f64)).unwrap();
    }
    store.append("bob", &vector(100.0)).unwrap();

    assert_eq!(store.count("alice").unwrap(), 3);
    assert_eq!(store.count("bob").unwrap(), 1);

    let all = store.read_all("alice").unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0], vector(0.0));
    assert_eq!(all[2], vector(2.0));
}

#[test]
fn test_memory_store_append_count_read() {
    exercise_store(&MemoryTrainingStore::new());
}

#[test]
fn test_sqlite_store_append_count_read() {
    exercise_store(&SqliteTrainingStore::open_in_memory().unwrap());
}

#[test]
fn test_stores_reject_foreign_layout() {
    let mut foreign = vector(1.0);
    foreign.version = FEATURE_VERSION + 1;

    let memory = MemoryTrainingStore::new();
    assert!(matches!(memory.append("alice", &foreign), Err(StoreError::Layout(_))));
    assert_eq!(memory.count("alice").unwrap(), 0);

    let sqlite = SqliteTrainingStore::open_in_memory().unwrap();
    assert!(matches!(sqlite.append("alice", &foreign), Err(StoreError::Layout(_))));
    assert_eq!(sqlite.count("alice").unwrap(), 0);
}

#[test]
fn test_sqlite_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("training.db");

    {
        let store = SqliteTrainingStore::open(&path).unwrap();
        store.append("alice", &vector(1.0)).unwrap();
        store.append("alice", &vector(2.0)).unwrap();
    }

    let store = SqliteTrainingStore::open(&path).unwrap();
    assert_eq!(store.count("alice").unwrap(), 2);
    assert_eq!(store.read_all("alice").unwrap()[1], vector(2.0));
    assert_eq!(store.count("bob").unwrap(), 0);
}

#[test]
fn test_sqlite_refuses_rows_from_old_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("training.db");
    let store = SqliteTrainingStore::open(&path).unwrap();
    store.append("alice", &vector(1.0)).unwrap();
    drop(store);

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE training_vectors SET feature_version = 0", []).unwrap();
    drop(conn);

    let store = SqliteTrainingStore::open(&path).unwrap();
    assert!(matches!(store.read_all("alice"), Err(StoreError::Layout(_))));
}

#[test]
fn test_sqlite_flags_truncated_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("training.db");
    let store = SqliteTrainingStore::open(&path).unwrap();
    store.append("alice", &vector(1.0)).unwrap();
    drop(store);

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE training_vectors SET vals = '[1.0, 2.0]'", []).unwrap();
    drop(conn);

    let store = SqliteTrainingStore::open(&path).unwrap();
    assert!(matches!(store.read_all("alice"), Err(StoreError::Corrupt { .. })));
}

#[test]
fn test_export_jsonl() {
    let dir = tempdir().unwrap();
    let store = MemoryTrainingStore::new();
    store.append("alice", &vector(1.0)).unwrap();
    store.append("alice", &vector(2.0)).unwrap();

    let target = dir.path().join("export").join("alice.jsonl");
    let written = export_jsonl(&store, "alice", &target).unwrap();
    assert_eq!(written, 2);

    let content = std::fs::read_to_string(&target).unwrap();
    let records: Vec<TrainingRecord> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].index, 1);
    assert_eq!(records[1].features, vector(2.0).values.to_vec());
    assert_eq!(records[0].feature_version, FEATURE_VERSION);
}
