//! End-to-end integration tests for FlatDB.
//!
//! These tests drive the `Database` facade against real files in a temporary
//! directory and check both the returned values and what lands on disk.

use std::fs;

use serde_json::json;

use flatdb_common::FlatError;
use flatdb_store::{ColumnType, Predicate, Value};
use flatdb_test::utils::{seed_users, user_columns, TestDb};

fn ids(records: &[flatdb_store::Record]) -> Vec<u64> {
    records.iter().map(|r| r.id()).collect()
}

// =============================================================================
// Walkthrough
// =============================================================================

#[test]
fn test_users_walkthrough() {
    let mut t = TestDb::new();
    let db = t.db();
    db.create_table("users", user_columns()).unwrap();

    let ann = db.insert("users", &["Ann", "30"]).unwrap();
    assert_eq!(ann.id(), 1);
    assert_eq!(ann.get("name"), Some(&Value::from("Ann")));
    assert_eq!(ann.get("age"), Some(&Value::Int(30)));

    assert_eq!(db.insert("users", &["Bo", "25"]).unwrap().id(), 2);

    let found = db.select("users", Some(&Predicate::new("name", "Ann"))).unwrap();
    assert_eq!(ids(&found), vec![1]);

    assert_eq!(db.delete("users", &Predicate::new("age", "30")).unwrap(), 1);
    assert_eq!(db.describe_table("users").unwrap().row_count(), 1);

    let rows = t.read_json(&t.table_path("users"));
    assert_eq!(rows, json!([{"ID": 2, "name": "Bo", "age": 25}]));
}

// =============================================================================
// On-disk layout
// =============================================================================

#[test]
fn test_file_layout() {
    let mut t = TestDb::new();
    seed_users(t.db(), &[("Ann", 30)]);
    t.db()
        .create_table("flags", vec![("on".to_string(), ColumnType::Bool)])
        .unwrap();
    t.db().insert("flags", &["YES"]).unwrap();

    assert!(t.path().join("db_meta.json").is_file());
    assert!(t.path().join("data").join("users.json").is_file());

    let catalog = t.read_json(&t.catalog_path());
    assert_eq!(
        catalog,
        json!({
            "tables": {
                "users": {"columns": {"name": "string", "age": "int"}, "rows": 1, "last_id": 1},
                "flags": {"columns": {"on": "bool"}, "rows": 1, "last_id": 1}
            }
        })
    );

    let text = fs::read_to_string(t.table_path("flags")).unwrap();
    assert_eq!(text, "[\n    {\n        \"ID\": 1,\n        \"on\": true\n    }\n]");

    // Column order in the catalog file follows declaration order
    let text = fs::read_to_string(t.catalog_path()).unwrap();
    assert!(text.find("\"name\"").unwrap() < text.find("\"age\"").unwrap());
}

#[test]
fn test_reads_hand_written_files() {
    let mut t = TestDb::new();
    fs::create_dir_all(t.path().join("data")).unwrap();
    fs::write(
        t.catalog_path(),
        r#"{"tables": {"users": {"columns": {"name": "string", "age": "int"}, "rows": 2}}}"#,
    )
    .unwrap();
    fs::write(
        t.table_path("users"),
        r#"[{"ID": 1, "name": "Ann", "age": 30}, {"ID": 4, "name": "Di", "age": 41}]"#,
    )
    .unwrap();

    let db = t.reopen();
    let rows = db.select("users", Some(&Predicate::new("age", "41"))).unwrap();
    assert_eq!(ids(&rows), vec![4]);

    // Next ID skips past the highest one on disk
    assert_eq!(db.insert("users", &["Ed", "50"]).unwrap().id(), 5);
}

// =============================================================================
// Persistence across reopen
// =============================================================================

#[test]
fn test_reopen_preserves_everything() {
    let mut t = TestDb::new();
    seed_users(t.db(), &[("Ann", 30), ("Bo", 25), ("Cy", 40)]);
    t.db()
        .update("users", "age", "26", &Predicate::new("name", "Bo"))
        .unwrap();
    t.db().delete("users", &Predicate::new("name", "Cy")).unwrap();

    let db = t.reopen();
    assert_eq!(db.list_tables(), vec!["users"]);
    let schema = db.describe_table("users").unwrap();
    assert_eq!(schema.row_count(), 2);
    assert_eq!(schema.last_id(), 3);

    let all = db.select("users", None).unwrap();
    assert_eq!(ids(&all), vec![1, 2]);
    assert_eq!(all[1].get("age"), Some(&Value::Int(26)));

    assert_eq!(db.insert("users", &["Di", "41"]).unwrap().id(), 4);
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_row_count_matches_storage() {
    let mut t = TestDb::new();
    seed_users(t.db(), &[("Ann", 30), ("Bo", 25), ("Cy", 30), ("Di", 41)]);

    let check = |t: &mut TestDb| {
        let stored = t.read_json(&t.table_path("users"));
        let count = stored.as_array().unwrap().len() as u64;
        assert_eq!(t.db().describe_table("users").unwrap().row_count(), count);
    };

    check(&mut t);
    t.db().delete("users", &Predicate::new("age", "30")).unwrap();
    check(&mut t);
    t.db().insert("users", &["Ed", "50"]).unwrap();
    check(&mut t);
    t.db().update("users", "age", "1", &Predicate::new("age", "50")).unwrap();
    check(&mut t);
}

#[test]
fn test_sequential_ids_never_reused() {
    let mut t = TestDb::new();
    let db = t.db();
    db.create_table("log", vec![("msg".to_string(), ColumnType::Str)])
        .unwrap();

    let first: Vec<u64> = (0..5)
        .map(|i| db.insert("log", &[format!("m{i}")]).unwrap().id())
        .collect();
    assert_eq!(first, vec![1, 2, 3, 4, 5]);

    db.delete("log", &Predicate::new("ID", "5")).unwrap();
    db.delete("log", &Predicate::new("ID", "2")).unwrap();
    assert_eq!(db.insert("log", &["again"]).unwrap().id(), 6);

    db.delete("log", &Predicate::new("msg", "again")).unwrap();
    for id in [1, 3, 4] {
        db.delete("log", &Predicate::new("ID", id.to_string())).unwrap();
    }
    assert_eq!(db.describe_table("log").unwrap().row_count(), 0);
    assert!(db.select("log", None).unwrap().is_empty());
    assert_eq!(db.insert("log", &["fresh"]).unwrap().id(), 7);
}

#[test]
fn test_predicate_uses_string_form() {
    let mut t = TestDb::new();
    let db = t.db();
    db.create_table(
        "mixed",
        vec![
            ("n".to_string(), ColumnType::Int),
            ("b".to_string(), ColumnType::Bool),
            ("s".to_string(), ColumnType::Str),
        ],
    )
    .unwrap();
    db.insert("mixed", &["007", "1", "007"]).unwrap();

    let by = |db: &flatdb_store::Database, col: &str, val: &str| {
        db.select("mixed", Some(&Predicate::new(col, val)))
            .unwrap()
            .len()
    };

    assert_eq!(by(db, "n", "7"), 1);
    assert_eq!(by(db, "n", "007"), 0);
    assert_eq!(by(db, "s", "007"), 1);
    assert_eq!(by(db, "b", "true"), 1);
    assert_eq!(by(db, "b", "1"), 0);
    assert_eq!(by(db, "missing", "x"), 0);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_errors_leave_files_untouched() {
    let mut t = TestDb::new();
    seed_users(t.db(), &[("Ann", 30)]);
    let catalog_before = fs::read_to_string(t.catalog_path()).unwrap();
    let rows_before = fs::read_to_string(t.table_path("users")).unwrap();

    let db = t.db();
    assert!(matches!(
        db.insert("users", &["Bo"]).unwrap_err(),
        FlatError::ColumnCountMismatch { .. }
    ));
    assert!(db.insert("users", &["Bo", "old"]).unwrap_err().is_validation());
    assert!(db.create_table("users", user_columns()).is_err());
    assert!(db
        .update("users", "nope", "1", &Predicate::new("name", "Ann"))
        .is_err());
    assert!(db.insert("ghost", &["x"]).unwrap_err().is_not_found());
    assert!(db.drop_table("ghost").unwrap_err().is_not_found());

    assert_eq!(fs::read_to_string(t.catalog_path()).unwrap(), catalog_before);
    assert_eq!(fs::read_to_string(t.table_path("users")).unwrap(), rows_before);
    assert!(!t.table_path("ghost").exists());
}

#[test]
fn test_corrupt_row_file_reads_as_empty() {
    let mut t = TestDb::new();
    seed_users(t.db(), &[("Ann", 30)]);
    fs::write(t.table_path("users"), "[{\"ID\": 1, \"na").unwrap();

    let db = t.reopen();
    assert!(db.select("users", None).unwrap().is_empty());
}

#[test]
fn test_corrupt_catalog_fails_open() {
    let mut t = TestDb::new();
    seed_users(t.db(), &[("Ann", 30)]);
    fs::write(t.catalog_path(), "{\"tables\": [").unwrap();

    let err = flatdb_store::Database::open(t.db().config().clone()).unwrap_err();
    assert!(matches!(err, FlatError::StorageCorrupt { .. }));
}

#[test]
fn test_drop_with_missing_row_file() {
    let mut t = TestDb::new();
    seed_users(t.db(), &[]);
    fs::remove_file(t.table_path("users")).unwrap();

    t.db().drop_table("users").unwrap();
    assert!(t.reopen().list_tables().is_empty());
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn test_cache_sees_every_write() {
    let mut t = TestDb::new();
    seed_users(t.db(), &[("Ann", 30)]);
    let db = t.db();
    let by_name = Predicate::new("name", "Bo");

    assert!(db.select("users", Some(&by_name)).unwrap().is_empty());
    db.insert("users", &["Bo", "25"]).unwrap();
    assert_eq!(db.select("users", Some(&by_name)).unwrap().len(), 1);

    db.update("users", "age", "26", &by_name).unwrap();
    assert_eq!(
        db.select("users", Some(&by_name)).unwrap()[0].get("age"),
        Some(&Value::Int(26))
    );

    db.drop_table("users").unwrap();
    db.create_table("users", user_columns()).unwrap();
    assert!(db.select("users", None).unwrap().is_empty());
}

#[test]
fn test_cache_eviction_and_stats() {
    let mut t = TestDb::with_config(|c| c.cache_capacity(2));
    seed_users(t.db(), &[("Ann", 30), ("Bo", 25)]);
    let db = t.db();

    db.select("users", Some(&Predicate::new("name", "Ann"))).unwrap();
    db.select("users", Some(&Predicate::new("name", "Bo"))).unwrap();
    db.select("users", None).unwrap();
    db.select("users", None).unwrap();

    let stats = db.cache_stats();
    assert_eq!(stats.hits(), 1);
    assert_eq!(stats.misses(), 3);
    assert_eq!(stats.evictions(), 1);
    assert_eq!(db.cached_results(), 2);
}
