use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use flatdb_common::StoreConfig;
use flatdb_store::{ColumnType, Database};

/// A database in a temporary directory that is removed on drop.
pub struct TestDb {
    dir: TempDir,
    db: Database,
}

impl TestDb {
    /// Opens an empty database in a fresh temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let db = Database::open(StoreConfig::with_root(dir.path())).expect("open database");
        Self { dir, db }
    }

    /// Opens a database with a custom configuration rooted in a fresh
    /// temporary directory.
    pub fn with_config(configure: impl FnOnce(StoreConfig) -> StoreConfig) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let config = configure(StoreConfig::with_root(dir.path()));
        let db = Database::open(config).expect("open database");
        Self { dir, db }
    }

    /// Returns the database.
    pub fn db(&mut self) -> &mut Database {
        &mut self.db
    }

    /// Returns the data directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the catalog file path.
    pub fn catalog_path(&self) -> PathBuf {
        self.db.config().catalog_path()
    }

    /// Returns a table's row file path.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.db.config().table_path(table)
    }

    /// Reads a durable file as JSON.
    pub fn read_json(&self, path: &Path) -> serde_json::Value {
        let text = fs::read_to_string(path).expect("read file");
        serde_json::from_str(&text).expect("parse JSON")
    }

    /// Drops the open database and opens the directory again.
    pub fn reopen(&mut self) -> &mut Database {
        let config = self.db.config().clone();
        self.db = Database::open(config).expect("reopen database");
        &mut self.db
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}

/// Columns of the `users` fixture table.
pub fn user_columns() -> Vec<(String, ColumnType)> {
    vec![
        ("name".to_string(), ColumnType::Str),
        ("age".to_string(), ColumnType::Int),
    ]
}

/// Creates the `users` fixture table and inserts `(name, age)` rows.
pub fn seed_users(db: &mut Database, rows: &[(&str, i64)]) {
    db.create_table("users", user_columns()).expect("create users");
    for (name, age) in rows {
        db.insert("users", &[name.to_string(), age.to_string()])
            .expect("insert user");
    }
}
