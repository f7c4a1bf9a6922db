//! JSON file storage.
//!
//! Every save rewrites the whole target file with atomic replacement: the
//! new content goes to `<file>.tmp`, is optionally synced, and is renamed
//! over the old file. A crash leaves either the old or the new snapshot.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use flatdb_common::{FlatError, FlatResult, StoreConfig, TEMP_FILE_SUFFIX};

use crate::catalog::Catalog;
use crate::record::Record;

use super::{decode_catalog, decode_rows, encode_json, Persistence};

/// File-based storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    config: StoreConfig,
}

impl FileStore {
    /// Creates a file store for the given configuration.
    ///
    /// Nothing is touched on disk until the first save.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Opens a store with default file names under `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Self {
        Self::new(StoreConfig::with_root(root.as_ref()))
    }

    /// Returns the storage configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Writes `bytes` to `path` via a temporary file and rename.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> FlatResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let tmp_path = temp_path(path);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(bytes)?;

        if self.config.sync_writes {
            file.sync_all()?;
        }
        drop(file);

        fs::rename(&tmp_path, path)?;

        // Sync the directory so the rename itself is durable
        if self.config.sync_writes {
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }

        debug!(path = %path.display(), bytes = bytes.len(), "rewrote file");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TEMP_FILE_SUFFIX);
    path.with_file_name(name)
}

/// Reads a file, mapping "not found" to `None`.
fn read_optional(path: &Path) -> FlatResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Persistence for FileStore {
    fn load_catalog(&self) -> FlatResult<Catalog> {
        let path = self.config.catalog_path();
        let Some(bytes) = read_optional(&path)? else {
            debug!(path = %path.display(), "no catalog yet, starting empty");
            return Ok(Catalog::new());
        };

        decode_catalog(&bytes).map_err(|e| FlatError::StorageCorrupt {
            path,
            message: e.to_string(),
        })
    }

    fn save_catalog(&self, catalog: &Catalog) -> FlatResult<()> {
        let bytes = encode_json(catalog)?;
        self.write_atomic(&self.config.catalog_path(), &bytes)
    }

    fn load_rows(&self, table: &str) -> FlatResult<Vec<Record>> {
        let path = self.config.table_path(table);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(Vec::new());
        };

        match decode_rows(&bytes) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                warn!(
                    table,
                    path = %path.display(),
                    error = %e,
                    "row storage is corrupt, treating table as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    fn save_rows(&self, table: &str, rows: &[Record]) -> FlatResult<()> {
        let bytes = encode_json(rows)?;
        self.write_atomic(&self.config.table_path(table), &bytes)
    }

    fn delete_table_storage(&self, table: &str) -> FlatResult<()> {
        let path = self.config.table_path(table);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FlatError::StorageNotFound {
                table: table.to_string(),
                path,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn table_storage_exists(&self, table: &str) -> bool {
        self.config.table_path(table).is_file()
    }
}
