//! System-wide constants for FlatDB.

// =============================================================================
// Durable Layout
// =============================================================================

/// Default catalog file name.
pub const DEFAULT_CATALOG_FILE: &str = "db_meta.json";

/// Default directory for per-table row files.
pub const DEFAULT_TABLES_DIR: &str = "data";

/// Extension of per-table row files.
pub const TABLE_FILE_EXTENSION: &str = "json";

/// Suffix appended to a file name while it is being rewritten.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

// =============================================================================
// Records
// =============================================================================

/// Name of the implicit record identifier column.
pub const ID_COLUMN: &str = "ID";

/// Lowercased spellings that coerce to `true` for `bool` columns.
/// Anything else coerces to `false`.
pub const TRUTHY_VALUES: [&str; 3] = ["true", "1", "yes"];

// =============================================================================
// Cache
// =============================================================================

/// Default number of cached query results.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;
