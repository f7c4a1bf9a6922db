//! Database error types.
//!
//! Every failure the core can report is a variant of [`FlatError`]. Variants
//! carry enough context to render a useful message, and each maps onto a
//! stable [`ErrorCode`] and a coarse [`ErrorKind`] that callers branch on.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid configuration.
    InvalidConfig = 0x0002,

    // I/O errors (0x0100 - 0x01FF)
    /// General I/O error.
    Io = 0x0100,
    /// Encoding or decoding of a durable object failed.
    Serialization = 0x0101,
    /// A durable object exists but cannot be parsed.
    StorageCorrupt = 0x0102,
    /// A table's row storage object is missing.
    StorageNotFound = 0x0103,

    // Catalog errors (0x0200 - 0x02FF)
    /// Table not found.
    TableNotFound = 0x0200,
    /// Table already exists.
    TableExists = 0x0201,
    /// Column not found.
    ColumnNotFound = 0x0202,

    // Validation errors (0x0300 - 0x03FF)
    /// Generic validation failure.
    Validation = 0x0300,
    /// A raw value cannot be coerced to its column type.
    InvalidValue = 0x0301,
    /// Wrong number of values for a table.
    ColumnCountMismatch = 0x0302,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "I/O",
            0x02 => "Catalog",
            0x03 => "Validation",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The coarse failure kinds the presentation layer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A table, column or storage object is absent.
    NotFound,
    /// A table with the same name already exists.
    AlreadyExists,
    /// Input failed validation (column count, value type, names).
    Validation,
    /// Durable content could not be parsed.
    StorageCorrupt,
    /// The operating system refused an I/O request.
    Io,
    /// Anything else.
    Internal,
}

/// The main error type for FlatDB.
///
/// # Example
///
/// ```rust
/// use flatdb_common::error::{ErrorCode, FlatError};
///
/// let err = FlatError::table_not_found("users");
/// assert_eq!(err.code(), ErrorCode::TableNotFound);
/// assert_eq!(err.to_string(), "table 'users' not found");
/// ```
#[derive(Debug, Error)]
pub enum FlatError {
    // ==========================================================================
    // Catalog Errors
    // ==========================================================================
    /// Table not found in the catalog.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// Table already exists.
    #[error("table '{table}' already exists")]
    TableExists {
        /// The duplicate table.
        table: String,
    },

    /// Column not found.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// The missing column.
        column: String,
        /// The table name.
        table: String,
    },

    // ==========================================================================
    // Validation Errors
    // ==========================================================================
    /// Generic validation failure.
    #[error("{message}")]
    Validation {
        /// Error message.
        message: String,
    },

    /// A raw value does not parse as the column's declared type.
    #[error("invalid value '{value}' for column '{column}' of type {column_type}")]
    InvalidValue {
        /// Target column.
        column: String,
        /// Declared column type.
        column_type: String,
        /// The offending raw value.
        value: String,
    },

    /// Wrong number of values supplied for a row.
    #[error("table '{table}' has {expected} columns, got {actual} values")]
    ColumnCountMismatch {
        /// Target table.
        table: String,
        /// Number of declared columns.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    // ==========================================================================
    // Storage Errors
    // ==========================================================================
    /// A table's row storage object is missing.
    #[error("storage for table '{table}' not found at {}", path.display())]
    StorageNotFound {
        /// Table whose storage is missing.
        table: String,
        /// Where the storage was expected.
        path: PathBuf,
    },

    /// A durable object could not be parsed.
    #[error("storage corrupted at {}: {message}", path.display())]
    StorageCorrupt {
        /// The corrupt object.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Encoding a durable object failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl FlatError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::TableExists { .. } => ErrorCode::TableExists,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::Validation { .. } => ErrorCode::Validation,
            Self::InvalidValue { .. } => ErrorCode::InvalidValue,
            Self::ColumnCountMismatch { .. } => ErrorCode::ColumnCountMismatch,
            Self::StorageNotFound { .. } => ErrorCode::StorageNotFound,
            Self::StorageCorrupt { .. } => ErrorCode::StorageCorrupt,
            Self::Serialization { .. } => ErrorCode::Serialization,
            Self::Io { .. } => ErrorCode::Io,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TableNotFound { .. } | Self::StorageNotFound { .. } => ErrorKind::NotFound,
            Self::TableExists { .. } => ErrorKind::AlreadyExists,
            Self::ColumnNotFound { .. }
            | Self::Validation { .. }
            | Self::InvalidValue { .. }
            | Self::ColumnCountMismatch { .. }
            | Self::InvalidConfig { .. } => ErrorKind::Validation,
            Self::StorageCorrupt { .. } => ErrorKind::StorageCorrupt,
            Self::Io { .. } => ErrorKind::Io,
            Self::Serialization { .. } | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns true if a table or storage object was missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }

    /// Returns true if this error rejects caller input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation)
    }

    /// Creates a table-not-found error.
    #[must_use]
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Creates a table-exists error.
    #[must_use]
    pub fn table_exists(table: impl Into<String>) -> Self {
        Self::TableExists {
            table: table.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
