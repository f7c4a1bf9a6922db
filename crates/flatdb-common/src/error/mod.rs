//! Error handling for FlatDB.
//!
//! This module provides a unified error type and result alias used
//! across all FlatDB components.

mod database;

pub use database::{ErrorCode, ErrorKind, FlatError};

/// Result type alias for FlatDB operations.
pub type FlatResult<T> = std::result::Result<T, FlatError>;
