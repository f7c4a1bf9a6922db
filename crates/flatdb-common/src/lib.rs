//! # flatdb-common
//!
//! Common types, errors, and configuration for FlatDB.
//!
//! This crate provides the foundational pieces shared by every FlatDB
//! component:
//!
//! - **Errors**: Unified error handling with `FlatError` and stable `ErrorCode`s
//! - **Config**: Storage configuration (`StoreConfig`)
//! - **Constants**: File names, reserved column names, coercion tables
//!
//! ## Example
//!
//! ```rust
//! use flatdb_common::error::{FlatError, FlatResult};
//!
//! fn lookup(name: &str) -> FlatResult<()> {
//!     Err(FlatError::table_not_found(name))
//! }
//!
//! assert!(lookup("users").unwrap_err().is_not_found());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;

// Re-export commonly used items at the crate root
pub use config::{CacheSettings, StoreConfig};
pub use constants::*;
pub use error::{ErrorCode, ErrorKind, FlatError, FlatResult};
