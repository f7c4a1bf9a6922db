//! # flatdb-test
//!
//! Integration tests for FlatDB.
//!
//! This crate contains:
//! - End-to-end tests over on-disk databases
//! - Helpers for temporary databases and fixture tables

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;
