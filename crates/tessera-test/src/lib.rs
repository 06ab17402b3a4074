//! # tessera-test
//!
//! Integration tests for Tessera.
//!
//! This crate contains:
//! - Shared fixtures for building registries and rows
//! - Property tests for rows, views and overlays (`tests/`)
//! - Registry concurrency tests (`tests/`)

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test fixtures and helpers
pub mod fixtures;
