//! # tessera-common
//!
//! Common types, errors, and configuration for the Tessera row engine.
//!
//! This crate provides the foundational pieces shared by every Tessera
//! component:
//!
//! - **Types**: Field type tags (`FieldType`, `FieldKind`) and the packed
//!   per-field state (`FieldState`)
//! - **Errors**: Unified error handling with `TupleError`
//! - **Config**: Process-wide tuple engine settings (`TupleConfig`)
//! - **Constants**: Layout limits and packing constants
//!
//! ## Example
//!
//! ```rust
//! use tessera_common::types::{FieldKind, FieldState, FieldType};
//!
//! let ty: FieldType = "int?".parse().unwrap();
//! assert_eq!(ty.kind(), FieldKind::Int);
//! assert!(ty.is_nullable());
//! assert!(FieldState::AVAILABLE_NULL.is_null());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::TupleConfig;
pub use constants::*;
pub use error::{ErrorCode, TupleError, TupleResult};
pub use types::{FieldKind, FieldState, FieldType};
