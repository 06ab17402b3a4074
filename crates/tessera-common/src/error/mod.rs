//! Error handling for the tuple engine.
//!
//! This module provides a unified error type and result alias used
//! across all Tessera components.

mod tuple;

pub use tuple::{check_index, ErrorCode, TupleError};

/// Result type alias for tuple engine operations.
pub type TupleResult<T> = std::result::Result<T, TupleError>;
