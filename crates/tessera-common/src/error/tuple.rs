//! Tuple engine error types.

use std::fmt;
use thiserror::Error;

use crate::types::FieldType;

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
    /// Operation not supported.
    NotSupported = 0x0002,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,
    /// Invalid configuration.
    InvalidConfig = 0x0004,
    /// I/O error while loading or saving configuration.
    Io = 0x0005,

    // Access errors (0x0100 - 0x01FF)
    /// Field index outside the container.
    IndexOutOfRange = 0x0100,
    /// Value incompatible with the field's type tag.
    TypeMismatch = 0x0101,
    /// Container bound to an unexpected layout.
    DescriptorMismatch = 0x0102,

    // Layout errors (0x0200 - 0x02FF)
    /// Specialization of a layout failed.
    SpecializationFailed = 0x0200,
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
            0x01 => "Access",
            0x02 => "Layout",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for the tuple engine.
///
/// # Example
///
/// ```rust
/// use tessera_common::error::{ErrorCode, TupleError};
///
/// let err = TupleError::out_of_range(3, 2);
/// assert_eq!(err.code(), ErrorCode::IndexOutOfRange);
/// assert_eq!(err.to_string(), "field index 3 out of range for 2 fields");
/// ```
#[derive(Debug, Error)]
pub enum TupleError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Operation not supported, e.g. a write through a read-only view.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
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
    // Access Errors
    // ==========================================================================
    /// Field index outside `[0, count)`.
    #[error("field index {index} out of range for {count} fields")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of fields in the container.
        count: usize,
    },

    /// Value kind does not match the field's type tag.
    #[error("type mismatch at field {index}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The field index.
        index: usize,
        /// The field's type tag.
        expected: FieldType,
        /// Kind of the supplied value.
        actual: String,
    },

    /// A container was bound to a different layout than required.
    #[error("descriptor mismatch: expected {expected}, got {actual}")]
    DescriptorMismatch {
        /// Expected layout.
        expected: String,
        /// Actual layout.
        actual: String,
    },

    // ==========================================================================
    // Layout Errors
    // ==========================================================================
    /// Specialization failed; the layout keeps using generic storage.
    #[error("specialization of {layout} failed: {reason}")]
    SpecializationFailed {
        /// The layout that failed.
        layout: String,
        /// Reason for the failure.
        reason: String,
    },
}

impl TupleError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::NotSupported { .. } => ErrorCode::NotSupported,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::Io { .. } => ErrorCode::Io,
            Self::IndexOutOfRange { .. } => ErrorCode::IndexOutOfRange,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::DescriptorMismatch { .. } => ErrorCode::DescriptorMismatch,
            Self::SpecializationFailed { .. } => ErrorCode::SpecializationFailed,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an unsupported-operation error.
    #[must_use]
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported {
            operation: operation.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a range error.
    #[must_use]
    pub const fn out_of_range(index: usize, count: usize) -> Self {
        Self::IndexOutOfRange { index, count }
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(index: usize, expected: FieldType, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            index,
            expected,
            actual: actual.into(),
        }
    }

    /// Creates a descriptor mismatch error.
    #[must_use]
    pub fn descriptor_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::DescriptorMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates a specialization failure.
    #[must_use]
    pub fn specialization_failed(layout: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::SpecializationFailed {
            layout: layout.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error rejects a write on a read-only container.
    #[must_use]
    pub const fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }
}

/// Checks `index` against `count`.
///
/// # Errors
///
/// Returns [`TupleError::IndexOutOfRange`] if `index >= count`.
#[inline]
pub fn check_index(index: usize, count: usize) -> Result<(), TupleError> {
    if index < count {
        Ok(())
    } else {
        Err(TupleError::out_of_range(index, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = TupleError::out_of_range(5, 3);
        assert_eq!(err.code(), ErrorCode::IndexOutOfRange);
        assert_eq!(err.code().category(), "Access");
    }

    #[test]
    fn test_error_display() {
        let err = TupleError::type_mismatch(1, FieldType::INT.nullable(), "string");
        assert_eq!(
            err.to_string(),
            "type mismatch at field 1: expected int?, got string"
        );
    }

    #[test]
    fn test_not_supported() {
        let err = TupleError::not_supported("set_value on read-only segment");
        assert!(err.is_not_supported());
        assert_eq!(err.code().category(), "General");
        assert!(!TupleError::internal("x").is_not_supported());
    }

    #[test]
    fn test_check_index() {
        assert!(check_index(0, 1).is_ok());
        assert!(matches!(
            check_index(1, 1),
            Err(TupleError::IndexOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TupleError = io_err.into();
        assert_eq!(err.code(), ErrorCode::Io);
    }
}
