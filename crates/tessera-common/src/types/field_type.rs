//! Field type tags.
//!
//! A descriptor is an ordered sequence of these tags. Tags are small `Copy`
//! values so descriptors can be hashed and compared cheaply when they are
//! interned.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TupleError;

/// The storage kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Boolean.
    Boolean,
    /// 8-bit signed integer.
    TinyInt,
    /// 16-bit signed integer.
    SmallInt,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    BigInt,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// Decimal stored as a scaled 128-bit mantissa.
    Decimal,
    /// Date (days since epoch).
    Date,
    /// Time (microseconds since midnight).
    Time,
    /// Timestamp (microseconds since epoch).
    Timestamp,
    /// 128-bit UUID.
    Uuid,
    /// UTF-8 string.
    Text,
    /// Binary data.
    Bytes,
}

impl FieldKind {
    /// All kinds, in declaration order.
    pub const ALL: [FieldKind; 14] = [
        FieldKind::Boolean,
        FieldKind::TinyInt,
        FieldKind::SmallInt,
        FieldKind::Int,
        FieldKind::BigInt,
        FieldKind::Float,
        FieldKind::Double,
        FieldKind::Decimal,
        FieldKind::Date,
        FieldKind::Time,
        FieldKind::Timestamp,
        FieldKind::Uuid,
        FieldKind::Text,
        FieldKind::Bytes,
    ];

    /// Returns the number of bits a value of this kind occupies when packed,
    /// or `None` for kinds that live in object slots (decimals and buffers).
    #[must_use]
    pub const fn bit_width(self) -> Option<usize> {
        match self {
            FieldKind::Boolean => Some(1),
            FieldKind::TinyInt => Some(8),
            FieldKind::SmallInt => Some(16),
            FieldKind::Int | FieldKind::Float | FieldKind::Date => Some(32),
            FieldKind::BigInt | FieldKind::Double | FieldKind::Time | FieldKind::Timestamp => {
                Some(64)
            }
            FieldKind::Uuid => Some(128),
            FieldKind::Decimal | FieldKind::Text | FieldKind::Bytes => None,
        }
    }

    /// Returns true if values of this kind are reference-counted buffers.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Bytes)
    }

    /// Returns true if this kind is numeric.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldKind::TinyInt
                | FieldKind::SmallInt
                | FieldKind::Int
                | FieldKind::BigInt
                | FieldKind::Float
                | FieldKind::Double
                | FieldKind::Decimal
        )
    }

    /// Returns the canonical lowercase name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::Boolean => "bool",
            FieldKind::TinyInt => "tinyint",
            FieldKind::SmallInt => "smallint",
            FieldKind::Int => "int",
            FieldKind::BigInt => "bigint",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Decimal => "decimal",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Uuid => "uuid",
            FieldKind::Text => "string",
            FieldKind::Bytes => "bytes",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKind {
    type Err = TupleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => FieldKind::Boolean,
            "tinyint" | "i8" => FieldKind::TinyInt,
            "smallint" | "i16" => FieldKind::SmallInt,
            "int" | "integer" | "i32" => FieldKind::Int,
            "bigint" | "long" | "i64" => FieldKind::BigInt,
            "float" | "real" | "f32" => FieldKind::Float,
            "double" | "f64" => FieldKind::Double,
            "decimal" | "numeric" => FieldKind::Decimal,
            "date" => FieldKind::Date,
            "time" => FieldKind::Time,
            "timestamp" | "datetime" => FieldKind::Timestamp,
            "uuid" | "guid" => FieldKind::Uuid,
            "string" | "text" | "varchar" => FieldKind::Text,
            "bytes" | "blob" | "binary" => FieldKind::Bytes,
            other => {
                return Err(TupleError::invalid_argument(format!(
                    "unknown field kind '{other}'"
                )))
            }
        };
        Ok(kind)
    }
}

/// A field type tag: a storage kind plus a nullability marker.
///
/// Nullability is part of the layout identity (`int` and `int?` produce
/// different descriptors). Every field can hold the null state regardless of
/// the marker; the marker records what the owning schema declared.
///
/// # Example
///
/// ```rust
/// use tessera_common::types::{FieldKind, FieldType};
///
/// let ty = FieldType::new(FieldKind::Int).nullable();
/// assert_eq!(ty.to_string(), "int?");
/// assert_eq!(ty.required(), FieldType::INT);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldType {
    kind: FieldKind,
    nullable: bool,
}

impl FieldType {
    /// Required boolean.
    pub const BOOL: Self = Self::new(FieldKind::Boolean);
    /// Required 8-bit integer.
    pub const TINYINT: Self = Self::new(FieldKind::TinyInt);
    /// Required 16-bit integer.
    pub const SMALLINT: Self = Self::new(FieldKind::SmallInt);
    /// Required 32-bit integer.
    pub const INT: Self = Self::new(FieldKind::Int);
    /// Required 64-bit integer.
    pub const BIGINT: Self = Self::new(FieldKind::BigInt);
    /// Required 32-bit float.
    pub const FLOAT: Self = Self::new(FieldKind::Float);
    /// Required 64-bit float.
    pub const DOUBLE: Self = Self::new(FieldKind::Double);
    /// Required decimal.
    pub const DECIMAL: Self = Self::new(FieldKind::Decimal);
    /// Required date.
    pub const DATE: Self = Self::new(FieldKind::Date);
    /// Required time.
    pub const TIME: Self = Self::new(FieldKind::Time);
    /// Required timestamp.
    pub const TIMESTAMP: Self = Self::new(FieldKind::Timestamp);
    /// Required UUID.
    pub const UUID: Self = Self::new(FieldKind::Uuid);
    /// String.
    pub const TEXT: Self = Self::new(FieldKind::Text);
    /// Binary data.
    pub const BYTES: Self = Self::new(FieldKind::Bytes);

    /// Creates a required (non-nullable) tag of the given kind.
    #[inline]
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// Returns the nullable flavor of this tag.
    #[inline]
    #[must_use]
    pub const fn nullable(self) -> Self {
        Self {
            kind: self.kind,
            nullable: true,
        }
    }

    /// Returns the required flavor of this tag.
    #[inline]
    #[must_use]
    pub const fn required(self) -> Self {
        Self {
            kind: self.kind,
            nullable: false,
        }
    }

    /// Returns the storage kind.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        self.kind
    }

    /// Returns true if the tag is marked nullable.
    #[inline]
    #[must_use]
    pub const fn is_nullable(self) -> bool {
        self.nullable
    }

    /// Parses a comma separated list of tags such as `"bool, int?, string"`.
    pub fn parse_list(s: &str) -> Result<Vec<FieldType>, TupleError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl From<FieldKind> for FieldType {
    fn from(kind: FieldKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldType({self})")
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl FromStr for FieldType {
    type Err = TupleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_suffix('?') {
            Some(base) => Ok(base.parse::<FieldKind>()?.into_type().nullable()),
            None => Ok(s.parse::<FieldKind>()?.into_type()),
        }
    }
}

impl FieldKind {
    /// Returns the required tag of this kind.
    #[inline]
    #[must_use]
    pub const fn into_type(self) -> FieldType {
        FieldType::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let ty: FieldType = "int?".parse().unwrap();
        assert_eq!(ty.kind(), FieldKind::Int);
        assert!(ty.is_nullable());
        assert_eq!(ty.to_string(), "int?");

        let ty: FieldType = " String ".parse().unwrap();
        assert_eq!(ty, FieldType::TEXT);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "widget".parse::<FieldType>().unwrap_err();
        assert!(err.to_string().contains("widget"));
    }

    #[test]
    fn test_parse_list() {
        let tags = FieldType::parse_list("bool, int?, string").unwrap();
        assert_eq!(
            tags,
            vec![FieldType::BOOL, FieldType::INT.nullable(), FieldType::TEXT]
        );
        assert!(FieldType::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_bit_widths() {
        assert_eq!(FieldKind::Boolean.bit_width(), Some(1));
        assert_eq!(FieldKind::Double.bit_width(), Some(64));
        assert_eq!(FieldKind::Uuid.bit_width(), Some(128));
        assert_eq!(FieldKind::Text.bit_width(), None);
        for kind in FieldKind::ALL {
            if let Some(width) = kind.bit_width() {
                assert!(width.is_power_of_two());
            }
        }
    }

    #[test]
    fn test_nullability_is_identity() {
        assert_ne!(FieldType::INT, FieldType::INT.nullable());
        assert_eq!(FieldType::INT.nullable().required(), FieldType::INT);
    }
}
