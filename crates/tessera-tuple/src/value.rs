//! Field values.
//!
//! `Value` is the closed slot type every container reads and writes. Scalars
//! are stored inline; strings and byte buffers are reference counted so that
//! reading a field never copies its payload.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bytes::Bytes;
use tessera_common::{FieldKind, FieldType, TupleError, TupleResult};

/// A field value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 8-bit signed integer.
    TinyInt(i8),
    /// 16-bit signed integer.
    SmallInt(i16),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    BigInt(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Decimal value (stored as scaled integer).
    Decimal {
        /// Unscaled mantissa.
        value: i128,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// Date (days since epoch).
    Date(i32),
    /// Time (microseconds since midnight).
    Time(i64),
    /// Timestamp (microseconds since epoch).
    Timestamp(i64),
    /// UUID.
    Uuid(u128),
    /// String value.
    Text(Arc<str>),
    /// Binary data.
    Bytes(Bytes),
}

impl Value {
    /// Creates a NULL value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Creates a boolean value.
    pub fn boolean(v: bool) -> Self {
        Value::Boolean(v)
    }

    /// Creates an integer value.
    pub fn int(v: i32) -> Self {
        Value::Int(v)
    }

    /// Creates a bigint value.
    pub fn bigint(v: i64) -> Self {
        Value::BigInt(v)
    }

    /// Creates a double value.
    pub fn double(v: f64) -> Self {
        Value::Double(v)
    }

    /// Creates a decimal value.
    pub fn decimal(value: i128, scale: u8) -> Self {
        Value::Decimal { value, scale }
    }

    /// Creates a string value.
    pub fn text(v: impl AsRef<str>) -> Self {
        Value::Text(Arc::from(v.as_ref()))
    }

    /// Creates a binary value.
    pub fn bytes(v: impl Into<Bytes>) -> Self {
        Value::Bytes(v.into())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the kind of this value, or `None` for NULL.
    pub fn kind(&self) -> Option<FieldKind> {
        let kind = match self {
            Value::Null => return None,
            Value::Boolean(_) => FieldKind::Boolean,
            Value::TinyInt(_) => FieldKind::TinyInt,
            Value::SmallInt(_) => FieldKind::SmallInt,
            Value::Int(_) => FieldKind::Int,
            Value::BigInt(_) => FieldKind::BigInt,
            Value::Float(_) => FieldKind::Float,
            Value::Double(_) => FieldKind::Double,
            Value::Decimal { .. } => FieldKind::Decimal,
            Value::Date(_) => FieldKind::Date,
            Value::Time(_) => FieldKind::Time,
            Value::Timestamp(_) => FieldKind::Timestamp,
            Value::Uuid(_) => FieldKind::Uuid,
            Value::Text(_) => FieldKind::Text,
            Value::Bytes(_) => FieldKind::Bytes,
        };
        Some(kind)
    }

    /// Returns the name of this value's kind, `"null"` for NULL.
    pub fn kind_name(&self) -> &'static str {
        self.kind().map_or("null", FieldKind::name)
    }

    /// Checks that this value may be stored in a field of type `ty`.
    ///
    /// NULL is accepted by every field.
    pub fn check_type(&self, index: usize, ty: FieldType) -> TupleResult<()> {
        match self.kind() {
            None => Ok(()),
            Some(kind) if kind == ty.kind() => Ok(()),
            Some(_) => Err(TupleError::type_mismatch(index, ty, self.kind_name())),
        }
    }

    /// Returns the raw bit pattern of a fixed-width value.
    ///
    /// Returns `None` for NULL and for values stored in object slots.
    pub(crate) fn to_bits(&self) -> Option<u128> {
        let bits = match self {
            Value::Boolean(b) => u128::from(*b),
            Value::TinyInt(v) => u128::from(*v as u8),
            Value::SmallInt(v) => u128::from(*v as u16),
            Value::Int(v) | Value::Date(v) => u128::from(*v as u32),
            Value::BigInt(v) | Value::Time(v) | Value::Timestamp(v) => u128::from(*v as u64),
            Value::Float(v) => u128::from(v.to_bits()),
            Value::Double(v) => u128::from(v.to_bits()),
            Value::Uuid(v) => *v,
            Value::Null | Value::Decimal { .. } | Value::Text(_) | Value::Bytes(_) => {
                return None
            }
        };
        Some(bits)
    }

    /// Rebuilds a fixed-width value of `kind` from its bit pattern.
    pub(crate) fn from_bits(kind: FieldKind, bits: u128) -> Value {
        match kind {
            FieldKind::Boolean => Value::Boolean(bits & 1 != 0),
            FieldKind::TinyInt => Value::TinyInt(bits as u8 as i8),
            FieldKind::SmallInt => Value::SmallInt(bits as u16 as i16),
            FieldKind::Int => Value::Int(bits as u32 as i32),
            FieldKind::Date => Value::Date(bits as u32 as i32),
            FieldKind::BigInt => Value::BigInt(bits as u64 as i64),
            FieldKind::Time => Value::Time(bits as u64 as i64),
            FieldKind::Timestamp => Value::Timestamp(bits as u64 as i64),
            FieldKind::Float => Value::Float(f32::from_bits(bits as u32)),
            FieldKind::Double => Value::Double(f64::from_bits(bits as u64)),
            FieldKind::Uuid => Value::Uuid(bits),
            FieldKind::Decimal | FieldKind::Text | FieldKind::Bytes => Value::Null,
        }
    }

    /// Returns the decimal with trailing zero digits stripped from the scale.
    fn normalized_decimal(value: i128, scale: u8) -> (i128, u8) {
        let (mut value, mut scale) = (value, scale);
        while scale > 0 && value % 10 == 0 {
            value /= 10;
            scale -= 1;
        }
        (value, scale)
    }

    fn cmp_decimal(a: (i128, u8), b: (i128, u8)) -> Ordering {
        let (a, a_scale) = Self::normalized_decimal(a.0, a.1);
        let (b, b_scale) = Self::normalized_decimal(b.0, b.1);
        let scale = a_scale.max(b_scale);
        let widen = |v: i128, s: u8| {
            10i128
                .checked_pow(u32::from(scale - s))
                .and_then(|factor| v.checked_mul(factor))
        };
        if let (Some(wa), Some(wb)) = (widen(a, a_scale), widen(b, b_scale)) {
            return wa.cmp(&wb);
        }

        // Widening overflowed: compare digit strings.
        let sign = a.signum().cmp(&b.signum());
        if sign != Ordering::Equal {
            return sign;
        }
        let (a_int, a_frac) = Self::decimal_digits(a, a_scale);
        let (b_int, b_frac) = Self::decimal_digits(b, b_scale);
        let magnitude = a_int
            .len()
            .cmp(&b_int.len())
            .then_with(|| a_int.cmp(&b_int))
            .then_with(|| a_frac.trim_end_matches('0').cmp(b_frac.trim_end_matches('0')));
        if a < 0 {
            magnitude.reverse()
        } else {
            magnitude
        }
    }

    /// Splits the magnitude of a decimal into the digits before and after
    /// the point. The integer part has no leading zeros.
    fn decimal_digits(value: i128, scale: u8) -> (String, String) {
        let digits = value.unsigned_abs().to_string();
        let scale = usize::from(scale);
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            (int_part.to_string(), frac_part.to_string())
        } else {
            ("0".to_string(), format!("{digits:0>scale$}"))
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // NULL is considered less than any non-NULL value
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,

            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::TinyInt(a), Value::TinyInt(b)) => a.cmp(b),
            (Value::SmallInt(a), Value::SmallInt(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::BigInt(a), Value::BigInt(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (
                Value::Decimal { value: a, scale: sa },
                Value::Decimal { value: b, scale: sb },
            ) => Self::cmp_decimal((*a, *sa), (*b, *sb)),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),

            // Values of different kinds never share a field; order by kind
            (a, b) => a.kind().cmp(&b.kind()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::TinyInt(i) => i.hash(state),
            Value::SmallInt(i) => i.hash(state),
            Value::Int(i) | Value::Date(i) => i.hash(state),
            Value::BigInt(i) | Value::Time(i) | Value::Timestamp(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Double(f) => f.to_bits().hash(state),
            Value::Decimal { value, scale } => {
                Self::normalized_decimal(*value, *scale).hash(state);
            }
            Value::Uuid(u) => u.hash(state),
            Value::Text(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::TinyInt(i) => write!(f, "{}", i),
            Value::SmallInt(i) => write!(f, "{}", i),
            Value::Int(i) => write!(f, "{}", i),
            Value::BigInt(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Decimal { value, scale } => {
                let sign = if *value < 0 { "-" } else { "" };
                let (int_part, frac_part) = Self::decimal_digits(*value, *scale);
                if frac_part.is_empty() {
                    write!(f, "{}{}", sign, int_part)
                } else {
                    write!(f, "{}{}.{}", sign, int_part, frac_part)
                }
            }
            Value::Date(d) => write!(f, "date:{}", d),
            Value::Time(t) => write!(f, "time:{}", t),
            Value::Timestamp(t) => write!(f, "ts:{}", t),
            Value::Uuid(u) => write!(f, "{:032x}", u),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bytes(b) => {
                write!(f, "0x")?;
                for byte in b.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// A Rust type that maps onto one field kind.
///
/// Used by the typed accessors on [`TupleExt`](crate::TupleExt).
pub trait FieldValue: Sized {
    /// The field kind values of this type are stored as.
    const KIND: FieldKind;

    /// Converts into a field value.
    fn into_value(self) -> Value;

    /// Extracts from a field value, `None` if the kinds differ or the value
    /// is NULL.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! scalar_field_value {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl FieldValue for $ty {
            const KIND: FieldKind = FieldKind::$kind;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

scalar_field_value!(bool, Boolean, Boolean);
scalar_field_value!(i8, TinyInt, TinyInt);
scalar_field_value!(i16, SmallInt, SmallInt);
scalar_field_value!(i32, Int, Int);
scalar_field_value!(i64, BigInt, BigInt);
scalar_field_value!(f32, Float, Float);
scalar_field_value!(f64, Double, Double);

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::Text;

    fn into_value(self) -> Value {
        Value::Text(Arc::from(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.to_string()),
            _ => None,
        }
    }
}

impl FieldValue for Arc<str> {
    const KIND: FieldKind = FieldKind::Text;

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(Arc::clone(s)),
            _ => None,
        }
    }
}

impl FieldValue for Bytes {
    const KIND: FieldKind = FieldKind::Bytes;

    fn into_value(self) -> Value {
        Value::Bytes(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl FieldValue for Vec<u8> {
    const KIND: FieldKind = FieldKind::Bytes;

    fn into_value(self) -> Value {
        Value::Bytes(Bytes::from(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b.to_vec()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::text(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::int(1).kind(), Some(FieldKind::Int));
        assert_eq!(Value::text("a").kind(), Some(FieldKind::Text));
        assert_eq!(Value::Null.kind(), None);
        assert_eq!(Value::Null.kind_name(), "null");
    }

    #[test]
    fn test_check_type() {
        assert!(Value::int(1).check_type(0, FieldType::INT).is_ok());
        assert!(Value::Null.check_type(0, FieldType::INT).is_ok());
        let err = Value::bigint(1).check_type(2, FieldType::INT).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch at field 2: expected int, got bigint"
        );
    }

    #[test]
    fn test_bits_round_trip_signed() {
        for value in [
            Value::TinyInt(-3),
            Value::SmallInt(-300),
            Value::Int(-70_000),
            Value::BigInt(i64::MIN),
            Value::Double(-0.5),
            Value::Float(f32::MAX),
            Value::Uuid(u128::MAX - 1),
            Value::Boolean(true),
        ] {
            let kind = value.kind().unwrap();
            let bits = value.to_bits().unwrap();
            assert_eq!(Value::from_bits(kind, bits), value);
        }
        assert_eq!(Value::text("x").to_bits(), None);
    }

    #[test]
    fn test_value_comparison() {
        assert!(Value::int(10) < Value::int(20));
        assert!(Value::Null < Value::int(0));
        assert_eq!(Value::double(f64::NAN), Value::double(f64::NAN));
        assert_eq!(Value::text("abc"), Value::from("abc"));
    }

    #[test]
    fn test_decimal_equality_across_scales() {
        use std::collections::hash_map::DefaultHasher;

        let a = Value::decimal(1500, 3);
        let b = Value::decimal(15, 1);
        assert_eq!(a, b);
        assert!(Value::decimal(15, 1) < Value::decimal(151, 2));

        let hash = |v: &Value| {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_decimal_ordering_near_limits() {
        use std::collections::hash_map::DefaultHasher;

        let hash = |v: &Value| {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        };

        // 17014118346046923173168730371588410572.7
        let max_tenths = Value::decimal(i128::MAX, 1);
        let above = Value::decimal(17014118346046923173168730371588410573, 0);
        let below = Value::decimal(17014118346046923173168730371588410572, 0);
        assert!(below < max_tenths);
        assert!(max_tenths < above);
        assert!(below < above);
        assert_ne!(above, max_tenths);

        let min_tenths = Value::decimal(i128::MIN, 1);
        let neg_above = Value::decimal(-17014118346046923173168730371588410573, 0);
        assert!(neg_above < min_tenths);

        assert!(Value::decimal(i128::MAX, 40) < Value::decimal(1, 1));
        assert!(Value::decimal(-1, 1) < Value::decimal(i128::MAX, 40));

        let tiny = Value::decimal(1, 40);
        let tiny_padded = Value::decimal(10, 41);
        assert_eq!(tiny, tiny_padded);
        assert_eq!(hash(&tiny), hash(&tiny_padded));
    }

    #[test]
    fn test_display_extreme_decimals() {
        assert_eq!(
            Value::decimal(1, 40).to_string(),
            format!("0.{}1", "0".repeat(39))
        );
        assert_eq!(
            Value::decimal(i128::MIN, 0).to_string(),
            "-170141183460469231731687303715884105728"
        );
        assert_eq!(
            Value::decimal(i128::MIN, 2).to_string(),
            "-1701411834604692317316873037158841057.28"
        );
        assert_eq!(Value::decimal(0, 3).to_string(), "0.000");
        assert_eq!(Value::decimal(-5, 1).to_string(), "-0.5");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::decimal(-1205, 2).to_string(), "-12.05");
        assert_eq!(Value::decimal(-5, 2).to_string(), "-0.05");
        assert_eq!(Value::bytes(vec![0xde, 0xad]).to_string(), "0xdead");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_field_value() {
        assert_eq!(i32::from_value(&Value::int(7)), Some(7));
        assert_eq!(i32::from_value(&Value::bigint(7)), None);
        assert_eq!(String::from_value(&"hi".into()), Some("hi".to_string()));
        assert_eq!(Value::from(Option::<i32>::None), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::bigint(3));
    }
}
