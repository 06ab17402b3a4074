use std::fmt;
use std::sync::Arc;

use tessera_common::error::check_index;
use tessera_common::{FieldState, TupleError, TupleResult};

use super::{write_tuple, BoxedTuple, StateBits, Tuple};
use crate::clone::CloneContext;
use crate::descriptor::Descriptor;
use crate::layout::{PackedLayout, PackedSlot, Specialization};
use crate::registry::DescriptorRegistry;
use crate::transform::CombineView;
use crate::value::Value;

/// Which storage form an [`OwnedTuple`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Bit-packed words plus object slots.
    Packed,
    /// One value slot per field.
    Generic,
    /// Head and tail containers joined by a combine view.
    Split,
}

#[derive(Debug, Clone)]
enum Storage {
    Packed {
        layout: Arc<PackedLayout>,
        words: Vec<u64>,
        objects: Vec<Value>,
        states: StateBits,
    },
    Generic {
        values: Vec<Value>,
        states: StateBits,
    },
    Split(Box<CombineView<OwnedTuple, OwnedTuple>>),
}

/// The owning row container.
///
/// The storage form follows the descriptor's specialization at construction
/// time. All forms behave identically through [`Tuple`].
///
/// # Example
///
/// ```rust
/// use tessera_common::{FieldType, TupleConfig};
/// use tessera_tuple::{DescriptorRegistry, OwnedTuple, Tuple, TupleExt, Value};
///
/// let registry = DescriptorRegistry::new(TupleConfig::default()).unwrap();
/// let descriptor = registry.create(&[FieldType::INT, FieldType::TEXT.nullable()]);
///
/// let mut row = OwnedTuple::new(descriptor);
/// row.set(0, 42).unwrap();
/// row.set_value(1, Value::Null).unwrap();
/// assert_eq!(row.get::<i32>(0).unwrap(), 42);
/// assert_eq!(row.to_string(), "(42, NULL)");
/// ```
#[derive(Debug, Clone)]
pub struct OwnedTuple {
    descriptor: Descriptor,
    storage: Storage,
}

impl OwnedTuple {
    /// Creates a row with every field unavailable.
    pub fn new(descriptor: Descriptor) -> Self {
        let count = descriptor.len();
        let storage = match descriptor.specialization() {
            Some(Specialization::Packed(layout)) => Storage::Packed {
                words: vec![0; layout.value_words()],
                objects: vec![Value::Null; layout.object_slots()],
                layout: Arc::clone(layout),
                states: StateBits::new(count),
            },
            Some(Specialization::Split { head, tail }) => Storage::Split(Box::new(
                CombineView::from_parts(
                    descriptor.clone(),
                    OwnedTuple::new(head.clone()),
                    OwnedTuple::new(tail.clone()),
                ),
            )),
            Some(Specialization::Generic { .. }) | None => Storage::Generic {
                values: vec![Value::Null; count],
                states: StateBits::new(count),
            },
        };
        Self {
            descriptor,
            storage,
        }
    }

    /// Creates a row and fills it from `values`.
    ///
    /// # Errors
    ///
    /// Fails if the number of values differs from the field count or a value
    /// has the wrong kind.
    pub fn with_values<I>(descriptor: Descriptor, values: I) -> TupleResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut tuple = Self::new(descriptor);
        let mut written = 0;
        for value in values {
            if written == tuple.count() {
                return Err(TupleError::invalid_argument(format!(
                    "too many values for layout {}",
                    tuple.descriptor
                )));
            }
            tuple.set_value(written, value.into())?;
            written += 1;
        }
        if written != tuple.count() {
            return Err(TupleError::invalid_argument(format!(
                "expected {} values for layout {}, got {written}",
                tuple.count(),
                tuple.descriptor
            )));
        }
        Ok(tuple)
    }

    /// Creates a row whose layout is inferred from `values`.
    ///
    /// # Errors
    ///
    /// Fails if a value is NULL.
    pub fn from_values(registry: &DescriptorRegistry, values: Vec<Value>) -> TupleResult<Self> {
        let descriptor = registry.create_from_values(&values)?;
        Self::with_values(descriptor, values)
    }

    /// Copies the logical content of any row.
    ///
    /// # Errors
    ///
    /// Propagates read errors from `source`.
    pub fn copy_of<T: Tuple + ?Sized>(source: &T) -> TupleResult<Self> {
        let mut tuple = Self::new(source.descriptor().clone());
        for i in 0..tuple.count() {
            let (value, state) = source.get_value(i)?;
            if !state.is_available() {
                continue;
            }
            let value = if state.is_null() { Value::Null } else { value };
            tuple.set_value(i, value)?;
        }
        Ok(tuple)
    }

    /// Overwrites every field with the content of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::DescriptorMismatch`] if `source` has another
    /// layout.
    pub fn copy_from<T: Tuple + ?Sized>(&mut self, source: &T) -> TupleResult<()> {
        self.descriptor.expect_same_layout(source.descriptor())?;
        for i in 0..self.count() {
            let (value, state) = source.get_value(i)?;
            if !state.is_available() {
                self.clear_value(i)?;
            } else if state.is_null() {
                self.set_value(i, Value::Null)?;
            } else {
                self.set_value(i, value)?;
            }
        }
        Ok(())
    }

    /// Returns the storage form in use.
    pub fn storage_kind(&self) -> StorageKind {
        match self.storage {
            Storage::Packed { .. } => StorageKind::Packed,
            Storage::Generic { .. } => StorageKind::Generic,
            Storage::Split(_) => StorageKind::Split,
        }
    }

    /// Resets every field to unavailable.
    pub fn clear(&mut self) {
        let count = self.count();
        match &mut self.storage {
            Storage::Packed {
                words,
                objects,
                states,
                ..
            } => {
                words.fill(0);
                objects.fill(Value::Null);
                *states = StateBits::new(count);
            }
            Storage::Generic { values, states } => {
                values.fill(Value::Null);
                *states = StateBits::new(count);
            }
            Storage::Split(view) => {
                view.first_mut().clear();
                view.second_mut().clear();
            }
        }
    }
}

impl Tuple for OwnedTuple {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        match &self.storage {
            Storage::Packed { states, .. } | Storage::Generic { states, .. } => {
                check_index(index, self.count())?;
                Ok(states.get(index))
            }
            Storage::Split(view) => view.field_state(index),
        }
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        match &self.storage {
            Storage::Packed {
                layout,
                words,
                objects,
                states,
            } => {
                check_index(index, self.count())?;
                let state = states.get(index);
                if !state.has_value() {
                    return Ok((Value::Null, state));
                }
                let value = match layout.slot(index) {
                    PackedSlot::Object { index } => objects[index].clone(),
                    slot => PackedLayout::read(words, slot, self.descriptor.fields()[index].kind()),
                };
                Ok((value, state))
            }
            Storage::Generic { values, states } => {
                check_index(index, self.count())?;
                Ok((values[index].clone(), states.get(index)))
            }
            Storage::Split(view) => view.get_value(index),
        }
    }

    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
        let field = self.descriptor.field(index)?;
        value.check_type(index, field)?;
        let state = if value.is_null() {
            FieldState::AVAILABLE_NULL
        } else {
            FieldState::AVAILABLE
        };

        match &mut self.storage {
            Storage::Packed {
                layout,
                words,
                objects,
                states,
            } => {
                match layout.slot(index) {
                    PackedSlot::Object { index } => objects[index] = value,
                    slot => {
                        if let Some(bits) = value.to_bits() {
                            PackedLayout::write(words, slot, bits);
                        }
                    }
                }
                states.set(index, state);
            }
            Storage::Generic { values, states } => {
                values[index] = value;
                states.set(index, state);
            }
            Storage::Split(view) => view.set_value(index, value)?,
        }
        Ok(())
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        check_index(index, self.count())?;
        match &mut self.storage {
            Storage::Packed {
                layout,
                objects,
                states,
                ..
            } => {
                if let PackedSlot::Object { index } = layout.slot(index) {
                    objects[index] = Value::Null;
                }
                states.set(index, FieldState::UNAVAILABLE);
            }
            Storage::Generic { values, states } => {
                values[index] = Value::Null;
                states.set(index, FieldState::UNAVAILABLE);
            }
            Storage::Split(view) => view.clear_value(index)?,
        }
        Ok(())
    }

    fn deep_clone(&self, _ctx: &mut CloneContext) -> TupleResult<BoxedTuple> {
        Ok(Box::new(self.clone()))
    }
}

impl fmt::Display for OwnedTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tuple(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::TupleExt;
    use bytes::Bytes;
    use tessera_common::{FieldType, TupleConfig};

    fn registry() -> DescriptorRegistry {
        DescriptorRegistry::new(TupleConfig::for_testing()).unwrap()
    }

    fn all_kinds() -> Vec<FieldType> {
        vec![
            FieldType::BOOL,
            FieldType::TINYINT,
            FieldType::SMALLINT,
            FieldType::INT,
            FieldType::BIGINT,
            FieldType::FLOAT,
            FieldType::DOUBLE,
            FieldType::DECIMAL,
            FieldType::DATE,
            FieldType::TIME,
            FieldType::TIMESTAMP,
            FieldType::UUID,
            FieldType::TEXT,
            FieldType::BYTES,
        ]
    }

    fn sample_values() -> Vec<Value> {
        vec![
            Value::Boolean(true),
            Value::TinyInt(-3),
            Value::SmallInt(-300),
            Value::Int(-70_000),
            Value::BigInt(i64::MIN),
            Value::Float(1.5),
            Value::Double(-2.25),
            Value::decimal(12_345, 2),
            Value::Date(19_000),
            Value::Time(3_600_000_000),
            Value::Timestamp(-1),
            Value::Uuid(u128::MAX - 7),
            Value::text("five"),
            Value::bytes(Bytes::from_static(b"\x00\x01")),
        ]
    }

    #[test]
    fn test_storage_forms_agree() {
        let packed_registry = registry();
        let generic_registry = DescriptorRegistry::new(TupleConfig::default()).unwrap();

        // for_testing splits past 4 fields, so this layout becomes split.
        let split = packed_registry.create(&all_kinds());
        let pending = generic_registry.create(&all_kinds());

        let split_row = OwnedTuple::with_values(split, sample_values()).unwrap();
        let generic_row = OwnedTuple::with_values(pending, sample_values()).unwrap();
        assert_eq!(split_row.storage_kind(), StorageKind::Split);
        assert_eq!(generic_row.storage_kind(), StorageKind::Generic);

        for (i, expected) in sample_values().into_iter().enumerate() {
            assert_eq!(split_row.get_value(i).unwrap(), (expected.clone(), FieldState::AVAILABLE));
            assert_eq!(generic_row.get_value(i).unwrap(), (expected, FieldState::AVAILABLE));
        }
    }

    #[test]
    fn test_packed_row() {
        let registry = registry();
        let descriptor =
            registry.create(&[FieldType::BOOL, FieldType::BIGINT, FieldType::TEXT, FieldType::SMALLINT]);
        let mut row = OwnedTuple::new(descriptor);
        assert_eq!(row.storage_kind(), StorageKind::Packed);

        row.set(0, true).unwrap();
        row.set(1, -5i64).unwrap();
        row.set(2, "x".to_string()).unwrap();
        row.set(3, 7i16).unwrap();
        assert!(row.get::<bool>(0).unwrap());
        assert_eq!(row.get::<i64>(1).unwrap(), -5);
        assert_eq!(row.get::<String>(2).unwrap(), "x");
        assert_eq!(row.get::<i16>(3).unwrap(), 7);

        row.set(0, false).unwrap();
        assert!(!row.get::<bool>(0).unwrap());
        assert_eq!(row.get::<i16>(3).unwrap(), 7);
    }

    #[test]
    fn test_field_states() {
        let registry = registry();
        let descriptor = registry.create(&[FieldType::INT, FieldType::TEXT.nullable()]);
        let mut row = OwnedTuple::new(descriptor);
        assert_eq!(row.field_state(0).unwrap(), FieldState::UNAVAILABLE);
        assert_eq!(row.to_string(), "(?, ?)");

        row.set_value(0, Value::int(1)).unwrap();
        row.set_value(1, Value::Null).unwrap();
        assert_eq!(row.field_state(0).unwrap(), FieldState::AVAILABLE);
        assert_eq!(row.field_state(1).unwrap(), FieldState::AVAILABLE_NULL);
        assert_eq!(row.get_optional::<String>(1).unwrap(), None);
        assert_eq!(row.to_string(), "(1, NULL)");

        row.clear_value(0).unwrap();
        assert_eq!(row.field_state(0).unwrap(), FieldState::UNAVAILABLE);
        assert!(row.get::<i32>(0).is_err());

        row.set_value(1, Value::text("a")).unwrap();
        row.clear();
        assert_eq!(row.to_string(), "(?, ?)");
    }

    #[test]
    fn test_errors() {
        let registry = registry();
        let descriptor = registry.create(&[FieldType::INT]);
        let mut row = OwnedTuple::new(descriptor.clone());

        assert!(matches!(
            row.set_value(1, Value::int(1)),
            Err(TupleError::IndexOutOfRange { index: 1, count: 1 })
        ));
        assert!(matches!(
            row.set_value(0, Value::text("1")),
            Err(TupleError::TypeMismatch { index: 0, .. })
        ));
        assert!(row.get_value(5).is_err());

        assert!(OwnedTuple::with_values(descriptor.clone(), [Value::int(1), Value::int(2)]).is_err());
        assert!(OwnedTuple::with_values(descriptor, Vec::<Value>::new()).is_err());
    }

    #[test]
    fn test_from_values() {
        let registry = registry();
        let row =
            OwnedTuple::from_values(&registry, vec![Value::int(3), Value::double(4.0), Value::text("5")])
                .unwrap();
        assert_eq!(row.count(), 3);
        assert_eq!(row.to_string(), "(3, 4, 5)");
        assert!(OwnedTuple::from_values(&registry, vec![Value::Null]).is_err());
    }

    #[test]
    fn test_copy_from() {
        let registry = registry();
        let descriptor = registry.create(&[FieldType::INT, FieldType::TEXT]);
        let source = OwnedTuple::with_values(descriptor.clone(), [Value::int(1), Value::Null]).unwrap();
        let mut target = OwnedTuple::with_values(descriptor, [Value::int(2), Value::text("x")]).unwrap();

        target.copy_from(&source).unwrap();
        assert_eq!(target.to_string(), "(1, NULL)");

        let mut other = OwnedTuple::new(registry.create(&[FieldType::INT]));
        assert!(matches!(
            other.copy_from(&source),
            Err(TupleError::DescriptorMismatch { .. })
        ));
    }

    #[test]
    fn test_copy_of_preserves_states() {
        let registry = registry();
        let descriptor = registry.create(&[FieldType::INT, FieldType::INT, FieldType::INT]);
        let mut row = OwnedTuple::new(descriptor);
        row.set(0, 1).unwrap();
        row.set_null(1).unwrap();

        let copy = OwnedTuple::copy_of(&row).unwrap();
        assert_eq!(copy.field_state(0).unwrap(), FieldState::AVAILABLE);
        assert_eq!(copy.field_state(1).unwrap(), FieldState::AVAILABLE_NULL);
        assert_eq!(copy.field_state(2).unwrap(), FieldState::UNAVAILABLE);
    }
}
