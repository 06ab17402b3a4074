//! The row container contract.
//!
//! Every container, owning or view, implements [`Tuple`]. Views take their
//! sources by value, so the same view type works over an owned source, a
//! borrowed one (`&T` is read-only, `&mut T` is writable) or a
//! [`SharedTuple`].

mod empty;
mod owned;
mod shared;

use std::fmt;

use tessera_common::{
    FieldState, FieldType, TupleError, TupleResult, FIELDS_PER_STATE_WORD, STATE_BITS_PER_FIELD,
};

use crate::clone::CloneContext;
use crate::descriptor::Descriptor;
use crate::value::{FieldValue, Value};

pub use empty::EmptyTuple;
pub use owned::{OwnedTuple, StorageKind};
pub use shared::SharedTuple;

/// A boxed container that can cross threads.
pub type BoxedTuple = Box<dyn Tuple + Send + Sync>;

/// A fixed-shape row bound to one [`Descriptor`].
///
/// Every field carries a [`FieldState`]. Reading an unavailable field is not
/// an error: the value returned is `Value::Null` with
/// [`FieldState::UNAVAILABLE`], and callers are expected to check the state.
pub trait Tuple: fmt::Debug {
    /// The layout of this row.
    fn descriptor(&self) -> &Descriptor;

    /// Number of fields.
    fn count(&self) -> usize {
        self.descriptor().len()
    }

    /// Returns the state of field `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::IndexOutOfRange`] for an invalid index.
    fn field_state(&self, index: usize) -> TupleResult<FieldState>;

    /// Returns the value and state of field `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::IndexOutOfRange`] for an invalid index.
    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)>;

    /// Stores `value` in field `index`, marking it available (and null when
    /// `value` is NULL).
    ///
    /// # Errors
    ///
    /// Fails on an invalid index, on a value of the wrong kind, and on
    /// read-only containers.
    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()>;

    /// Resets field `index` to unavailable.
    ///
    /// # Errors
    ///
    /// Fails on an invalid index and on read-only containers.
    fn clear_value(&mut self, index: usize) -> TupleResult<()>;

    /// Returns true if writes are rejected.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Number of view layers between this container and owned storage.
    fn depth(&self) -> usize {
        0
    }

    /// Produces an independent copy.
    ///
    /// Shared sources reached through `ctx` are cloned once per context, so
    /// a graph of rows keeps its aliasing. The default copies the logical
    /// content into an [`OwnedTuple`].
    ///
    /// # Errors
    ///
    /// Propagates read errors from the source.
    fn deep_clone(&self, _ctx: &mut CloneContext) -> TupleResult<BoxedTuple> {
        Ok(Box::new(OwnedTuple::copy_of(self)?))
    }
}

impl<T: Tuple + ?Sized> Tuple for &T {
    fn descriptor(&self) -> &Descriptor {
        (**self).descriptor()
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        (**self).field_state(index)
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        (**self).get_value(index)
    }

    fn set_value(&mut self, _index: usize, _value: Value) -> TupleResult<()> {
        Err(TupleError::not_supported("set_value through a shared borrow"))
    }

    fn clear_value(&mut self, _index: usize) -> TupleResult<()> {
        Err(TupleError::not_supported("clear_value through a shared borrow"))
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }

    fn deep_clone(&self, ctx: &mut CloneContext) -> TupleResult<BoxedTuple> {
        (**self).deep_clone(ctx)
    }
}

macro_rules! forward_tuple {
    ($($target:ty),*) => {$(
        impl<T: Tuple + ?Sized> Tuple for $target {
            fn descriptor(&self) -> &Descriptor {
                (**self).descriptor()
            }

            fn field_state(&self, index: usize) -> TupleResult<FieldState> {
                (**self).field_state(index)
            }

            fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
                (**self).get_value(index)
            }

            fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
                (**self).set_value(index, value)
            }

            fn clear_value(&mut self, index: usize) -> TupleResult<()> {
                (**self).clear_value(index)
            }

            fn is_read_only(&self) -> bool {
                (**self).is_read_only()
            }

            fn depth(&self) -> usize {
                (**self).depth()
            }

            fn deep_clone(&self, ctx: &mut CloneContext) -> TupleResult<BoxedTuple> {
                (**self).deep_clone(ctx)
            }
        }
    )*};
}

forward_tuple!(&mut T, Box<T>);

/// Typed helpers available on every [`Tuple`].
pub trait TupleExt: Tuple {
    /// Reads field `index` as `T`.
    ///
    /// # Errors
    ///
    /// Fails if the field has no value or holds a different kind.
    fn get<T: FieldValue>(&self, index: usize) -> TupleResult<T> {
        let (value, state) = self.get_value(index)?;
        if !state.has_value() {
            return Err(TupleError::invalid_argument(format!(
                "field {index} has no value ({state:?})"
            )));
        }
        T::from_value(&value).ok_or_else(|| {
            TupleError::type_mismatch(index, FieldType::new(T::KIND), value.kind_name())
        })
    }

    /// Reads field `index` as `T`, `None` when it is unavailable or null.
    ///
    /// # Errors
    ///
    /// Fails if the field holds a different kind.
    fn get_optional<T: FieldValue>(&self, index: usize) -> TupleResult<Option<T>> {
        let (value, state) = self.get_value(index)?;
        if !state.has_value() {
            return Ok(None);
        }
        T::from_value(&value).map(Some).ok_or_else(|| {
            TupleError::type_mismatch(index, FieldType::new(T::KIND), value.kind_name())
        })
    }

    /// Stores a typed value in field `index`.
    ///
    /// # Errors
    ///
    /// See [`Tuple::set_value`].
    fn set<T: FieldValue>(&mut self, index: usize, value: T) -> TupleResult<()> {
        self.set_value(index, value.into_value())
    }

    /// Stores NULL in field `index`.
    ///
    /// # Errors
    ///
    /// See [`Tuple::set_value`].
    fn set_null(&mut self, index: usize) -> TupleResult<()> {
        self.set_value(index, Value::Null)
    }

    /// Returns true if field `index` is available.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::IndexOutOfRange`] for an invalid index.
    fn is_available(&self, index: usize) -> TupleResult<bool> {
        Ok(self.field_state(index)?.is_available())
    }

    /// Copies the logical content into a fresh owning container.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the source.
    fn materialize(&self) -> TupleResult<OwnedTuple> {
        OwnedTuple::copy_of(self)
    }

    /// Formats the row as `(1, NULL, ?)`, with `?` for unavailable fields and
    /// `!` for fields that fail to read.
    fn display(&self) -> TupleDisplay<'_, Self> {
        TupleDisplay(self)
    }
}

impl<T: Tuple + ?Sized> TupleExt for T {}

/// Display adapter returned by [`TupleExt::display`].
pub struct TupleDisplay<'a, T: ?Sized>(&'a T);

impl<T: Tuple + ?Sized> fmt::Display for TupleDisplay<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tuple(self.0, f)
    }
}

/// Writes `(1, NULL, ?)`. A field whose read fails is written as `!` so a
/// broken row still renders.
pub(crate) fn write_tuple<T: Tuple + ?Sized>(tuple: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("(")?;
    for i in 0..tuple.count() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match tuple.get_value(i) {
            Ok((_, state)) if !state.is_available() => f.write_str("?")?,
            Ok((_, state)) if state.is_null() => f.write_str("NULL")?,
            Ok((value, _)) => write!(f, "{value}")?,
            Err(_) => f.write_str("!")?,
        }
    }
    f.write_str(")")
}

/// Packed per-field state: two bits per field, 32 fields per word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StateBits {
    words: Vec<u64>,
}

impl StateBits {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            words: vec![0; tessera_common::state_words_for(count)],
        }
    }

    #[inline]
    fn position(index: usize) -> (usize, usize) {
        (
            index / FIELDS_PER_STATE_WORD,
            (index % FIELDS_PER_STATE_WORD) * STATE_BITS_PER_FIELD,
        )
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> FieldState {
        let (word, shift) = Self::position(index);
        FieldState::from_bits(((self.words[word] >> shift) & 0b11) as u8)
    }

    #[inline]
    pub(crate) fn set(&mut self, index: usize, state: FieldState) {
        let (word, shift) = Self::position(index);
        self.words[word] =
            (self.words[word] & !(0b11 << shift)) | (u64::from(state.bits()) << shift);
    }
}

/// Fixed-size bitset used for override tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldBitset {
    words: Vec<u64>,
}

impl FieldBitset {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            words: vec![0; tessera_common::bitset_words_for(count)],
        }
    }

    #[inline]
    pub(crate) fn contains(&self, index: usize) -> bool {
        self.words[index / 64] & (1 << (index % 64)) != 0
    }

    #[inline]
    pub(crate) fn insert(&mut self, index: usize) {
        self.words[index / 64] |= 1 << (index % 64);
    }

    #[inline]
    pub(crate) fn remove(&mut self, index: usize) {
        self.words[index / 64] &= !(1 << (index % 64));
    }

    pub(crate) fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}
