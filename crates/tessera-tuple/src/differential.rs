//! Copy-on-write overlay rows.
//!
//! A [`DifferentialTuple`] reads through to a shared origin until a field is
//! written. Written fields go to a private difference row and are tracked in
//! an override bitset; the origin is never modified by the overlay. Changes
//! made to the origin stay visible through every overlay that has not
//! overridden the field.

use std::fmt;

use tessera_common::error::check_index;
use tessera_common::{FieldState, TupleResult};

use crate::clone::CloneContext;
use crate::descriptor::Descriptor;
use crate::tuple::{write_tuple, BoxedTuple, FieldBitset, OwnedTuple, SharedTuple, Tuple};
use crate::value::Value;

/// An overlay over a shared origin row.
///
/// # Example
///
/// ```rust
/// use tessera_common::TupleConfig;
/// use tessera_tuple::{DescriptorRegistry, DifferentialTuple, OwnedTuple, SharedTuple, TupleExt, Value};
///
/// let registry = DescriptorRegistry::new(TupleConfig::default()).unwrap();
/// let origin = SharedTuple::new(
///     OwnedTuple::from_values(&registry, vec![Value::int(1), Value::int(2)]).unwrap(),
/// );
///
/// let mut d1 = DifferentialTuple::new(origin.clone());
/// let d2 = d1.fork();
/// d1.set(1, 3).unwrap();
///
/// assert_eq!(d1.get::<i32>(1).unwrap(), 3);
/// assert_eq!(d2.get::<i32>(1).unwrap(), 2);
/// ```
pub struct DifferentialTuple {
    origin: SharedTuple,
    difference: OwnedTuple,
    overrides: FieldBitset,
}

impl DifferentialTuple {
    /// Creates an overlay with no overridden fields.
    pub fn new(origin: SharedTuple) -> Self {
        let descriptor = origin.descriptor().clone();
        Self {
            overrides: FieldBitset::new(descriptor.len()),
            difference: OwnedTuple::new(descriptor),
            origin,
        }
    }

    /// Returns the origin handle.
    pub fn origin(&self) -> &SharedTuple {
        &self.origin
    }

    /// Returns the private difference row. Only overridden fields are
    /// meaningful.
    pub fn difference(&self) -> &OwnedTuple {
        &self.difference
    }

    /// Returns true if field `index` is overridden.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::IndexOutOfRange`] for an invalid index.
    ///
    /// [`TupleError::IndexOutOfRange`]: tessera_common::TupleError::IndexOutOfRange
    pub fn is_overridden(&self, index: usize) -> TupleResult<bool> {
        check_index(index, self.count())?;
        Ok(self.overrides.contains(index))
    }

    /// Number of overridden fields.
    pub fn overridden_count(&self) -> usize {
        self.overrides.len()
    }

    /// Drops the override of field `index`, so it reads from the origin again.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::IndexOutOfRange`] for an invalid index.
    ///
    /// [`TupleError::IndexOutOfRange`]: tessera_common::TupleError::IndexOutOfRange
    pub fn reset(&mut self, index: usize) -> TupleResult<()> {
        self.difference.clear_value(index)?;
        self.overrides.remove(index);
        Ok(())
    }

    /// Copies the current logical content into a stand-alone row.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the origin.
    pub fn merge(&self) -> TupleResult<OwnedTuple> {
        OwnedTuple::copy_of(self)
    }

    /// Creates another overlay over the same origin, without overrides.
    pub fn fork(&self) -> Self {
        Self::new(self.origin.clone())
    }

    /// Clones this overlay, cloning its origin through `ctx`.
    ///
    /// # Errors
    ///
    /// Propagates errors from cloning the origin.
    pub fn clone_in(&self, ctx: &mut CloneContext) -> TupleResult<Self> {
        Ok(Self {
            origin: ctx.clone_shared(&self.origin)?,
            difference: self.difference.clone(),
            overrides: self.overrides.clone(),
        })
    }

    /// Clones a batch of overlays. Overlays that share an origin share one
    /// cloned origin.
    ///
    /// # Errors
    ///
    /// Propagates errors from cloning the origins.
    pub fn clone_batch(overlays: &[Self]) -> TupleResult<Vec<Self>> {
        let mut ctx = CloneContext::new();
        overlays.iter().map(|overlay| overlay.clone_in(&mut ctx)).collect()
    }
}

impl Tuple for DifferentialTuple {
    fn descriptor(&self) -> &Descriptor {
        self.difference.descriptor()
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        if self.is_overridden(index)? {
            self.difference.field_state(index)
        } else {
            self.origin.field_state(index)
        }
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        if self.is_overridden(index)? {
            self.difference.get_value(index)
        } else {
            self.origin.get_value(index)
        }
    }

    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
        self.difference.set_value(index, value)?;
        self.overrides.insert(index);
        Ok(())
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        self.difference.clear_value(index)?;
        self.overrides.insert(index);
        Ok(())
    }

    fn depth(&self) -> usize {
        self.origin.depth() + 1
    }

    fn deep_clone(&self, ctx: &mut CloneContext) -> TupleResult<BoxedTuple> {
        Ok(Box::new(self.clone_in(ctx)?))
    }
}

impl fmt::Debug for DifferentialTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifferentialTuple")
            .field("descriptor", self.descriptor())
            .field("overridden", &self.overridden_count())
            .finish()
    }
}

impl fmt::Display for DifferentialTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tuple(self, f)
    }
}
