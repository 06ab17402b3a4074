use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tessera_common::{FieldState, TupleResult};

use super::{write_tuple, BoxedTuple, Tuple};
use crate::clone::CloneContext;
use crate::descriptor::Descriptor;
use crate::value::Value;

/// A reference-counted row handle.
///
/// Clones of a `SharedTuple` alias the same row: a write through one handle
/// is visible through all of them. Overlays and long-lived views hold their
/// sources this way.
#[derive(Clone)]
pub struct SharedTuple {
    descriptor: Descriptor,
    inner: Arc<RwLock<BoxedTuple>>,
}

impl SharedTuple {
    /// Wraps `tuple` in a new shared handle.
    pub fn new<T: Tuple + Send + Sync + 'static>(tuple: T) -> Self {
        Self::from_boxed(Box::new(tuple))
    }

    /// Wraps an already boxed row.
    pub fn from_boxed(tuple: BoxedTuple) -> Self {
        Self {
            descriptor: tuple.descriptor().clone(),
            inner: Arc::new(RwLock::new(tuple)),
        }
    }

    /// Locks the row for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, BoxedTuple> {
        self.inner.read()
    }

    /// Locks the row for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, BoxedTuple> {
        self.inner.write()
    }

    /// Returns true if both handles alias the same row.
    pub fn ptr_eq(&self, other: &SharedTuple) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of handles to this row.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl Tuple for SharedTuple {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        self.inner.read().field_state(index)
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        self.inner.read().get_value(index)
    }

    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
        self.inner.write().set_value(index, value)
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        self.inner.write().clear_value(index)
    }

    fn is_read_only(&self) -> bool {
        self.inner.read().is_read_only()
    }

    fn depth(&self) -> usize {
        self.inner.read().depth()
    }

    fn deep_clone(&self, ctx: &mut CloneContext) -> TupleResult<BoxedTuple> {
        Ok(Box::new(ctx.clone_shared(self)?))
    }
}

impl fmt::Debug for SharedTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTuple")
            .field("descriptor", &self.descriptor)
            .field("handles", &self.handle_count())
            .finish()
    }
}

impl fmt::Display for SharedTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tuple(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DescriptorRegistry;
    use crate::tuple::{OwnedTuple, TupleExt};
    use tessera_common::{FieldType, TupleConfig};

    #[test]
    fn test_handles_alias() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let descriptor = registry.create(&[FieldType::INT, FieldType::INT]);
        let row = OwnedTuple::with_values(descriptor, [1, 2]).unwrap();

        let mut a = SharedTuple::new(row);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.handle_count(), 2);

        a.set(0, 9).unwrap();
        assert_eq!(b.get::<i32>(0).unwrap(), 9);
        assert_eq!(b.to_string(), "(9, 2)");
        assert!(!b.is_read_only());
    }

    #[test]
    fn test_lock_access() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let descriptor = registry.create(&[FieldType::TEXT]);
        let shared = SharedTuple::new(OwnedTuple::new(descriptor));

        shared.write().set_value(0, Value::text("x")).unwrap();
        let guard = shared.read();
        assert_eq!(guard.get_value(0).unwrap().0, Value::text("x"));
    }
}
