//! Graph-preserving deep clone.
//!
//! Cloning rows one at a time would copy a shared source once per row that
//! references it. A [`CloneContext`] remembers every shared row it has
//! cloned, so rows that aliased one source before the clone alias one copy
//! after it.

use std::collections::HashMap;

use tessera_common::TupleResult;

use crate::tuple::{BoxedTuple, SharedTuple, Tuple};

/// Memo of shared rows cloned so far.
#[derive(Debug, Default)]
pub struct CloneContext {
    // Originals are kept alive so their addresses stay unique while the
    // context exists.
    shared: HashMap<usize, (SharedTuple, SharedTuple)>,
}

impl CloneContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the copy of `shared`, cloning it on first use.
    ///
    /// # Errors
    ///
    /// Propagates errors from cloning the underlying row.
    pub fn clone_shared(&mut self, shared: &SharedTuple) -> TupleResult<SharedTuple> {
        let key = shared.identity();
        if let Some((_, copy)) = self.shared.get(&key) {
            return Ok(copy.clone());
        }

        let inner = {
            let guard = shared.read();
            guard.deep_clone(self)?
        };
        let copy = SharedTuple::from_boxed(inner);
        self.shared.insert(key, (shared.clone(), copy.clone()));
        Ok(copy)
    }

    /// Clones any row within this context.
    ///
    /// # Errors
    ///
    /// Propagates errors from cloning `tuple`.
    pub fn clone_tuple<T: Tuple + ?Sized>(&mut self, tuple: &T) -> TupleResult<BoxedTuple> {
        tuple.deep_clone(self)
    }

    /// Number of shared rows cloned so far.
    pub fn shared_count(&self) -> usize {
        self.shared.len()
    }
}

/// Clones `tuples` in one context, preserving aliasing between them.
///
/// # Errors
///
/// Propagates the first cloning error.
pub fn clone_batch<T: Tuple>(tuples: &[T]) -> TupleResult<Vec<BoxedTuple>> {
    let mut ctx = CloneContext::new();
    tuples.iter().map(|t| t.deep_clone(&mut ctx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DescriptorRegistry;
    use crate::tuple::{OwnedTuple, TupleExt};
    use tessera_common::{FieldType, TupleConfig};

    fn shared_row() -> SharedTuple {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let descriptor = registry.create(&[FieldType::INT]);
        SharedTuple::new(OwnedTuple::with_values(descriptor, [5]).unwrap())
    }

    #[test]
    fn test_shared_cloned_once() {
        let original = shared_row();
        let mut ctx = CloneContext::new();

        let a = ctx.clone_shared(&original).unwrap();
        let b = ctx.clone_shared(&original.clone()).unwrap();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&original));
        assert_eq!(ctx.shared_count(), 1);
        assert_eq!(a.get::<i32>(0).unwrap(), 5);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = shared_row();
        let copy = CloneContext::new().clone_shared(&original).unwrap();

        original.set(0, 6).unwrap();
        assert_eq!(copy.get::<i32>(0).unwrap(), 5);
    }

    #[test]
    fn test_clone_batch() {
        let original = shared_row();
        let batch = clone_batch(&[original.clone(), original.clone()]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].get::<i32>(0).unwrap(), 5);

        // Separate contexts do not share copies.
        let lone = clone_batch(&[original]).unwrap();
        assert_eq!(lone.len(), 1);
    }
}
