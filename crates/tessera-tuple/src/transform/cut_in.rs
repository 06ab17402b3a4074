use tessera_common::error::check_index;
use tessera_common::{FieldState, TupleError, TupleResult};

use super::{check_source, TransformMode, Transformed};
use crate::descriptor::Descriptor;
use crate::registry::DescriptorRegistry;
use crate::tuple::{OwnedTuple, Tuple};
use crate::value::Value;

/// Inserts the fields of one source into another at a fixed index.
///
/// With sources `A` (`Na` fields), `B` (`Nb` fields) and insertion index
/// `k`, the output is `A[..k] ++ B ++ A[k..]`.
#[derive(Debug, Clone)]
pub struct CutInTransform {
    outer: Descriptor,
    inner: Descriptor,
    descriptor: Descriptor,
    index: usize,
    max_view_depth: usize,
}

impl CutInTransform {
    /// Creates a transform inserting `inner` into `outer` before field
    /// `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if `index > outer.len()`.
    pub fn new(
        registry: &DescriptorRegistry,
        outer: &Descriptor,
        inner: &Descriptor,
        index: usize,
    ) -> TupleResult<Self> {
        if index > outer.len() {
            return Err(TupleError::invalid_argument(format!(
                "cut-in index {index} exceeds {} fields of {outer}",
                outer.len()
            )));
        }

        let fields: Vec<_> = outer.fields()[..index]
            .iter()
            .chain(inner.fields())
            .chain(&outer.fields()[index..])
            .copied()
            .collect();

        Ok(Self {
            outer: outer.clone(),
            inner: inner.clone(),
            descriptor: registry.create(&fields),
            index,
            max_view_depth: registry.config().max_view_depth,
        })
    }

    /// The output layout.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The insertion index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Builds a view inserting `inner` into `outer`.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if a source has another layout.
    pub fn wrap<A: Tuple, B: Tuple>(&self, outer: A, inner: B) -> TupleResult<CutInView<A, B>> {
        check_source("outer source", &self.outer, outer.descriptor())?;
        check_source("inner source", &self.inner, inner.descriptor())?;
        Ok(CutInView {
            descriptor: self.descriptor.clone(),
            inner_len: inner.count(),
            outer,
            inner,
            index: self.index,
        })
    }

    /// Copies both sources into a new row.
    ///
    /// # Errors
    ///
    /// See [`wrap`](Self::wrap).
    pub fn materialize<A, B>(&self, outer: &A, inner: &B) -> TupleResult<OwnedTuple>
    where
        A: Tuple + ?Sized,
        B: Tuple + ?Sized,
    {
        OwnedTuple::copy_of(&self.wrap(outer, inner)?)
    }

    /// Produces a view or a copy depending on `mode`.
    ///
    /// # Errors
    ///
    /// See [`wrap`](Self::wrap).
    pub fn apply<A: Tuple, B: Tuple>(
        &self,
        mode: TransformMode,
        outer: A,
        inner: B,
    ) -> TupleResult<Transformed<CutInView<A, B>>> {
        let depth = outer.depth().max(inner.depth());
        if mode.wraps(depth, self.max_view_depth) {
            self.wrap(outer, inner).map(Transformed::View)
        } else {
            self.materialize(&outer, &inner).map(Transformed::Owned)
        }
    }
}

enum Side {
    Outer(usize),
    Inner(usize),
}

/// A view of one source inserted into another.
#[derive(Debug, Clone)]
pub struct CutInView<A, B> {
    descriptor: Descriptor,
    outer: A,
    inner: B,
    index: usize,
    inner_len: usize,
}

impl<A, B> CutInView<A, B> {
    /// Returns the outer source.
    pub fn outer(&self) -> &A {
        &self.outer
    }

    /// Returns the inserted source.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Unwraps the view, returning both sources.
    pub fn into_parts(self) -> (A, B) {
        (self.outer, self.inner)
    }

    #[inline]
    fn locate(&self, index: usize) -> Side {
        if index < self.index {
            Side::Outer(index)
        } else if index < self.index + self.inner_len {
            Side::Inner(index - self.index)
        } else {
            Side::Outer(index - self.inner_len)
        }
    }
}

impl<A: Tuple, B: Tuple> Tuple for CutInView<A, B> {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        check_index(index, self.count())?;
        match self.locate(index) {
            Side::Outer(i) => self.outer.field_state(i),
            Side::Inner(i) => self.inner.field_state(i),
        }
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        check_index(index, self.count())?;
        match self.locate(index) {
            Side::Outer(i) => self.outer.get_value(i),
            Side::Inner(i) => self.inner.get_value(i),
        }
    }

    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
        check_index(index, self.count())?;
        match self.locate(index) {
            Side::Outer(i) => self.outer.set_value(i, value),
            Side::Inner(i) => self.inner.set_value(i, value),
        }
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        check_index(index, self.count())?;
        match self.locate(index) {
            Side::Outer(i) => self.outer.clear_value(i),
            Side::Inner(i) => self.inner.clear_value(i),
        }
    }

    fn is_read_only(&self) -> bool {
        self.outer.is_read_only() && self.inner.is_read_only()
    }

    fn depth(&self) -> usize {
        self.outer.depth().max(self.inner.depth()) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::TupleExt;
    use tessera_common::TupleConfig;

    fn sources(registry: &DescriptorRegistry) -> (OwnedTuple, OwnedTuple) {
        let a = OwnedTuple::from_values(
            registry,
            vec![Value::int(1), Value::text("2"), Value::int(3), Value::double(4.0)],
        )
        .unwrap();
        let b = OwnedTuple::from_values(registry, vec![Value::bigint(7), Value::boolean(true)]).unwrap();
        (a, b)
    }

    #[test]
    fn test_cut_in_positions() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let (a, b) = sources(&registry);

        for index in 0..=a.count() {
            let cut_in = CutInTransform::new(&registry, a.descriptor(), b.descriptor(), index).unwrap();
            let view = cut_in.wrap(&a, &b).unwrap();
            let copy = cut_in.materialize(&a, &b).unwrap();
            assert_eq!(view.count(), 6);
            for i in 0..view.count() {
                assert_eq!(view.get_value(i).unwrap(), copy.get_value(i).unwrap());
            }
            assert_eq!(view.get_value(index).unwrap().0, Value::bigint(7));
        }
    }

    #[test]
    fn test_cut_in_middle() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let (mut a, mut b) = sources(&registry);
        let cut_in = CutInTransform::new(&registry, a.descriptor(), b.descriptor(), 2).unwrap();

        let mut view = cut_in.wrap(&mut a, &mut b).unwrap();
        assert_eq!(view.display().to_string(), "(1, 2, 7, true, 3, 4)");

        view.set(4, 30).unwrap();
        view.set(3, false).unwrap();
        assert_eq!(a.get::<i32>(2).unwrap(), 30);
        assert!(!b.get::<bool>(1).unwrap());
    }

    #[test]
    fn test_cut_in_bounds() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let (a, b) = sources(&registry);
        assert!(CutInTransform::new(&registry, a.descriptor(), b.descriptor(), 5).is_err());
    }
}
