use tessera_common::error::check_index;
use tessera_common::{FieldState, TupleResult};

use super::{check_source, TransformMode, Transformed};
use crate::descriptor::Descriptor;
use crate::registry::DescriptorRegistry;
use crate::tuple::{OwnedTuple, Tuple};
use crate::value::Value;

/// Concatenates two sources: fields `[0, Na)` come from the first, the rest
/// from the second.
#[derive(Debug, Clone)]
pub struct CombineTransform {
    first: Descriptor,
    second: Descriptor,
    descriptor: Descriptor,
    max_view_depth: usize,
}

impl CombineTransform {
    /// Creates a transform for sources of layouts `first` and `second`.
    pub fn new(registry: &DescriptorRegistry, first: &Descriptor, second: &Descriptor) -> Self {
        let fields: Vec<_> = first.fields().iter().chain(second.fields()).copied().collect();
        Self {
            first: first.clone(),
            second: second.clone(),
            descriptor: registry.create(&fields),
            max_view_depth: registry.config().max_view_depth,
        }
    }

    /// The output layout.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Joins `first` and `second` in a view.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if a source has another layout.
    ///
    /// [`TupleError::InvalidArgument`]: tessera_common::TupleError::InvalidArgument
    pub fn wrap<A: Tuple, B: Tuple>(&self, first: A, second: B) -> TupleResult<CombineView<A, B>> {
        check_source("first source", &self.first, first.descriptor())?;
        check_source("second source", &self.second, second.descriptor())?;
        Ok(CombineView::from_parts(self.descriptor.clone(), first, second))
    }

    /// Copies both sources into a new row.
    ///
    /// # Errors
    ///
    /// See [`wrap`](Self::wrap).
    pub fn materialize<A, B>(&self, first: &A, second: &B) -> TupleResult<OwnedTuple>
    where
        A: Tuple + ?Sized,
        B: Tuple + ?Sized,
    {
        OwnedTuple::copy_of(&self.wrap(first, second)?)
    }

    /// Produces a view or a copy depending on `mode`.
    ///
    /// # Errors
    ///
    /// See [`wrap`](Self::wrap).
    pub fn apply<A: Tuple, B: Tuple>(
        &self,
        mode: TransformMode,
        first: A,
        second: B,
    ) -> TupleResult<Transformed<CombineView<A, B>>> {
        let depth = first.depth().max(second.depth());
        if mode.wraps(depth, self.max_view_depth) {
            self.wrap(first, second).map(Transformed::View)
        } else {
            self.materialize(&first, &second).map(Transformed::Owned)
        }
    }
}

/// A view joining two sources end to end.
#[derive(Debug, Clone)]
pub struct CombineView<A, B> {
    descriptor: Descriptor,
    first: A,
    second: B,
    split: usize,
}

impl<A: Tuple, B: Tuple> CombineView<A, B> {
    pub(crate) fn from_parts(descriptor: Descriptor, first: A, second: B) -> Self {
        let split = first.count();
        debug_assert_eq!(split + second.count(), descriptor.len());
        Self {
            descriptor,
            first,
            second,
            split,
        }
    }

    /// Number of fields taken from the first source.
    pub fn split(&self) -> usize {
        self.split
    }

    /// Returns the first source.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Returns the second source.
    pub fn second(&self) -> &B {
        &self.second
    }

    pub(crate) fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    pub(crate) fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }

    /// Unwraps the view, returning both sources.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: Tuple, B: Tuple> Tuple for CombineView<A, B> {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        check_index(index, self.count())?;
        if index < self.split {
            self.first.field_state(index)
        } else {
            self.second.field_state(index - self.split)
        }
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        check_index(index, self.count())?;
        if index < self.split {
            self.first.get_value(index)
        } else {
            self.second.get_value(index - self.split)
        }
    }

    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
        check_index(index, self.count())?;
        if index < self.split {
            self.first.set_value(index, value)
        } else {
            self.second.set_value(index - self.split, value)
        }
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        check_index(index, self.count())?;
        if index < self.split {
            self.first.clear_value(index)
        } else {
            self.second.clear_value(index - self.split)
        }
    }

    fn is_read_only(&self) -> bool {
        self.first.is_read_only() && self.second.is_read_only()
    }

    fn depth(&self) -> usize {
        self.first.depth().max(self.second.depth()) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::TupleExt;
    use tessera_common::{FieldType, TupleConfig, TupleError};

    #[test]
    fn test_combine() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let mut a = OwnedTuple::from_values(&registry, vec![Value::int(1), Value::text("2")]).unwrap();
        let mut b = OwnedTuple::from_values(&registry, vec![Value::double(3.0)]).unwrap();

        let combine = CombineTransform::new(&registry, a.descriptor(), b.descriptor());
        assert_eq!(
            combine.descriptor().fields(),
            &[FieldType::INT, FieldType::TEXT, FieldType::DOUBLE]
        );

        let copy = combine.materialize(&a, &b).unwrap();
        let mut view = combine.wrap(&mut a, &mut b).unwrap();
        assert_eq!(view.split(), 2);
        assert_eq!(view.display().to_string(), "(1, 2, 3)");
        assert_eq!(copy.to_string(), "(1, 2, 3)");

        view.set(2, 9.5).unwrap();
        view.clear_value(0).unwrap();
        assert!(view.get_value(3).is_err());
        assert_eq!(b.get::<f64>(0).unwrap(), 9.5);
        assert!(!a.is_available(0).unwrap());
    }

    #[test]
    fn test_combine_checks_sources() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let a = OwnedTuple::from_values(&registry, vec![Value::int(1)]).unwrap();
        let b = OwnedTuple::from_values(&registry, vec![Value::text("x")]).unwrap();

        let combine = CombineTransform::new(&registry, a.descriptor(), b.descriptor());
        assert!(matches!(
            combine.wrap(&b, &a),
            Err(TupleError::InvalidArgument { .. })
        ));
    }
}
