use tessera_common::{FieldState, TupleResult};

use super::{check_source, TransformMode, Transformed};
use crate::descriptor::Descriptor;
use crate::registry::DescriptorRegistry;
use crate::tuple::{OwnedTuple, Tuple};
use crate::value::Value;

/// Exposes every field of a source as nullable.
///
/// Fields the source has not loaded read as null instead of unavailable, so
/// consumers of the optional view see "no value" for both.
#[derive(Debug, Clone)]
pub struct OptionalTransform {
    source: Descriptor,
    descriptor: Descriptor,
    max_view_depth: usize,
}

impl OptionalTransform {
    /// Creates the optional adapter for `source`.
    pub fn new(registry: &DescriptorRegistry, source: &Descriptor) -> Self {
        let fields: Vec<_> = source.fields().iter().map(|ty| ty.nullable()).collect();
        Self {
            source: source.clone(),
            descriptor: registry.create(&fields),
            max_view_depth: registry.config().max_view_depth,
        }
    }

    /// The output layout.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Wraps `source` in a view.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if `source` has another layout.
    ///
    /// [`TupleError::InvalidArgument`]: tessera_common::TupleError::InvalidArgument
    pub fn wrap<S: Tuple>(&self, source: S) -> TupleResult<OptionalView<S>> {
        check_source("source", &self.source, source.descriptor())?;
        Ok(OptionalView {
            descriptor: self.descriptor.clone(),
            source,
        })
    }

    /// Copies `source` into a new row of the optional layout.
    ///
    /// # Errors
    ///
    /// See [`wrap`](Self::wrap).
    pub fn materialize<S: Tuple + ?Sized>(&self, source: &S) -> TupleResult<OwnedTuple> {
        OwnedTuple::copy_of(&self.wrap(source)?)
    }

    /// Produces a view or a copy depending on `mode`.
    ///
    /// # Errors
    ///
    /// See [`wrap`](Self::wrap).
    pub fn apply<S: Tuple>(
        &self,
        mode: TransformMode,
        source: S,
    ) -> TupleResult<Transformed<OptionalView<S>>> {
        if mode.wraps(source.depth(), self.max_view_depth) {
            self.wrap(source).map(Transformed::View)
        } else {
            self.materialize(&source).map(Transformed::Owned)
        }
    }
}

/// A view presenting its source's fields as nullable.
#[derive(Debug, Clone)]
pub struct OptionalView<S> {
    descriptor: Descriptor,
    source: S,
}

impl<S> OptionalView<S> {
    /// Returns the source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Unwraps the view, returning the source.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: Tuple> Tuple for OptionalView<S> {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        let state = self.source.field_state(index)?;
        Ok(if state.has_value() {
            state
        } else {
            FieldState::AVAILABLE_NULL
        })
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        let (value, state) = self.source.get_value(index)?;
        if state.has_value() {
            Ok((value, state))
        } else {
            Ok((Value::Null, FieldState::AVAILABLE_NULL))
        }
    }

    // NULL is forwarded to the source setter; the source decides what "no
    // value" means for its own field.
    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
        value.check_type(index, self.descriptor.field(index)?)?;
        self.source.set_value(index, value)
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        self.source.clear_value(index)
    }

    fn is_read_only(&self) -> bool {
        self.source.is_read_only()
    }

    fn depth(&self) -> usize {
        self.source.depth() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::TupleExt;
    use tessera_common::{FieldType, TupleConfig};

    #[test]
    fn test_optional_reads() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let descriptor = registry.create(&[FieldType::INT, FieldType::TEXT, FieldType::BOOL]);
        let mut source = OwnedTuple::new(descriptor);
        source.set(0, 1).unwrap();
        source.set_null(1).unwrap();

        let optional = OptionalTransform::new(&registry, source.descriptor());
        assert!(optional.descriptor().fields().iter().all(|ty| ty.is_nullable()));

        let view = optional.wrap(&source).unwrap();
        assert_eq!(view.field_state(0).unwrap(), FieldState::AVAILABLE);
        assert_eq!(view.field_state(1).unwrap(), FieldState::AVAILABLE_NULL);
        assert_eq!(view.field_state(2).unwrap(), FieldState::AVAILABLE_NULL);
        assert_eq!(view.get_optional::<bool>(2).unwrap(), None);
        assert_eq!(view.display().to_string(), "(1, NULL, NULL)");
    }

    #[test]
    fn test_optional_writes_null_through() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let descriptor = registry.create(&[FieldType::INT, FieldType::TEXT]);
        let mut source = OwnedTuple::new(descriptor);

        let optional = OptionalTransform::new(&registry, source.descriptor());
        let mut view = optional.wrap(&mut source).unwrap();
        view.set_value(0, Value::Null).unwrap();
        view.set(1, "x".to_string()).unwrap();
        assert!(view.set_value(1, Value::int(1)).is_err());

        assert_eq!(source.field_state(0).unwrap(), FieldState::AVAILABLE_NULL);
        assert_eq!(source.get::<String>(1).unwrap(), "x");
    }

    #[test]
    fn test_optional_checks_index() {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let source = OwnedTuple::new(registry.create(&[FieldType::INT]));
        let optional = OptionalTransform::new(&registry, source.descriptor());
        let view = optional.wrap(&source).unwrap();
        assert!(view.get_value(1).is_err());
    }
}
