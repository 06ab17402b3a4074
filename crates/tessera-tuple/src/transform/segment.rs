use tessera_common::error::check_index;
use tessera_common::{FieldState, TupleError, TupleResult};

use super::{check_source, check_writable, TransformMode, Transformed};
use crate::descriptor::Descriptor;
use crate::registry::DescriptorRegistry;
use crate::tuple::{OwnedTuple, Tuple};
use crate::value::Value;

/// Projects the contiguous field range `[offset, offset + length)`.
///
/// # Example
///
/// ```rust
/// use tessera_common::{FieldType, TupleConfig};
/// use tessera_tuple::{DescriptorRegistry, OwnedTuple, SegmentTransform, Tuple, TupleExt, Value};
///
/// let registry = DescriptorRegistry::new(TupleConfig::default()).unwrap();
/// let mut source = OwnedTuple::from_values(
///     &registry,
///     vec![Value::int(3), Value::double(4.0), Value::text("5")],
/// )
/// .unwrap();
///
/// let segment = SegmentTransform::new(&registry, source.descriptor(), 1, 2).unwrap();
/// let mut view = segment.wrap(&mut source).unwrap();
/// assert_eq!(view.display().to_string(), "(4, 5)");
///
/// view.set(0, 0.0).unwrap();
/// assert_eq!(source.get::<f64>(1).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct SegmentTransform {
    source: Descriptor,
    descriptor: Descriptor,
    offset: usize,
    read_only: bool,
    max_view_depth: usize,
}

impl SegmentTransform {
    /// Creates a read/write segment transform.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if the range does not fit in
    /// `source`.
    pub fn new(
        registry: &DescriptorRegistry,
        source: &Descriptor,
        offset: usize,
        length: usize,
    ) -> TupleResult<Self> {
        let end = offset.checked_add(length).ok_or_else(|| {
            TupleError::invalid_argument(format!("segment {offset}+{length} overflows"))
        })?;
        if end > source.len() {
            return Err(TupleError::invalid_argument(format!(
                "segment [{offset}, {end}) exceeds {} fields of {source}",
                source.len()
            )));
        }

        Ok(Self {
            source: source.clone(),
            descriptor: registry.create(&source.fields()[offset..end]),
            offset,
            read_only: false,
            max_view_depth: registry.config().max_view_depth,
        })
    }

    /// Creates a segment transform whose views reject writes.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn read_only(
        registry: &DescriptorRegistry,
        source: &Descriptor,
        offset: usize,
        length: usize,
    ) -> TupleResult<Self> {
        let mut transform = Self::new(registry, source, offset, length)?;
        transform.read_only = true;
        Ok(transform)
    }

    /// The output layout.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The first source field of the segment.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Wraps `source` in a view.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if `source` has another layout.
    pub fn wrap<S: Tuple>(&self, source: S) -> TupleResult<SegmentView<S>> {
        check_source("source", &self.source, source.descriptor())?;
        Ok(SegmentView {
            descriptor: self.descriptor.clone(),
            source,
            offset: self.offset,
            read_only: self.read_only,
        })
    }

    /// Copies the segment of `source` into a new row.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if `source` has another layout.
    pub fn materialize<S: Tuple + ?Sized>(&self, source: &S) -> TupleResult<OwnedTuple> {
        OwnedTuple::copy_of(&self.wrap(source)?)
    }

    /// Produces a view or a copy depending on `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if `source` has another layout.
    pub fn apply<S: Tuple>(
        &self,
        mode: TransformMode,
        source: S,
    ) -> TupleResult<Transformed<SegmentView<S>>> {
        if mode.wraps(source.depth(), self.max_view_depth) {
            self.wrap(source).map(Transformed::View)
        } else {
            self.materialize(&source).map(Transformed::Owned)
        }
    }
}

/// A view of a contiguous field range of one source.
#[derive(Debug, Clone)]
pub struct SegmentView<S> {
    descriptor: Descriptor,
    source: S,
    offset: usize,
    read_only: bool,
}

impl<S> SegmentView<S> {
    /// Returns the source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Unwraps the view, returning the source.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: Tuple> Tuple for SegmentView<S> {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        check_index(index, self.count())?;
        self.source.field_state(self.offset + index)
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        check_index(index, self.count())?;
        self.source.get_value(self.offset + index)
    }

    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
        check_writable(self.read_only, "set_value on a read-only segment")?;
        value.check_type(index, self.descriptor.field(index)?)?;
        self.source.set_value(self.offset + index, value)
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        check_writable(self.read_only, "clear_value on a read-only segment")?;
        check_index(index, self.count())?;
        self.source.clear_value(self.offset + index)
    }

    fn is_read_only(&self) -> bool {
        self.read_only || self.source.is_read_only()
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

    fn setup() -> (DescriptorRegistry, OwnedTuple) {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let source =
            OwnedTuple::from_values(&registry, vec![Value::int(3), Value::double(4.0), Value::text("5")])
                .unwrap();
        (registry, source)
    }

    #[test]
    fn test_segment_reads() {
        let (registry, source) = setup();
        let segment = SegmentTransform::new(&registry, source.descriptor(), 1, 2).unwrap();
        assert_eq!(segment.descriptor().fields(), &[FieldType::DOUBLE, FieldType::TEXT]);

        let view = segment.wrap(&source).unwrap();
        assert_eq!(view.count(), 2);
        assert_eq!(view.get::<f64>(0).unwrap(), 4.0);
        assert_eq!(view.get::<String>(1).unwrap(), "5");
        assert!(view.get_value(2).is_err());
        assert!(view.is_read_only());
        assert_eq!(view.depth(), 1);
    }

    #[test]
    fn test_segment_writes_through() {
        let (registry, mut source) = setup();
        let segment = SegmentTransform::new(&registry, source.descriptor(), 1, 2).unwrap();

        let mut view = segment.wrap(&mut source).unwrap();
        view.set_value(0, Value::Double(0.0)).unwrap();
        assert!(view.set_value(0, Value::int(0)).is_err());
        view.clear_value(1).unwrap();

        assert_eq!(source.get::<f64>(1).unwrap(), 0.0);
        assert_eq!(source.field_state(2).unwrap(), FieldState::UNAVAILABLE);
    }

    #[test]
    fn test_read_only_segment() {
        let (registry, mut source) = setup();
        let segment = SegmentTransform::read_only(&registry, source.descriptor(), 0, 1).unwrap();

        let mut view = segment.wrap(&mut source).unwrap();
        let err = view.set_value(0, Value::int(1)).unwrap_err();
        assert!(err.is_not_supported());
        assert!(view.clear_value(0).unwrap_err().is_not_supported());
        assert!(view.is_read_only());
    }

    #[test]
    fn test_invalid_ranges() {
        let (registry, source) = setup();
        assert!(SegmentTransform::new(&registry, source.descriptor(), 2, 2).is_err());
        assert!(SegmentTransform::new(&registry, source.descriptor(), usize::MAX, 2).is_err());
        assert!(SegmentTransform::new(&registry, source.descriptor(), 3, 0).is_ok());
    }

    #[test]
    fn test_source_layout_checked() {
        let (registry, source) = setup();
        let other = registry.create(&[FieldType::INT]);
        let segment = SegmentTransform::new(&registry, &other, 0, 1).unwrap();
        assert!(matches!(
            segment.wrap(&source),
            Err(TupleError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_apply_modes() {
        let (registry, source) = setup();
        let segment = SegmentTransform::new(&registry, source.descriptor(), 0, 3).unwrap();

        let wrapped = segment.apply(TransformMode::Auto, &source).unwrap();
        assert!(wrapped.is_view());

        let owned = segment.apply(TransformMode::Materialize, &source).unwrap();
        assert!(!owned.is_view());
        assert!(!owned.is_read_only());

        // for_testing allows four layers; the fifth is materialized.
        let v1 = segment.wrap(&source).unwrap();
        let v2 = segment.wrap(&v1).unwrap();
        let v3 = segment.wrap(&v2).unwrap();
        let v4 = segment.wrap(&v3).unwrap();
        assert_eq!(v4.depth(), 4);
        assert!(!segment.apply(TransformMode::Auto, &v4).unwrap().is_view());
        assert!(segment.apply(TransformMode::Wrap, &v4).unwrap().is_view());
    }
}
