use std::collections::HashSet;
use std::sync::Arc;

use tessera_common::error::check_index;
use tessera_common::{FieldState, TupleError, TupleResult};

use super::{check_source, check_writable, TransformMode, Transformed};
use crate::descriptor::Descriptor;
use crate::registry::DescriptorRegistry;
use crate::tuple::{OwnedTuple, Tuple};
use crate::value::Value;

/// Remaps fields from one or more sources.
///
/// Each output field names a `(source, field)` pair. Source fields may be
/// repeated or left out; a mapping that repeats a source field produces
/// read-only views, since a write could not pick one output field.
///
/// # Example
///
/// ```rust
/// use tessera_common::TupleConfig;
/// use tessera_tuple::{DescriptorRegistry, MapTransform, OwnedTuple, Tuple, TupleExt, Value};
///
/// let registry = DescriptorRegistry::new(TupleConfig::default()).unwrap();
/// let row = OwnedTuple::from_values(&registry, vec![Value::int(1), Value::text("a")]).unwrap();
///
/// let swap = MapTransform::single_source(&registry, row.descriptor(), &[1, 0]).unwrap();
/// let view = swap.wrap_one(&row).unwrap();
/// assert_eq!(view.display().to_string(), "(a, 1)");
/// ```
#[derive(Debug, Clone)]
pub struct MapTransform {
    sources: Vec<Descriptor>,
    mapping: Arc<[(usize, usize)]>,
    descriptor: Descriptor,
    writable: bool,
    max_view_depth: usize,
}

impl MapTransform {
    /// Creates a transform over `sources` with one `(source, field)` entry per
    /// output field.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if there are no sources or an
    /// entry names a missing source or field.
    pub fn new(
        registry: &DescriptorRegistry,
        sources: &[Descriptor],
        mapping: Vec<(usize, usize)>,
    ) -> TupleResult<Self> {
        if sources.is_empty() {
            return Err(TupleError::invalid_argument("map transform needs a source"));
        }

        let mut fields = Vec::with_capacity(mapping.len());
        let mut seen = HashSet::with_capacity(mapping.len());
        let mut writable = true;
        for (position, &(source, field)) in mapping.iter().enumerate() {
            let descriptor = sources.get(source).ok_or_else(|| {
                TupleError::invalid_argument(format!(
                    "map entry {position} names source {source} of {}",
                    sources.len()
                ))
            })?;
            let ty = descriptor.field(field).map_err(|_| {
                TupleError::invalid_argument(format!(
                    "map entry {position} names field {field} of {descriptor}"
                ))
            })?;
            fields.push(ty);
            writable &= seen.insert((source, field));
        }

        Ok(Self {
            sources: sources.to_vec(),
            mapping: mapping.into(),
            descriptor: registry.create(&fields),
            writable,
            max_view_depth: registry.config().max_view_depth,
        })
    }

    /// Creates a projection or reordering of a single source.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn single_source(
        registry: &DescriptorRegistry,
        source: &Descriptor,
        fields: &[usize],
    ) -> TupleResult<Self> {
        let mapping = fields.iter().map(|&field| (0, field)).collect();
        Self::new(registry, std::slice::from_ref(source), mapping)
    }

    /// The output layout.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Returns true if views accept writes.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Builds a view over `sources`, in the order the transform was built
    /// with.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if the number of sources or a
    /// source layout does not match.
    pub fn wrap<S: Tuple>(&self, sources: Vec<S>) -> TupleResult<MapView<S>> {
        if sources.len() != self.sources.len() {
            return Err(TupleError::invalid_argument(format!(
                "map transform expects {} sources, got {}",
                self.sources.len(),
                sources.len()
            )));
        }
        for (expected, source) in self.sources.iter().zip(&sources) {
            check_source("source", expected, source.descriptor())?;
        }
        Ok(MapView {
            descriptor: self.descriptor.clone(),
            sources,
            mapping: Arc::clone(&self.mapping),
            writable: self.writable,
        })
    }

    /// Builds a view over a single source.
    ///
    /// # Errors
    ///
    /// See [`wrap`](Self::wrap).
    pub fn wrap_one<S: Tuple>(&self, source: S) -> TupleResult<MapView<S>> {
        self.wrap(vec![source])
    }

    /// Copies the mapped fields into a new row.
    ///
    /// # Errors
    ///
    /// See [`wrap`](Self::wrap).
    pub fn materialize<S: Tuple>(&self, sources: &[S]) -> TupleResult<OwnedTuple> {
        OwnedTuple::copy_of(&self.wrap(sources.iter().collect())?)
    }

    /// Produces a view or a copy depending on `mode`.
    ///
    /// # Errors
    ///
    /// See [`wrap`](Self::wrap).
    pub fn apply<S: Tuple>(
        &self,
        mode: TransformMode,
        sources: Vec<S>,
    ) -> TupleResult<Transformed<MapView<S>>> {
        let depth = sources.iter().map(Tuple::depth).max().unwrap_or(0);
        if mode.wraps(depth, self.max_view_depth) {
            self.wrap(sources).map(Transformed::View)
        } else {
            self.materialize(&sources).map(Transformed::Owned)
        }
    }
}

/// A view remapping fields of its sources.
#[derive(Debug, Clone)]
pub struct MapView<S> {
    descriptor: Descriptor,
    sources: Vec<S>,
    mapping: Arc<[(usize, usize)]>,
    writable: bool,
}

impl<S> MapView<S> {
    /// Returns the sources.
    pub fn sources(&self) -> &[S] {
        &self.sources
    }

    /// Unwraps the view, returning the sources.
    pub fn into_sources(self) -> Vec<S> {
        self.sources
    }
}

impl<S: Tuple> Tuple for MapView<S> {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        check_index(index, self.count())?;
        let (source, field) = self.mapping[index];
        self.sources[source].field_state(field)
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        check_index(index, self.count())?;
        let (source, field) = self.mapping[index];
        self.sources[source].get_value(field)
    }

    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
        check_writable(!self.writable, "set_value on a non-injective map")?;
        check_index(index, self.count())?;
        let (source, field) = self.mapping[index];
        self.sources[source].set_value(field, value)
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        check_writable(!self.writable, "clear_value on a non-injective map")?;
        check_index(index, self.count())?;
        let (source, field) = self.mapping[index];
        self.sources[source].clear_value(field)
    }

    fn is_read_only(&self) -> bool {
        !self.writable || self.sources.iter().all(Tuple::is_read_only)
    }

    fn depth(&self) -> usize {
        self.sources.iter().map(Tuple::depth).max().unwrap_or(0) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::TupleExt;
    use tessera_common::{FieldType, TupleConfig};

    fn setup() -> (DescriptorRegistry, OwnedTuple, OwnedTuple) {
        let registry = DescriptorRegistry::new(TupleConfig::for_testing()).unwrap();
        let a = OwnedTuple::from_values(&registry, vec![Value::int(1), Value::text("a")]).unwrap();
        let b = OwnedTuple::from_values(&registry, vec![Value::int(2), Value::text("b")]).unwrap();
        (registry, a, b)
    }

    #[test]
    fn test_two_sources() {
        let (registry, mut a, mut b) = setup();
        let map = MapTransform::new(
            &registry,
            &[a.descriptor().clone(), b.descriptor().clone()],
            vec![(1, 1), (0, 0), (1, 0)],
        )
        .unwrap();
        assert!(map.is_writable());
        assert_eq!(
            map.descriptor().fields(),
            &[FieldType::TEXT, FieldType::INT, FieldType::INT]
        );

        let copy = map.materialize(&[&a, &b]).unwrap();
        assert_eq!(copy.to_string(), "(b, 1, 2)");

        let mut view = map.wrap(vec![&mut a, &mut b]).unwrap();
        view.set(2, 20).unwrap();
        assert_eq!(b.get::<i32>(0).unwrap(), 20);
        assert_eq!(a.get::<i32>(0).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_mapping_is_read_only() {
        let (registry, mut a, _) = setup();
        let map = MapTransform::single_source(&registry, a.descriptor(), &[0, 0]).unwrap();
        assert!(!map.is_writable());

        let mut view = map.wrap_one(&mut a).unwrap();
        assert_eq!(view.display().to_string(), "(1, 1)");
        assert!(view.is_read_only());
        assert!(view.set_value(0, Value::int(5)).unwrap_err().is_not_supported());
    }

    #[test]
    fn test_omission() {
        let (registry, a, _) = setup();
        let map = MapTransform::single_source(&registry, a.descriptor(), &[1]).unwrap();
        let view = map.wrap_one(&a).unwrap();
        assert_eq!(view.count(), 1);
        assert_eq!(view.get::<String>(0).unwrap(), "a");
    }

    #[test]
    fn test_invalid_mapping() {
        let (registry, a, _) = setup();
        assert!(MapTransform::single_source(&registry, a.descriptor(), &[2]).is_err());
        assert!(MapTransform::new(&registry, &[a.descriptor().clone()], vec![(1, 0)]).is_err());
        assert!(MapTransform::new(&registry, &[], vec![]).is_err());

        let map = MapTransform::single_source(&registry, a.descriptor(), &[0]).unwrap();
        assert!(map.wrap(vec![&a, &a]).is_err());
    }
}
