//! Structural equality and ordering of rows.
//!
//! Rows are compared by logical content, regardless of their concrete
//! representation: a view, a materialized copy and an overlay with the same
//! fields compare equal. Per field:
//!
//! - two unavailable fields are equal, whatever value is stored behind them;
//! - available-null equals only available-null;
//! - available values compare by value.
//!
//! States order as unavailable < null < value.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use tessera_common::{FieldState, TupleResult};

use crate::descriptor::Descriptor;
use crate::tuple::Tuple;
use crate::value::Value;

/// Sort direction of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl Direction {
    #[inline]
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Equality, ordering and hashing of rows.
pub trait TupleComparer {
    /// Returns true if `a` and `b` have the same layout and field content.
    ///
    /// # Errors
    ///
    /// Propagates read errors from either row.
    fn equals(&self, a: &dyn Tuple, b: &dyn Tuple) -> TupleResult<bool>;

    /// Orders `a` relative to `b`.
    ///
    /// # Errors
    ///
    /// Propagates read errors from either row.
    fn compare(&self, a: &dyn Tuple, b: &dyn Tuple) -> TupleResult<Ordering>;

    /// Hashes `tuple` consistently with [`equals`](Self::equals).
    ///
    /// # Errors
    ///
    /// Propagates read errors from the row.
    fn hash(&self, tuple: &dyn Tuple) -> TupleResult<u64>;
}

/// A field reduced to what comparison looks at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FieldKey {
    Unavailable,
    Null,
    Value(Value),
}

impl FieldKey {
    fn read(tuple: &dyn Tuple, index: usize) -> TupleResult<Self> {
        let (value, state) = tuple.get_value(index)?;
        Ok(Self::from_parts(value, state))
    }

    fn from_parts(value: Value, state: FieldState) -> Self {
        if !state.is_available() {
            FieldKey::Unavailable
        } else if state.is_null() {
            FieldKey::Null
        } else {
            FieldKey::Value(value)
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldKey::Unavailable => 0,
            FieldKey::Null => 1,
            FieldKey::Value(_) => 2,
        }
    }
}

impl Ord for FieldKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldKey::Value(a), FieldKey::Value(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for FieldKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_descriptors(a: &Descriptor, b: &Descriptor) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.fields().cmp(b.fields()))
}

/// Compares rows field by field.
///
/// Rows of different layouts are never equal. They are ordered by their
/// common prefix first, then by field count, then by the field types.
#[derive(Debug, Clone, Default)]
pub struct StructuralComparer {
    directions: Vec<Direction>,
}

impl StructuralComparer {
    /// Creates a comparer ordering every field ascending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a comparer with per-field directions. Fields past the end of
    /// `directions` sort ascending.
    pub fn with_directions(directions: Vec<Direction>) -> Self {
        Self { directions }
    }

    fn direction(&self, index: usize) -> Direction {
        self.directions.get(index).copied().unwrap_or_default()
    }
}

impl TupleComparer for StructuralComparer {
    fn equals(&self, a: &dyn Tuple, b: &dyn Tuple) -> TupleResult<bool> {
        if a.descriptor() != b.descriptor() {
            return Ok(false);
        }
        for i in 0..a.count() {
            if FieldKey::read(a, i)? != FieldKey::read(b, i)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn compare(&self, a: &dyn Tuple, b: &dyn Tuple) -> TupleResult<Ordering> {
        let common = a.count().min(b.count());
        for i in 0..common {
            let ordering = FieldKey::read(a, i)?.cmp(&FieldKey::read(b, i)?);
            if ordering != Ordering::Equal {
                return Ok(self.direction(i).apply(ordering));
            }
        }
        Ok(compare_descriptors(a.descriptor(), b.descriptor()))
    }

    fn hash(&self, tuple: &dyn Tuple) -> TupleResult<u64> {
        let mut hasher = DefaultHasher::new();
        tuple.descriptor().hash(&mut hasher);
        for i in 0..tuple.count() {
            FieldKey::read(tuple, i)?.hash(&mut hasher);
        }
        Ok(hasher.finish())
    }
}

/// An owned snapshot of a row usable as a map or cache key.
///
/// Keys compare with the ascending [`StructuralComparer`] semantics.
///
/// # Example
///
/// ```rust
/// use std::collections::HashSet;
/// use tessera_common::TupleConfig;
/// use tessera_tuple::{DescriptorRegistry, OwnedTuple, TupleKey, Value};
///
/// let registry = DescriptorRegistry::new(TupleConfig::default()).unwrap();
/// let row = OwnedTuple::from_values(&registry, vec![Value::int(1), Value::text("a")]).unwrap();
///
/// let mut keys = HashSet::new();
/// keys.insert(TupleKey::new(&row).unwrap());
/// assert!(keys.contains(&TupleKey::new(&row.clone()).unwrap()));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TupleKey {
    descriptor: Descriptor,
    fields: Box<[FieldKey]>,
}

impl TupleKey {
    /// Snapshots `tuple`.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the row.
    pub fn new(tuple: &dyn Tuple) -> TupleResult<Self> {
        let fields = (0..tuple.count())
            .map(|i| FieldKey::read(tuple, i))
            .collect::<TupleResult<Vec<_>>>()?;
        Ok(Self {
            descriptor: tuple.descriptor().clone(),
            fields: fields.into_boxed_slice(),
        })
    }

    /// The layout of the snapshot.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true for the zero-field key.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the value and state of field `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<(Value, FieldState)> {
        self.fields.get(index).map(|field| match field {
            FieldKey::Unavailable => (Value::Null, FieldState::UNAVAILABLE),
            FieldKey::Null => (Value::Null, FieldState::AVAILABLE_NULL),
            FieldKey::Value(value) => (value.clone(), FieldState::AVAILABLE),
        })
    }
}

impl Ord for TupleKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fields
            .iter()
            .zip(other.fields.iter())
            .map(|(a, b)| a.cmp(b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| compare_descriptors(&self.descriptor, &other.descriptor))
    }
}

impl PartialOrd for TupleKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for TupleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleKey")
            .field("descriptor", &self.descriptor)
            .field("fields", &self.fields)
            .finish()
    }
}
