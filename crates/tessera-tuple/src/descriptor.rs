//! Tuple descriptors.
//!
//! A descriptor is the immutable, ordered list of field type tags shared by
//! every container of that shape. Descriptors are interned by a
//! [`DescriptorRegistry`](crate::DescriptorRegistry), so two handles to the
//! same layout normally point at the same allocation and [`Descriptor::is_same`]
//! is a pointer comparison.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::{Arc, OnceLock};

use tessera_common::{FieldType, TupleError, TupleResult};

use crate::layout::{PackedLayout, Specialization};

struct DescriptorInner {
    fields: Arc<[FieldType]>,
    specialization: OnceLock<Specialization>,
}

/// An interned tuple layout.
///
/// Cloning a descriptor clones a reference-counted handle.
#[derive(Clone)]
pub struct Descriptor {
    inner: Arc<DescriptorInner>,
}

impl Descriptor {
    /// Creates a descriptor that is not yet interned. Only the registry
    /// calls this.
    pub(crate) fn new(fields: Arc<[FieldType]>) -> Self {
        Self {
            inner: Arc::new(DescriptorInner {
                fields,
                specialization: OnceLock::new(),
            }),
        }
    }

    /// Returns the reserved zero-field descriptor.
    pub fn empty() -> &'static Descriptor {
        static EMPTY: OnceLock<Descriptor> = OnceLock::new();
        EMPTY.get_or_init(|| {
            let descriptor = Descriptor::new(Arc::from(Vec::new()));
            descriptor.set_specialization(Specialization::Packed(Arc::new(PackedLayout::empty())));
            descriptor
        })
    }

    /// Returns the number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.fields.len()
    }

    /// Returns true if the descriptor has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }

    /// Returns the field type tags.
    #[inline]
    pub fn fields(&self) -> &[FieldType] {
        &self.inner.fields
    }

    /// Returns the shared tag slice, used as the intern key.
    pub(crate) fn fields_arc(&self) -> Arc<[FieldType]> {
        Arc::clone(&self.inner.fields)
    }

    /// Returns the type tag of the field at `index`.
    #[inline]
    pub fn field(&self, index: usize) -> TupleResult<FieldType> {
        self.inner
            .fields
            .get(index)
            .copied()
            .ok_or_else(|| TupleError::out_of_range(index, self.len()))
    }

    /// Returns the tags of `range`, validated against the field count.
    pub fn slice(&self, range: Range<usize>) -> TupleResult<&[FieldType]> {
        if range.start > range.end || range.end > self.len() {
            return Err(TupleError::invalid_argument(format!(
                "range {}..{} outside descriptor of {} fields",
                range.start,
                range.end,
                self.len()
            )));
        }
        Ok(&self.inner.fields[range])
    }

    /// Returns true if both handles point at the same interned instance.
    #[inline]
    pub fn is_same(&self, other: &Descriptor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the specialization, if one has been computed.
    #[inline]
    pub fn specialization(&self) -> Option<&Specialization> {
        self.inner.specialization.get()
    }

    /// Returns true once a specialization decision has been made, including
    /// the generic fallback after a failure.
    #[inline]
    pub fn is_specialized(&self) -> bool {
        self.inner.specialization.get().is_some()
    }

    /// Records the specialization. The first decision wins.
    pub(crate) fn set_specialization(&self, specialization: Specialization) -> bool {
        self.inner.specialization.set(specialization).is_ok()
    }

    /// Fails with a descriptor mismatch unless `other` has the same layout.
    pub(crate) fn expect_same_layout(&self, other: &Descriptor) -> TupleResult<()> {
        if self == other {
            Ok(())
        } else {
            Err(TupleError::descriptor_mismatch(self, other))
        }
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other) || self.inner.fields == other.inner.fields
    }
}

impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.fields.hash(state);
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, field) in self.inner.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor{}", self)
    }
}
