//! # tessera-tuple
//!
//! Heterogeneously typed rows and zero-copy row transforms.
//!
//! ## Overview
//!
//! - **Registry**: [`DescriptorRegistry`] interns row layouts and
//!   specializes them lazily into bit-packed storage plans
//! - **Containers**: the [`Tuple`] contract with per-field
//!   available/null state, implemented by [`OwnedTuple`], [`EmptyTuple`]
//!   and [`SharedTuple`]
//! - **Transforms**: segment, cut-in, combine, map and optional views that
//!   compose rows without copying
//! - **Overlays**: [`DifferentialTuple`] for copy-on-write rows over a
//!   shared origin
//! - **Comparison**: [`StructuralComparer`] and [`TupleKey`] compare rows
//!   by logical content across representations
//!
//! ## Example
//!
//! ```rust
//! use tessera_common::{FieldType, TupleConfig};
//! use tessera_tuple::{
//!     CutInTransform, DescriptorRegistry, OwnedTuple, StructuralComparer, Tuple,
//!     TupleComparer, Value,
//! };
//!
//! let registry = DescriptorRegistry::new(TupleConfig::default()).unwrap();
//! let a = OwnedTuple::from_values(&registry, vec![Value::int(1), Value::int(4)]).unwrap();
//! let b = OwnedTuple::from_values(&registry, vec![Value::text("x")]).unwrap();
//!
//! let cut_in = CutInTransform::new(&registry, a.descriptor(), b.descriptor(), 1).unwrap();
//! let view = cut_in.wrap(&a, &b).unwrap();
//! let copy = cut_in.materialize(&a, &b).unwrap();
//!
//! assert_eq!(copy.to_string(), "(1, x, 4)");
//! assert!(StructuralComparer::new().equals(&view, &copy).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod clone;
pub mod comparer;
pub mod descriptor;
pub mod differential;
pub mod layout;
pub mod registry;
pub mod transform;
pub mod tuple;
pub mod value;

pub use clone::{clone_batch, CloneContext};
pub use comparer::{Direction, StructuralComparer, TupleComparer, TupleKey};
pub use descriptor::Descriptor;
pub use differential::DifferentialTuple;
pub use layout::{PackedLayout, PackedSlot, PackedSpecializer, Specialization, Specializer};
pub use registry::{DescriptorRegistry, DrainReport, RegistryStats};
pub use transform::{
    CombineTransform, CombineView, CutInTransform, CutInView, MapTransform, MapView,
    OptionalTransform, OptionalView, SegmentTransform, SegmentView, TransformMode, Transformed,
};
pub use tuple::{BoxedTuple, EmptyTuple, OwnedTuple, SharedTuple, StorageKind, Tuple, TupleExt};
pub use value::{FieldValue, Value};
