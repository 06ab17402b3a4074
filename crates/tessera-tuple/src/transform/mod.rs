//! Zero-copy row transforms.
//!
//! A transform is built once per source layout and validated up front. It
//! then turns sources into rows of its output layout in one of three ways:
//!
//! - **wrap**: a view that reads and writes through to the sources;
//! - **materialize**: a fresh [`OwnedTuple`] copy;
//! - **apply** with a [`TransformMode`], where `Auto` wraps unless the view
//!   chain would exceed the configured maximum depth.
//!
//! Views take their sources by value. Pass `&row` for a read-only view,
//! `&mut row` for a writable borrowed view, or a [`SharedTuple`] for a view
//! that outlives the borrow.
//!
//! [`SharedTuple`]: crate::SharedTuple

mod combine;
mod cut_in;
mod map;
mod optional;
mod segment;

use tessera_common::{FieldState, TupleError, TupleResult};

use crate::clone::CloneContext;
use crate::descriptor::Descriptor;
use crate::tuple::{BoxedTuple, OwnedTuple, Tuple};
use crate::value::Value;

pub use combine::{CombineTransform, CombineView};
pub use cut_in::{CutInTransform, CutInView};
pub use map::{MapTransform, MapView};
pub use optional::{OptionalTransform, OptionalView};
pub use segment::{SegmentTransform, SegmentView};

/// How [`apply`](SegmentTransform::apply) produces its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    /// Always copy into an owning row.
    Materialize,
    /// Always build a view.
    Wrap,
    /// Build a view unless the view chain would get too deep.
    #[default]
    Auto,
}

impl TransformMode {
    /// Returns true if a view over sources of depth `source_depth` should be
    /// built under a depth limit of `max_depth`.
    pub fn wraps(self, source_depth: usize, max_depth: usize) -> bool {
        match self {
            TransformMode::Materialize => false,
            TransformMode::Wrap => true,
            TransformMode::Auto => source_depth < max_depth,
        }
    }
}

/// The result of applying a transform.
#[derive(Debug)]
pub enum Transformed<V> {
    /// An owning copy.
    Owned(OwnedTuple),
    /// A view over the sources.
    View(V),
}

impl<V> Transformed<V> {
    /// Returns true if the result is a view.
    pub fn is_view(&self) -> bool {
        matches!(self, Transformed::View(_))
    }

    /// Returns the view, if any.
    pub fn into_view(self) -> Option<V> {
        match self {
            Transformed::View(view) => Some(view),
            Transformed::Owned(_) => None,
        }
    }
}

impl<V: Tuple> Transformed<V> {
    /// Converts into an owning row, copying if the result is a view.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the view's sources.
    pub fn into_owned(self) -> TupleResult<OwnedTuple> {
        match self {
            Transformed::Owned(tuple) => Ok(tuple),
            Transformed::View(view) => OwnedTuple::copy_of(&view),
        }
    }

    fn inner(&self) -> &dyn Tuple {
        match self {
            Transformed::Owned(tuple) => tuple,
            Transformed::View(view) => view,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Tuple {
        match self {
            Transformed::Owned(tuple) => tuple,
            Transformed::View(view) => view,
        }
    }
}

impl<V: Tuple> Tuple for Transformed<V> {
    fn descriptor(&self) -> &Descriptor {
        self.inner().descriptor()
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        self.inner().field_state(index)
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        self.inner().get_value(index)
    }

    fn set_value(&mut self, index: usize, value: Value) -> TupleResult<()> {
        self.inner_mut().set_value(index, value)
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        self.inner_mut().clear_value(index)
    }

    fn is_read_only(&self) -> bool {
        self.inner().is_read_only()
    }

    fn depth(&self) -> usize {
        self.inner().depth()
    }

    fn deep_clone(&self, ctx: &mut CloneContext) -> TupleResult<BoxedTuple> {
        self.inner().deep_clone(ctx)
    }
}

/// Fails unless `actual` has the layout a transform was built for.
pub(crate) fn check_source(
    role: &str,
    expected: &Descriptor,
    actual: &Descriptor,
) -> TupleResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(TupleError::invalid_argument(format!(
            "{role} layout {actual} does not match the transform's {expected}"
        )))
    }
}

/// Fails if a view is asked to write while read-only.
#[inline]
pub(crate) fn check_writable(read_only: bool, operation: &str) -> TupleResult<()> {
    if read_only {
        Err(TupleError::not_supported(operation))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wraps() {
        assert!(TransformMode::Wrap.wraps(10, 4));
        assert!(!TransformMode::Materialize.wraps(0, 4));
        assert!(TransformMode::Auto.wraps(3, 4));
        assert!(!TransformMode::Auto.wraps(4, 4));
        assert_eq!(TransformMode::default(), TransformMode::Auto);
    }
}
