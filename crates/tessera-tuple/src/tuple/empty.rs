use tessera_common::{FieldState, TupleError, TupleResult};

use super::{BoxedTuple, Tuple};
use crate::clone::CloneContext;
use crate::descriptor::Descriptor;
use crate::value::Value;

/// The zero-field row. Every index is out of range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyTuple;

impl Tuple for EmptyTuple {
    fn descriptor(&self) -> &Descriptor {
        Descriptor::empty()
    }

    fn count(&self) -> usize {
        0
    }

    fn field_state(&self, index: usize) -> TupleResult<FieldState> {
        Err(TupleError::out_of_range(index, 0))
    }

    fn get_value(&self, index: usize) -> TupleResult<(Value, FieldState)> {
        Err(TupleError::out_of_range(index, 0))
    }

    fn set_value(&mut self, index: usize, _value: Value) -> TupleResult<()> {
        Err(TupleError::out_of_range(index, 0))
    }

    fn clear_value(&mut self, index: usize) -> TupleResult<()> {
        Err(TupleError::out_of_range(index, 0))
    }

    fn deep_clone(&self, _ctx: &mut CloneContext) -> TupleResult<BoxedTuple> {
        Ok(Box::new(EmptyTuple))
    }
}
