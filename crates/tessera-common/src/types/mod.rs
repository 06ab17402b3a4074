//! Type definitions shared by all tuple engine components.

mod field_state;
mod field_type;

pub use field_state::FieldState;
pub use field_type::{FieldKind, FieldType};
